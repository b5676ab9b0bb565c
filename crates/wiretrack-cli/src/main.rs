//! wiretrack CLI — run the drift-chamber track finder on JSON event files.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;

use wiretrack::simulate::{helix_event, TruthTrack};
use wiretrack::{ChamberTopology, FinderConfig, HitRecord, TrackFinder};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "wiretrack")]
#[command(about = "Legendre/Hough track finding for cylindrical wire drift chambers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find tracks in an event file.
    Find(FindArgs),

    /// Generate a synthetic event from truth helix parameters.
    Simulate(SimulateArgs),

    /// Print a summary of the chamber geometry in use.
    TopologyInfo {
        /// Path to a topology JSON file; the embedded default otherwise.
        #[arg(long)]
        topology: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct FindArgs {
    /// Path to the input event (JSON with a `hits` array).
    #[arg(long)]
    event: PathBuf,

    /// Path to write the tracking result (JSON); stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Path to a topology JSON file; the embedded default otherwise.
    #[arg(long)]
    topology: Option<PathBuf>,

    /// Maximal quad-tree recursion level of the axial search.
    #[arg(long, default_value = "12")]
    max_level: usize,

    /// Candidate acceptance floor of the axial search.
    #[arg(long, default_value = "10")]
    min_hits: usize,

    /// Curvature search bound; the domain is symmetric around zero, 1/cm.
    #[arg(long, default_value = "0.15")]
    max_curvature: f64,

    /// Minimal hits for a stereo solution.
    #[arg(long, default_value = "5")]
    stereo_min_hits: usize,

    /// Accept stereo hits behind the track start (back-to-back/cosmic
    /// topologies).
    #[arg(long)]
    allow_b2b: bool,

    /// Disable residual-based hit pruning.
    #[arg(long)]
    no_prune: bool,

    /// Disable pickup of leftover hits.
    #[arg(long)]
    no_append: bool,
}

#[derive(Debug, Clone, Args)]
struct SimulateArgs {
    /// Path to write the generated event (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Signed curvature, 1/cm.
    #[arg(long, default_value = "0.012")]
    curvature: f64,

    /// Direction of travel at the perigee, radians.
    #[arg(long, default_value = "0.8")]
    phi: f64,

    /// Signed impact parameter, cm.
    #[arg(long, default_value = "0.0")]
    impact: f64,

    /// z at the perigee, cm.
    #[arg(long, default_value = "0.0")]
    z0: f64,

    /// Dip slope dz/ds.
    #[arg(long, default_value = "0.3")]
    tan_lambda: f64,
}

/// On-disk event format.
#[derive(Debug, Serialize, Deserialize)]
struct EventFile {
    hits: Vec<HitRecord>,
}

fn load_topology(path: &Option<PathBuf>) -> CliResult<ChamberTopology> {
    match path {
        Some(p) => {
            let text = fs::read_to_string(p)?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(ChamberTopology::cdc_like()),
    }
}

fn run_find(args: &FindArgs) -> CliResult<()> {
    let topology = load_topology(&args.topology)?;
    let text = fs::read_to_string(&args.event)?;
    let event: EventFile = serde_json::from_str(&text)?;

    let mut config = FinderConfig::default();
    config.axial.max_level = args.max_level;
    config.axial.min_hits = args.min_hits;
    config.axial.curv_bounds = (-args.max_curvature, args.max_curvature);
    config.stereo.search.min_hits = args.stereo_min_hits;
    config.stereo.check_b2b_tracks = !args.allow_b2b;
    config.post.prune_hits = !args.no_prune;
    config.post.append_unused = !args.no_append;

    let finder = TrackFinder::with_config(config, topology);
    let result = finder.find_tracks(&event.hits);
    info!(
        "{} tracks from {} hits",
        result.tracks.len(),
        event.hits.len()
    );

    let json = serde_json::to_string_pretty(&result)?;
    match &args.out {
        Some(path) => fs::write(path, json)?,
        None => println!("{}", json),
    }
    Ok(())
}

fn run_simulate(args: &SimulateArgs) -> CliResult<()> {
    let topology = ChamberTopology::cdc_like();
    let truth = TruthTrack {
        curvature: args.curvature,
        tangential_phi: args.phi,
        impact: args.impact,
        z0: args.z0,
        tan_lambda: args.tan_lambda,
    };
    let hits = helix_event(&truth, &topology);
    info!("generated {} hits", hits.len());
    let json = serde_json::to_string_pretty(&EventFile { hits })?;
    fs::write(&args.out, json)?;
    Ok(())
}

fn run_topology_info(path: &Option<PathBuf>) -> CliResult<()> {
    let topology = load_topology(path)?;
    println!(
        "{} layers, {} superlayers, outer radius {:.1} cm",
        topology.n_layers(),
        topology.n_superlayers(),
        topology.outer_radius()
    );
    for layer in 0..topology.n_layers() as u8 {
        let spec = topology.layer(layer).expect("valid layer");
        println!(
            "  layer {:2}  sl {}  r {:6.1} cm  {:3} wires  {}",
            layer,
            spec.superlayer,
            spec.radius,
            spec.n_wires,
            if spec.is_axial() {
                "axial".to_string()
            } else {
                format!("stereo {:+.3} rad", spec.stereo_angle)
            }
        );
    }
    Ok(())
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Find(args) => run_find(args),
        Commands::Simulate(args) => run_simulate(args),
        Commands::TopologyInfo { topology } => run_topology_info(topology),
    }
}
