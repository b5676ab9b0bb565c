//! Static chamber geometry: layers, superlayers, wire positions.
//!
//! [`ChamberTopology`] is an explicit immutable object constructed once per
//! run and passed by reference into every component that needs wire
//! positions — never a hidden global. It is serializable so a geometry can
//! be loaded from JSON, and ships an embedded default
//! ([`ChamberTopology::cdc_like`]) for tests and the CLI.
//!
//! Units are cm throughout; angles in radians.

use serde::{Deserialize, Serialize};

use crate::hit::{WireId, WireKind};

/// One cylindrical wire layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    /// Cylindrical radius of the wire nominal positions, cm.
    pub radius: f64,
    /// Number of wires in the layer.
    pub n_wires: u16,
    /// Stereo skew angle between wire and chamber axis; zero for an axial
    /// layer, sign distinguishes the two stereo orientations.
    pub stereo_angle: f64,
    /// Superlayer this layer belongs to.
    pub superlayer: u8,
    /// Backward wire-end z, cm.
    pub z_backward: f64,
    /// Forward wire-end z, cm.
    pub z_forward: f64,
    /// Azimuthal offset of wire 0, radians.
    pub phi_offset: f64,
}

impl Layer {
    /// True for a layer of wires parallel to the chamber axis.
    pub fn is_axial(&self) -> bool {
        self.stereo_angle == 0.0
    }

    /// Azimuth of the nominal (untwisted) position of a wire.
    fn wire_phi(&self, wire: u16) -> f64 {
        self.phi_offset + std::f64::consts::TAU * f64::from(wire) / f64::from(self.n_wires)
    }

    /// Half the azimuthal cell width times the radius: the largest drift
    /// radius a well-formed hit on this layer can carry.
    pub fn cell_half_width(&self) -> f64 {
        std::f64::consts::PI * self.radius / f64::from(self.n_wires)
    }

    /// Azimuthal twist between the two wire ends, radians.
    pub fn twist(&self) -> f64 {
        if self.is_axial() {
            return 0.0;
        }
        // Small-angle relation between the skew angle and the end-to-end
        // azimuthal displacement.
        let half_span = 0.5 * (self.z_forward - self.z_backward);
        2.0 * self.stereo_angle.tan() * half_span / self.radius
    }
}

/// Immutable chamber geometry description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChamberTopology {
    layers: Vec<Layer>,
    n_superlayers: u8,
}

impl ChamberTopology {
    /// Build from an explicit layer list.
    pub fn from_layers(layers: Vec<Layer>) -> Self {
        let n_superlayers = layers
            .iter()
            .map(|l| l.superlayer + 1)
            .max()
            .unwrap_or(0);
        Self {
            layers,
            n_superlayers,
        }
    }

    /// The embedded default geometry: 9 superlayers in the axial/stereo
    /// pattern A-U-A-V-A-U-A-V-A, 56 layers total, radii from 17 cm to
    /// about 107 cm — the shape of a typical large cylindrical drift
    /// chamber.
    pub fn cdc_like() -> Self {
        let mut layers = Vec::with_capacity(56);
        // Innermost superlayer: 8 axial layers, tighter spacing.
        for i in 0..8u8 {
            layers.push(Layer {
                radius: 17.0 + f64::from(i),
                n_wires: 160,
                stereo_angle: 0.0,
                superlayer: 0,
                z_backward: -75.0,
                z_forward: 75.0,
                phi_offset: if i % 2 == 1 {
                    std::f64::consts::PI / 160.0
                } else {
                    0.0
                },
            });
        }
        // Outer superlayers: 6 layers each, alternating stereo/axial.
        for sl in 1..9u8 {
            let base = 25.5 + 10.5 * f64::from(sl - 1);
            let n_wires = 160 + 32 * u16::from(sl);
            let stereo_angle = match sl % 4 {
                1 => 0.045 + 0.003 * f64::from(sl),
                3 => -(0.045 + 0.003 * f64::from(sl)),
                _ => 0.0,
            };
            for i in 0..6u8 {
                layers.push(Layer {
                    radius: base + 1.6 * f64::from(i),
                    n_wires,
                    stereo_angle,
                    superlayer: sl,
                    z_backward: -75.0,
                    z_forward: 75.0,
                    phi_offset: if i % 2 == 1 {
                        std::f64::consts::PI / f64::from(n_wires)
                    } else {
                        0.0
                    },
                });
            }
        }
        Self::from_layers(layers)
    }

    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn n_superlayers(&self) -> u8 {
        self.n_superlayers
    }

    /// The layer record, if the index is valid.
    pub fn layer(&self, layer: u8) -> Option<&Layer> {
        self.layers.get(usize::from(layer))
    }

    /// True when `wire` names an existing wire.
    pub fn contains(&self, wire: WireId) -> bool {
        self.layer(wire.layer)
            .is_some_and(|l| wire.wire < l.n_wires)
    }

    /// Axial/stereo classification of a layer.
    pub fn kind_of(&self, layer: u8) -> Option<WireKind> {
        self.layer(layer).map(|l| {
            if l.is_axial() {
                WireKind::Axial
            } else {
                WireKind::Stereo
            }
        })
    }

    /// Superlayer index of a layer.
    pub fn superlayer_of(&self, layer: u8) -> Option<u8> {
        self.layer(layer).map(|l| l.superlayer)
    }

    /// Radius of the outermost wire layer.
    pub fn outer_radius(&self) -> f64 {
        self.layers.iter().map(|l| l.radius).fold(0.0, f64::max)
    }

    /// Innermost wire radius of a superlayer.
    pub fn superlayer_inner_radius(&self, superlayer: u8) -> Option<f64> {
        self.layers
            .iter()
            .filter(|l| l.superlayer == superlayer)
            .map(|l| l.radius)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Reference 2D position of a wire at the midplane (z = 0).
    pub fn wire_position(&self, wire: WireId) -> Option<[f64; 2]> {
        let layer = self.layer(wire.layer)?;
        if wire.wire >= layer.n_wires {
            return None;
        }
        if layer.is_axial() {
            let phi = layer.wire_phi(wire.wire);
            Some([layer.radius * phi.cos(), layer.radius * phi.sin()])
        } else {
            let (b, f) = self.wire_ends(wire)?;
            // Midplane crossing of the skew line; the z range is symmetric
            // in the embedded geometry, and for asymmetric ranges the
            // interpolation below is still the z = 0 point.
            let t = -b[2] / (f[2] - b[2]);
            Some([b[0] + t * (f[0] - b[0]), b[1] + t * (f[1] - b[1])])
        }
    }

    /// 2D position of a wire at height `z`, interpolated along the wire.
    pub fn wire_position_at(&self, wire: WireId, z: f64) -> Option<[f64; 2]> {
        let layer = self.layer(wire.layer)?;
        if layer.is_axial() {
            return self.wire_position(wire);
        }
        let (b, f) = self.wire_ends(wire)?;
        let t = (z - b[2]) / (f[2] - b[2]);
        Some([b[0] + t * (f[0] - b[0]), b[1] + t * (f[1] - b[1])])
    }

    /// Backward and forward wire-end positions.
    pub fn wire_ends(&self, wire: WireId) -> Option<([f64; 3], [f64; 3])> {
        let layer = self.layer(wire.layer)?;
        if wire.wire >= layer.n_wires {
            return None;
        }
        let phi = layer.wire_phi(wire.wire);
        let twist = layer.twist();
        let phi_b = phi - 0.5 * twist;
        let phi_f = phi + 0.5 * twist;
        Some((
            [
                layer.radius * phi_b.cos(),
                layer.radius * phi_b.sin(),
                layer.z_backward,
            ],
            [
                layer.radius * phi_f.cos(),
                layer.radius * phi_f.sin(),
                layer.z_forward,
            ],
        ))
    }

    /// Whether `z` lies within the physical extent of the layer's wires,
    /// with a small tolerance.
    pub fn is_in_wire_bounds(&self, layer: u8, z: f64, tolerance: f64) -> bool {
        self.layer(layer).is_some_and(|l| {
            z >= l.z_backward - tolerance && z <= l.z_forward + tolerance
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cdc_like_shape() {
        let topo = ChamberTopology::cdc_like();
        assert_eq!(topo.n_layers(), 56);
        assert_eq!(topo.n_superlayers(), 9);
        assert!(topo.outer_radius() > 100.0);
        // Pattern A-U-A-V-A-U-A-V-A.
        assert_eq!(topo.kind_of(0), Some(crate::hit::WireKind::Axial));
        assert_eq!(topo.kind_of(8), Some(crate::hit::WireKind::Stereo));
        assert_eq!(topo.kind_of(14), Some(crate::hit::WireKind::Axial));
        assert_eq!(topo.kind_of(20), Some(crate::hit::WireKind::Stereo));
    }

    #[test]
    fn axial_wire_sits_on_layer_radius() {
        let topo = ChamberTopology::cdc_like();
        let wire = WireId { layer: 3, wire: 40 };
        let p = topo.wire_position(wire).unwrap();
        let layer = topo.layer(3).unwrap();
        assert_relative_eq!((p[0] * p[0] + p[1] * p[1]).sqrt(), layer.radius, epsilon = 1e-12);
    }

    #[test]
    fn stereo_wire_ends_are_twisted() {
        let topo = ChamberTopology::cdc_like();
        let wire = WireId { layer: 8, wire: 0 };
        let (b, f) = topo.wire_ends(wire).unwrap();
        assert!(b[2] < 0.0 && f[2] > 0.0);
        let phi_b = b[1].atan2(b[0]);
        let phi_f = f[1].atan2(f[0]);
        assert!(
            (phi_f - phi_b).abs() > 1e-4,
            "stereo ends must differ in azimuth"
        );
        // Midplane position interpolates between the ends.
        let mid = topo.wire_position(wire).unwrap();
        assert_relative_eq!(mid[0], 0.5 * (b[0] + f[0]), epsilon = 1e-12);
    }

    #[test]
    fn wire_bounds_check() {
        let topo = ChamberTopology::cdc_like();
        assert!(topo.is_in_wire_bounds(8, 0.0, 0.0));
        assert!(topo.is_in_wire_bounds(8, 75.5, 1.0));
        assert!(!topo.is_in_wire_bounds(8, 80.0, 1.0));
    }

    #[test]
    fn invalid_wires_are_rejected() {
        let topo = ChamberTopology::cdc_like();
        assert!(!topo.contains(WireId { layer: 99, wire: 0 }));
        assert!(!topo.contains(WireId { layer: 0, wire: 5000 }));
        assert!(topo.wire_position(WireId { layer: 0, wire: 5000 }).is_none());
    }
}
