//! Thin helpers over `nalgebra::Vector2` used throughout the geometry code.

pub(crate) type Vec2 = nalgebra::Vector2<f64>;

/// Unit vector at polar angle `phi`.
pub(crate) fn unit_from_angle(phi: f64) -> Vec2 {
    Vec2::new(phi.cos(), phi.sin())
}

/// Rotate by +90° (counterclockwise).
pub(crate) fn perp_ccw(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// 2D cross product (z-component of the 3D cross product).
pub(crate) fn cross(a: Vec2, b: Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Normalize, falling back to +x for a (near-)zero vector.
pub(crate) fn unit_or_x(v: Vec2) -> Vec2 {
    let n = v.norm();
    if n > 1e-300 {
        v / n
    } else {
        Vec2::new(1.0, 0.0)
    }
}
