//! Rounded dots and the sphere formulas shared with spherical recesses.

use super::{cuboid, finite, frustum, positive, sphere};
use crate::csg::Solid;
use crate::error::FeatureError;
use config::constants::CAP_CUTTER_SCALE;
use glam::DVec3;

/// Parameters of a rounded dot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomeShape {
    /// Radius where the dot meets the surface.
    pub base_radius: f64,
    /// Height of the frustum below the cap. May be zero.
    pub base_height: f64,
    /// Radius of the sphere the cap is cut from.
    pub dome_radius: f64,
    /// Requested cap height.
    pub dome_height: f64,
}

/// Clamps a requested cap height to the sphere's domain.
///
/// A cap can be at most `2R` tall. Requests at or above that, or non-finite
/// ones, fall back to a hemisphere (`R`).
///
/// ```rust
/// use tactile_mesh::primitives::clamp_cap_height;
/// assert_eq!(clamp_cap_height(0.4, 1.0), 0.4);
/// assert_eq!(clamp_cap_height(2.0, 1.0), 1.0);
/// assert_eq!(clamp_cap_height(f64::NAN, 1.0), 1.0);
/// ```
pub fn clamp_cap_height(dome_height: f64, sphere_radius: f64) -> f64 {
    if dome_height.is_finite() && dome_height > 0.0 && dome_height < 2.0 * sphere_radius {
        dome_height
    } else {
        sphere_radius
    }
}

/// Radius of the circle where a cap of height `cap_height` meets its base
/// plane: `√(h(2R − h))`.
pub fn cap_base_radius(cap_height: f64, sphere_radius: f64) -> f64 {
    (cap_height * (2.0 * sphere_radius - cap_height)).max(0.0).sqrt()
}

/// Sphere radius whose cap has opening radius `a` and depth `d`:
/// `R = (a² + d²) / 2d`.
///
/// ```rust
/// use tactile_mesh::primitives::bowl_sphere_radius;
/// // A bowl as deep as it is wide is a hemisphere.
/// assert_eq!(bowl_sphere_radius(1.0, 1.0), 1.0);
/// ```
pub fn bowl_sphere_radius(opening_radius: f64, depth: f64) -> f64 {
    (opening_radius * opening_radius + depth * depth) / (2.0 * depth)
}

/// Builds a rounded dot: a frustum from `z = -embed` to `base_height`
/// topped by a spherical cap.
///
/// The cap is the sphere minus a large cutting box whose top face is the
/// cap's base plane, positioned so that the cap is exactly `dome_height`
/// tall (after [`clamp_cap_height`]).
pub fn rounded_dome(shape: &DomeShape, embed: f64, segments: u32) -> Result<Solid, FeatureError> {
    let base_radius = positive("base_radius", shape.base_radius)?;
    let base_height = finite("base_height", shape.base_height)?.max(0.0);
    let radius = positive("dome_radius", shape.dome_radius)?;
    let embed = positive("embed", embed)?;

    let cap_height = clamp_cap_height(shape.dome_height, radius);
    let cap_radius = cap_base_radius(cap_height, radius);
    let center_z = base_height + cap_height - radius;
    if !center_z.is_finite() || !cap_radius.is_finite() || cap_radius <= 0.0 {
        return Err(FeatureError::Degenerate("dome cap has no base".into()));
    }

    let half = radius * CAP_CUTTER_SCALE * 0.5;
    let cutter = cuboid(
        DVec3::new(-half, -half, center_z - half),
        DVec3::new(half, half, base_height),
    )?;
    let cap = sphere(radius, segments)?
        .transform(&glam::DMat4::from_translation(DVec3::new(0.0, 0.0, center_z)))
        .subtract(cutter);

    let bottom_radius = if base_height > 0.0 {
        base_radius
    } else {
        cap_radius
    };
    let base = frustum(bottom_radius, cap_radius, -embed, base_height, segments)?;
    let dome = base.union(cap);
    if !dome.is_finite() || dome.is_empty() {
        return Err(FeatureError::Degenerate("rounded dot".into()));
    }
    Ok(dome)
}
