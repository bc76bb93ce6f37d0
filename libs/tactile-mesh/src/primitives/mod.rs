//! # Primitive Builders
//!
//! Volumetric shapes built in a canonical local frame. The `z = 0` plane of
//! that frame is the host surface and `+z` points out of the solid; callers
//! place the result with a transform from [`crate::placement`].
//!
//! ## Primitives
//!
//! - [`cuboid`]: axis-aligned box
//! - [`frustum`]: truncated cone along `z` (apex allowed at either end)
//! - [`sphere`]: UV sphere without pole vertices
//! - [`extrude_polygon`]: 2D outline swept along `z`
//! - [`rounded_dome`]: frustum base topped by a spherical cap
//! - [`glyph_solid`]: bitmap character as a union of boxes
//!
//! Every builder validates its parameters and returns a
//! [`FeatureError`] instead of producing non-finite geometry.

mod dome;
mod glyph;

pub use dome::{bowl_sphere_radius, cap_base_radius, clamp_cap_height, rounded_dome, DomeShape};
pub use glyph::{glyph_solid, GlyphFont, GLYPH_FONT_RESOURCE};

use crate::csg::{Polygon, Solid};
use crate::error::FeatureError;
use glam::{DVec2, DVec3};
use std::f64::consts::TAU;

// =============================================================================
// VALIDATION HELPERS
// =============================================================================

pub(crate) fn finite(field: &'static str, value: f64) -> Result<f64, FeatureError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FeatureError::NonFinite(field))
    }
}

pub(crate) fn positive(field: &'static str, value: f64) -> Result<f64, FeatureError> {
    let value = finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(FeatureError::NonPositive { field, value })
    }
}

fn polygon(vertices: Vec<DVec3>) -> Result<Polygon, FeatureError> {
    Polygon::new(vertices).ok_or_else(|| FeatureError::Degenerate("zero-area face".into()))
}

fn ring(radius: f64, z: f64, segments: u32) -> Vec<DVec3> {
    (0..segments)
        .map(|j| {
            let angle = TAU * j as f64 / segments as f64;
            DVec3::new(radius * angle.cos(), radius * angle.sin(), z)
        })
        .collect()
}

// =============================================================================
// CUBOID
// =============================================================================

/// Axis-aligned box spanning `min`..`max`.
///
/// # Errors
///
/// Returns [`FeatureError`] when any extent is not positive.
pub fn cuboid(min: DVec3, max: DVec3) -> Result<Solid, FeatureError> {
    let size = max - min;
    positive("width", size.x)?;
    positive("height", size.y)?;
    positive("depth", size.z)?;
    let outline = [
        DVec2::new(min.x, min.y),
        DVec2::new(max.x, min.y),
        DVec2::new(max.x, max.y),
        DVec2::new(min.x, max.y),
    ];
    extrude_polygon(&outline, min.z, max.z)
}

// =============================================================================
// FRUSTUM
// =============================================================================

/// Truncated cone along `+z` from `z0` (radius `bottom_radius`) to `z1`
/// (radius `top_radius`).
///
/// A zero radius collapses that end to an apex.
///
/// ## Parameters
///
/// - `segments`: vertices per ring, at angles `2πj / segments` from `+x`
///
/// # Example
///
/// ```rust
/// use tactile_mesh::primitives::frustum;
///
/// let cone = frustum(1.0, 0.5, 0.0, 2.0, 16).unwrap();
/// assert_eq!(cone.polygons().len(), 18);
/// ```
pub fn frustum(
    bottom_radius: f64,
    top_radius: f64,
    z0: f64,
    z1: f64,
    segments: u32,
) -> Result<Solid, FeatureError> {
    let r0 = finite("bottom_radius", bottom_radius)?;
    let r1 = finite("top_radius", top_radius)?;
    positive("height", finite("z1", z1)? - finite("z0", z0)?)?;
    if r0 < 0.0 || r1 < 0.0 || (r0 == 0.0 && r1 == 0.0) {
        return Err(FeatureError::NonPositive {
            field: "radius",
            value: r0.min(r1),
        });
    }
    if segments < 3 {
        return Err(FeatureError::Degenerate(format!("{segments} segments")));
    }

    let bottom = ring(r0, z0, segments);
    let top = ring(r1, z1, segments);
    let n = segments as usize;
    let mut faces = Vec::with_capacity(n + 2);

    for j in 0..n {
        let k = (j + 1) % n;
        let side = if r0 == 0.0 {
            vec![DVec3::new(0.0, 0.0, z0), top[k], top[j]]
        } else if r1 == 0.0 {
            vec![bottom[j], bottom[k], DVec3::new(0.0, 0.0, z1)]
        } else {
            vec![bottom[j], bottom[k], top[k], top[j]]
        };
        faces.push(polygon(side)?);
    }
    if r0 > 0.0 {
        faces.push(polygon(bottom.into_iter().rev().collect())?);
    }
    if r1 > 0.0 {
        faces.push(polygon(top)?);
    }
    Ok(Solid::from_polygons(faces))
}

// =============================================================================
// SPHERE
// =============================================================================

/// Sphere of `radius` centred on the origin.
///
/// Rings sit at polar angles `π(i + ½) / rings` with `rings = segments / 2`,
/// so there are no pole vertices and no ring on the equator: the flat
/// top and bottom are small polygons.
pub fn sphere(radius: f64, segments: u32) -> Result<Solid, FeatureError> {
    let radius = positive("radius", radius)?;
    if segments < 4 {
        return Err(FeatureError::Degenerate(format!("{segments} segments")));
    }
    let rings = (segments / 2).max(2) as usize;
    let rows: Vec<Vec<DVec3>> = (0..rings)
        .map(|i| {
            let phi = std::f64::consts::PI * (i as f64 + 0.5) / rings as f64;
            ring(radius * phi.sin(), radius * phi.cos(), segments)
        })
        .collect();

    let n = segments as usize;
    let mut faces = Vec::with_capacity(n * (rings - 1) + 2);
    faces.push(polygon(rows[0].clone())?);
    for pair in rows.windows(2) {
        let (upper, lower) = (&pair[0], &pair[1]);
        for j in 0..n {
            let k = (j + 1) % n;
            faces.push(polygon(vec![lower[j], lower[k], upper[k], upper[j]])?);
        }
    }
    faces.push(polygon(rows[rings - 1].iter().rev().copied().collect())?);
    Ok(Solid::from_polygons(faces))
}

// =============================================================================
// EXTRUSION
// =============================================================================

fn signed_area(outline: &[DVec2]) -> f64 {
    outline
        .iter()
        .zip(outline.iter().cycle().skip(1))
        .map(|(a, b)| a.perp_dot(*b))
        .sum::<f64>()
        * 0.5
}

fn is_convex(outline: &[DVec2]) -> bool {
    let n = outline.len();
    (0..n).all(|i| {
        let (a, b, c) = (outline[i], outline[(i + 1) % n], outline[(i + 2) % n]);
        (b - a).perp_dot(c - b) >= -1e-12
    })
}

/// Cleans an outline: drops non-finite input, repeated points and forces
/// counter-clockwise order.
pub(crate) fn normalize_outline(points: &[DVec2]) -> Result<Vec<DVec2>, FeatureError> {
    if points.iter().any(|p| !p.is_finite()) {
        return Err(FeatureError::NonFinite("outline"));
    }
    let mut outline: Vec<DVec2> = Vec::with_capacity(points.len());
    for p in points {
        if outline.last().map_or(true, |q| q.distance(*p) > 1e-9) {
            outline.push(*p);
        }
    }
    while outline.len() > 1 && outline[0].distance(outline[outline.len() - 1]) <= 1e-9 {
        outline.pop();
    }
    if outline.len() < 3 {
        return Err(FeatureError::Degenerate("outline needs 3 distinct points".into()));
    }
    let area = signed_area(&outline);
    if area.abs() <= 1e-12 {
        return Err(FeatureError::Degenerate("outline encloses no area".into()));
    }
    if area < 0.0 {
        outline.reverse();
    }
    Ok(outline)
}

/// Sweeps a closed 2D outline along `z` from `z0` to `z1`.
///
/// Either winding is accepted. Concave outlines get ear-clipped caps.
///
/// # Example
///
/// ```rust
/// use tactile_mesh::primitives::extrude_polygon;
/// use glam::DVec2;
///
/// let l_shape = [
///     DVec2::new(0.0, 0.0), DVec2::new(2.0, 0.0), DVec2::new(2.0, 1.0),
///     DVec2::new(1.0, 1.0), DVec2::new(1.0, 2.0), DVec2::new(0.0, 2.0),
/// ];
/// let solid = extrude_polygon(&l_shape, 0.0, 1.0).unwrap();
/// assert!((solid.volume() - 3.0).abs() < 1e-9);
/// ```
pub fn extrude_polygon(points: &[DVec2], z0: f64, z1: f64) -> Result<Solid, FeatureError> {
    positive("height", finite("z1", z1)? - finite("z0", z0)?)?;
    let outline = normalize_outline(points)?;
    let n = outline.len();
    let at = |p: DVec2, z: f64| DVec3::new(p.x, p.y, z);

    let mut faces = Vec::with_capacity(n + 2);
    for i in 0..n {
        let (a, b) = (outline[i], outline[(i + 1) % n]);
        faces.push(polygon(vec![at(a, z0), at(b, z0), at(b, z1), at(a, z1)])?);
    }

    if is_convex(&outline) {
        faces.push(polygon(outline.iter().rev().map(|p| at(*p, z0)).collect())?);
        faces.push(polygon(outline.iter().map(|p| at(*p, z1)).collect())?);
    } else {
        for [a, b, c] in ear_clip(&outline)? {
            let (a, b, c) = (outline[a], outline[b], outline[c]);
            faces.push(polygon(vec![at(c, z0), at(b, z0), at(a, z0)])?);
            faces.push(polygon(vec![at(a, z1), at(b, z1), at(c, z1)])?);
        }
    }
    Ok(Solid::from_polygons(faces))
}

/// Triangulates a simple polygon, returning counter-clockwise triangles.
fn ear_clip(outline: &[DVec2]) -> Result<Vec<[usize; 3]>, FeatureError> {
    let flat: Vec<f64> = outline.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = earcutr::earcut(&flat, &[], 2)
        .map_err(|e| FeatureError::Degenerate(format!("triangulation failed: {e:?}")))?;
    let triangles: Vec<[usize; 3]> = indices
        .chunks_exact(3)
        .map(|t| {
            let (a, b, c) = (outline[t[0]], outline[t[1]], outline[t[2]]);
            if (b - a).perp_dot(c - a) < 0.0 {
                [t[0], t[2], t[1]]
            } else {
                [t[0], t[1], t[2]]
            }
        })
        .collect();
    if triangles.is_empty() {
        return Err(FeatureError::Degenerate("outline produced no triangles".into()));
    }
    Ok(triangles)
}
