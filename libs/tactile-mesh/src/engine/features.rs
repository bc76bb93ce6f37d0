//! Dot and marker solids, placed in the construction frame.
//!
//! Protrusions start `embed` below the surface and recesses stop
//! [`coplanar_offset`](crate::config::EngineConfig::coplanar_offset) above
//! it, so no feature face ever lies on a base face.

use crate::config::EngineConfig;
use crate::csg::Solid;
use crate::error::FeatureError;
use crate::placement::{half_turn, mirror_depth, Site};
use crate::primitives::{
    bowl_sphere_radius, cuboid, extrude_polygon, frustum, glyph_solid, rounded_dome, sphere,
    DomeShape, GlyphFont,
};
use crate::spec::{BaseSpec, DotShape, DotSpec, MarkerKind, MarkerSpec, Polarity, Position};
use config::constants::CHARACTER_FALLBACK_DEPTH;
use glam::{DVec2, DVec3};

/// Resolves a validated position against the base.
pub fn site_for(position: &Position, base: &BaseSpec) -> Result<Site, FeatureError> {
    match (position, base) {
        (Position::Flat { x, y, z }, BaseSpec::Plate(_)) => Ok(Site::Flat {
            origin: DVec3::new(*x, *y, *z),
        }),
        (Position::Cylindrical { theta, y, radius }, BaseSpec::Cylinder { radius: base, .. }) => {
            Ok(Site::Cylinder {
                radius: radius.unwrap_or(*base),
                theta: *theta,
                y: *y,
            })
        }
        (position, base) => Err(FeatureError::PositionMismatch {
            expected: base.kind().as_str(),
            found: position.kind().as_str(),
        }),
    }
}

/// Builds a placed dot. Recess dots come back as the cavity to subtract.
///
/// Spheres for hemisphere and bowl dots are centred on the surface of a
/// cylinder. On a flat plate a bowl sphere is raised so the cavity has the
/// requested opening and depth.
pub fn dot_solid(
    dot: &DotSpec,
    site: &Site,
    polarity: Polarity,
    config: &EngineConfig,
) -> Result<Solid, FeatureError> {
    let segments = config.feature_segments;
    let offset = config.coplanar_offset;
    let recess = dot.is_recess_for(polarity);

    let solid = match dot.shape {
        DotShape::Standard {
            base_radius,
            top_radius,
            height,
        }
        | DotShape::Cone {
            base_radius,
            top_radius,
            height,
        } => {
            let local = if recess {
                frustum(top_radius, base_radius, -height, offset, segments)?
            } else {
                let embed = site.embed_depth(base_radius, offset);
                frustum(base_radius, top_radius, -embed, height, segments)?
            };
            local.transform(&site.frame())
        }
        DotShape::Rounded {
            base_radius,
            base_height,
            dome_radius,
            dome_height,
        } => {
            let shape = DomeShape {
                base_radius,
                base_height,
                dome_radius,
                dome_height,
            };
            if recess {
                rounded_dome(&shape, offset, segments)?
                    .transform(&mirror_depth())
                    .transform(&site.frame())
            } else {
                let embed = site.embed_depth(base_radius, offset);
                rounded_dome(&shape, embed, segments)?.transform(&site.frame())
            }
        }
        DotShape::Hemisphere { radius } => {
            sphere(radius, segments)?.transform(&site.translation(0.0))
        }
        DotShape::Bowl { radius, depth } => {
            let sphere_radius = bowl_sphere_radius(radius, depth);
            let outward = match site {
                Site::Flat { .. } => sphere_radius - depth,
                Site::Cylinder { .. } => 0.0,
            };
            sphere(sphere_radius, segments)?.transform(&site.translation(outward))
        }
    };
    finished(solid, dot.shape.name())
}

/// A placed marker cavity and whether it is a glyph fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSolid {
    /// Cavity to subtract.
    pub solid: Solid,
    /// The requested glyph was unavailable and a rectangle was used.
    pub fallback: bool,
}

/// Builds a placed marker cavity.
///
/// Characters missing from `font` become a `size`×`size` rectangle
/// [`CHARACTER_FALLBACK_DEPTH`] deep at the same position.
pub fn marker_solid(
    marker: &MarkerSpec,
    site: &Site,
    font: &GlyphFont,
    config: &EngineConfig,
) -> Result<MarkerSolid, FeatureError> {
    let offset = config.coplanar_offset;
    let mut fallback = false;
    let local = match marker.kind {
        MarkerKind::Triangle => {
            let triangle = triangle_cavity(marker.size, marker.depth, offset)?;
            if marker.mirrored {
                triangle.transform(&half_turn())
            } else {
                triangle
            }
        }
        MarkerKind::Rectangle => rectangle_cavity(
            marker.width.unwrap_or(marker.size),
            marker.height.unwrap_or(marker.size),
            marker.depth,
            offset,
        )?,
        MarkerKind::Character => {
            let c = marker
                .character
                .as_deref()
                .and_then(|s| s.chars().next())
                .ok_or(FeatureError::MissingCharacter)?;
            match font.get(c) {
                Some(rows) => glyph_solid(rows, marker.size, -marker.depth, offset)?,
                None => {
                    fallback = true;
                    rectangle_cavity(marker.size, marker.size, CHARACTER_FALLBACK_DEPTH, offset)?
                }
            }
        }
    };
    Ok(MarkerSolid {
        solid: finished(local.transform(&site.frame()), marker.kind.name())?,
        fallback,
    })
}

/// Isosceles triangle with its apex on local `+x`.
pub fn triangle_cavity(size: f64, depth: f64, offset: f64) -> Result<Solid, FeatureError> {
    let h = size * 0.5;
    let outline = [DVec2::new(h, 0.0), DVec2::new(-h, h), DVec2::new(-h, -h)];
    extrude_polygon(&outline, -depth, offset)
}

/// Rectangle `width` along local `x` and `height` along local `y`.
pub fn rectangle_cavity(
    width: f64,
    height: f64,
    depth: f64,
    offset: f64,
) -> Result<Solid, FeatureError> {
    let half = DVec3::new(width * 0.5, height * 0.5, 0.0);
    cuboid(
        DVec3::new(-half.x, -half.y, -depth),
        DVec3::new(half.x, half.y, offset),
    )
}

fn finished(solid: Solid, kind: &str) -> Result<Solid, FeatureError> {
    if solid.is_empty() {
        Err(FeatureError::Degenerate(format!("{kind} has no faces")))
    } else if !solid.is_finite() {
        Err(FeatureError::Degenerate(format!("{kind} has non-finite vertices")))
    } else {
        Ok(solid)
    }
}
