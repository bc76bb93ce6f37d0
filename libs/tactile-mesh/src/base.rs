//! # Base Solid Builder
//!
//! Builds the plate or cylindrical shell that features are combined with.
//!
//! Plates are built in the export frame. Shells are built along export `+Z`
//! and then moved into the cylinder construction frame (axis `+Y`) with
//! [`construction_from_export`], so the outline of a bore is given in the
//! same `(x, y)` plane the exported part is viewed in from above.

use crate::backend::CsgBackend;
use crate::config::EngineConfig;
use crate::csg::{BooleanOp, Solid};
use crate::error::{EngineError, EngineResult, FeatureError};
use crate::placement::construction_from_export;
use crate::primitives::{cuboid, extrude_polygon, frustum};
use crate::spec::{BaseSpec, PlateSpec};
use config::constants::THROUGH_CUT_MARGIN;
use glam::DVec3;
use tracing::debug;

/// Box centred on the plate's centre.
pub fn plate_solid(plate: &PlateSpec) -> Result<Solid, FeatureError> {
    let center = DVec3::new(plate.center_x, plate.center_y, plate.center_z);
    let half = DVec3::new(plate.width, plate.height, plate.thickness) * 0.5;
    cuboid(center - half, center + half)
}

/// Outer cylinder of a shell, construction frame.
pub fn shell_outer(radius: f64, height: f64, segments: u32) -> Result<Solid, FeatureError> {
    let half = height * 0.5;
    Ok(frustum(radius, radius, -half, half, segments)?.transform(&construction_from_export()))
}

/// Through-cut removed from the outer cylinder, construction frame.
///
/// It extends [`THROUGH_CUT_MARGIN`] past both ends of the shell so that no
/// end cap of the cut is coplanar with the shell's end faces.
pub fn shell_inner(
    radius: f64,
    height: f64,
    wall_thickness: f64,
    bore: Option<&[glam::DVec2]>,
    segments: u32,
) -> Result<Solid, FeatureError> {
    let half = height * 0.5 + THROUGH_CUT_MARGIN;
    let cut = match bore {
        Some(outline) => extrude_polygon(outline, -half, half)?,
        None => {
            let inner = radius - wall_thickness;
            frustum(inner, inner, -half, half, segments)?
        }
    };
    Ok(cut.transform(&construction_from_export()))
}

/// Builds the base through `backend`.
///
/// # Errors
///
/// Returns [`EngineError::Base`] when the dimensions produce no solid, or
/// the backend's error for the shell subtraction.
pub fn build_base<B: CsgBackend>(
    backend: &B,
    base: &BaseSpec,
    config: &EngineConfig,
) -> EngineResult<B::Handle> {
    match base {
        BaseSpec::Plate(plate) => {
            debug!(width = plate.width, height = plate.height, "building plate");
            backend.import(plate_solid(plate).map_err(EngineError::Base)?)
        }
        BaseSpec::Cylinder {
            radius,
            height,
            wall_thickness,
            bore,
        } => {
            debug!(radius, height, bore = bore.is_some(), "building shell");
            let segments = config.default_segments;
            let outer = shell_outer(*radius, *height, segments).map_err(EngineError::Base)?;
            let inner = shell_inner(*radius, *height, *wall_thickness, bore.as_deref(), segments)
                .map_err(EngineError::Base)?;
            let outer = backend.import(outer)?;
            let inner = backend.import(inner)?;
            backend.combine(outer, inner, BooleanOp::Subtract)
        }
    }
}
