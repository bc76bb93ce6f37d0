//! Specification validation.
//!
//! Base problems are fatal. Feature problems skip the one feature with a
//! warning and are counted in [`ValidatedSpec::skipped`].

use super::{
    DotSpec, FeatureEntry, GeometrySpec, MarkerSpec, PlateSpec, Polarity, Position, ShapeKind,
};
use crate::error::{FeatureError, SpecError};
use crate::primitives::normalize_outline;
use glam::DVec2;
use tracing::warn;

/// A base solid whose dimensions passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseSpec {
    /// Rectangular plate.
    Plate(PlateSpec),
    /// Cylindrical shell.
    Cylinder {
        /// Outer radius.
        radius: f64,
        /// Axial length.
        height: f64,
        /// Uniform wall thickness when there is no bore.
        wall_thickness: f64,
        /// Counter-clockwise bore outline, when supplied.
        bore: Option<Vec<DVec2>>,
    },
}

impl BaseSpec {
    /// The matching shape kind.
    pub fn kind(&self) -> ShapeKind {
        match self {
            BaseSpec::Plate(_) => ShapeKind::Flat,
            BaseSpec::Cylinder { .. } => ShapeKind::Cylindrical,
        }
    }
}

/// Output of [`validate`]: the base plus the features that will be built,
/// each with its index in the original list.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSpec {
    /// Base solid.
    pub base: BaseSpec,
    /// Dot polarity.
    pub polarity: Polarity,
    /// Accepted dots.
    pub dots: Vec<(usize, DotSpec)>,
    /// Accepted markers.
    pub markers: Vec<(usize, MarkerSpec)>,
    /// Features dropped during validation.
    pub skipped: usize,
}

fn positive_field(field: &'static str, value: f64) -> Result<f64, SpecError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SpecError::field(field, value, "must be finite and positive"))
    }
}

fn finite_field(field: &'static str, value: f64) -> Result<f64, SpecError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SpecError::field(field, value, "must be finite"))
    }
}

fn validate_base(spec: &GeometrySpec) -> Result<BaseSpec, SpecError> {
    match (spec.shape_kind, &spec.plate, &spec.cylinder) {
        (_, Some(_), Some(_)) => Err(SpecError::ConflictingBase),
        (ShapeKind::Flat, Some(plate), None) => {
            positive_field("plate.width", plate.width)?;
            positive_field("plate.height", plate.height)?;
            positive_field("plate.thickness", plate.thickness)?;
            finite_field("plate.center_x", plate.center_x)?;
            finite_field("plate.center_y", plate.center_y)?;
            finite_field("plate.center_z", plate.center_z)?;
            Ok(BaseSpec::Plate(*plate))
        }
        (ShapeKind::Cylindrical, None, Some(cylinder)) => {
            let radius = positive_field("cylinder.radius", cylinder.radius)?;
            let height = positive_field("cylinder.height", cylinder.height)?;
            let wall = positive_field("cylinder.wall_thickness", cylinder.wall_thickness)?;
            let bore = match &cylinder.bore_points {
                Some(points) => {
                    if points.len() < 3 {
                        return Err(SpecError::InvalidBore(format!(
                            "needs at least 3 points, got {}",
                            points.len()
                        )));
                    }
                    let outline: Vec<DVec2> = points.iter().map(|p| DVec2::from_array(*p)).collect();
                    let outline =
                        normalize_outline(&outline).map_err(|e| SpecError::InvalidBore(e.to_string()))?;
                    Some(outline)
                }
                None => {
                    if wall >= radius {
                        return Err(SpecError::field(
                            "cylinder.wall_thickness",
                            wall,
                            "must be smaller than the radius",
                        ));
                    }
                    None
                }
            };
            Ok(BaseSpec::Cylinder {
                radius,
                height,
                wall_thickness: wall,
                bore,
            })
        }
        (ShapeKind::Flat, _, _) => Err(SpecError::MissingBase {
            field: "plate",
            shape_kind: "flat",
        }),
        (ShapeKind::Cylindrical, _, _) => Err(SpecError::MissingBase {
            field: "cylinder",
            shape_kind: "cylindrical",
        }),
    }
}

pub(crate) fn check_position(position: &Position, kind: ShapeKind) -> Result<(), FeatureError> {
    if position.kind() != kind {
        return Err(FeatureError::PositionMismatch {
            expected: kind.as_str(),
            found: position.kind().as_str(),
        });
    }
    let fields: Vec<(&'static str, f64)> = match position {
        Position::Flat { x, y, z } => vec![("x", *x), ("y", *y), ("z", *z)],
        Position::Cylindrical { theta, y, radius } => {
            if let Some(r) = radius {
                if !r.is_finite() {
                    return Err(FeatureError::NonFinite("radius"));
                }
                if *r <= 0.0 {
                    return Err(FeatureError::NonPositive {
                        field: "radius",
                        value: *r,
                    });
                }
            }
            vec![("theta", *theta), ("y", *y)]
        }
    };
    for (name, value) in fields {
        if !value.is_finite() {
            return Err(FeatureError::NonFinite(name));
        }
    }
    Ok(())
}

fn check_dot(dot: &DotSpec, kind: ShapeKind) -> Result<(), FeatureError> {
    check_position(&dot.position, kind)?;
    for (name, value) in dot.shape.numeric_fields() {
        if !value.is_finite() {
            return Err(FeatureError::NonFinite(name));
        }
        let may_be_zero = matches!(name, "top_radius" | "base_height");
        if value < 0.0 || (value == 0.0 && !may_be_zero) {
            return Err(FeatureError::NonPositive { field: name, value });
        }
    }
    Ok(())
}

fn check_marker(marker: &MarkerSpec, kind: ShapeKind) -> Result<(), FeatureError> {
    check_position(&marker.position, kind)?;
    let mut fields = vec![("size", marker.size), ("depth", marker.depth)];
    fields.extend(marker.width.map(|w| ("width", w)));
    fields.extend(marker.height.map(|h| ("height", h)));
    for (name, value) in fields {
        if !value.is_finite() {
            return Err(FeatureError::NonFinite(name));
        }
        if value <= 0.0 {
            return Err(FeatureError::NonPositive { field: name, value });
        }
    }
    Ok(())
}

/// Family name of an unparsed feature, for the skip warning.
fn raw_kind<'a>(raw: &'a serde_json::Value, field: &str) -> &'a str {
    raw.get(field)
        .and_then(serde_json::Value::as_str)
        .unwrap_or("unknown")
}

/// Validates a specification.
///
/// # Errors
///
/// Returns [`SpecError`] when the base is missing, duplicated or out of
/// range, or the bore cannot form a through-cut. Invalid or malformed
/// features never produce an error.
///
/// # Example
///
/// ```rust
/// use tactile_mesh::spec::{validate, GeometrySpec};
///
/// let spec = GeometrySpec::from_json(r#"{
///     "shape_kind": "flat", "polarity": "embossing",
///     "plate": {"width": 50, "height": 30, "thickness": 2},
///     "dots": [{"position": {"x": 1, "y": 1, "z": 2}, "shape": "hemisphere", "radius": -1}]
/// }"#).unwrap();
/// let validated = validate(&spec).unwrap();
/// assert!(validated.dots.is_empty());
/// assert_eq!(validated.skipped, 1);
/// ```
pub fn validate(spec: &GeometrySpec) -> Result<ValidatedSpec, SpecError> {
    let base = validate_base(spec)?;
    let kind = base.kind();
    let mut skipped = 0;

    let mut dots = Vec::with_capacity(spec.dots.len());
    for (index, entry) in spec.dots.iter().enumerate() {
        let dot = match entry {
            FeatureEntry::Parsed(dot) => dot,
            FeatureEntry::Malformed { raw, error } => {
                warn!(index, kind = raw_kind(raw, "shape"), %error, "skipping malformed dot");
                skipped += 1;
                continue;
            }
        };
        match check_dot(dot, kind) {
            Ok(()) => dots.push((index, *dot)),
            Err(error) => {
                warn!(index, kind = dot.shape.name(), %error, "skipping invalid dot");
                skipped += 1;
            }
        }
    }

    let mut markers = Vec::with_capacity(spec.markers.len());
    for (index, entry) in spec.markers.iter().enumerate() {
        let marker = match entry {
            FeatureEntry::Parsed(marker) => marker,
            FeatureEntry::Malformed { raw, error } => {
                warn!(index, kind = raw_kind(raw, "kind"), %error, "skipping malformed marker");
                skipped += 1;
                continue;
            }
        };
        match check_marker(marker, kind) {
            Ok(()) => markers.push((index, marker.clone())),
            Err(error) => {
                warn!(index, kind = marker.kind.name(), %error, "skipping invalid marker");
                skipped += 1;
            }
        }
    }

    Ok(ValidatedSpec {
        base,
        polarity: spec.polarity,
        dots,
        markers,
        skipped,
    })
}
