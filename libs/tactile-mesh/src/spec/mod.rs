//! # Geometry Specification
//!
//! The declarative input of one generation job, as produced by the layout
//! collaborator. Deserialized with `serde`; see [`validate`] for the rules
//! applied before any mesh work.
//!
//! ## JSON shape
//!
//! ```json
//! {
//!   "shape_kind": "flat",
//!   "polarity": "embossing",
//!   "plate": {"width": 50, "height": 30, "thickness": 2,
//!             "center_x": 25, "center_y": 15, "center_z": 1},
//!   "dots": [{"position": {"x": 10, "y": 10, "z": 2}, "shape": "standard",
//!             "base_radius": 0.9, "top_radius": 0.5, "height": 0.6}],
//!   "markers": [{"kind": "triangle", "position": {"x": 3, "y": 3, "z": 2},
//!                "size": 2, "depth": 0.5}]
//! }
//! ```

mod validate;

pub use validate::{validate, BaseSpec, ValidatedSpec};

use crate::error::SpecError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Base solid family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Rectangular plate.
    Flat,
    /// Cylindrical shell.
    Cylindrical,
}

impl ShapeKind {
    /// Lowercase name used in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Flat => "flat",
            ShapeKind::Cylindrical => "cylindrical",
        }
    }
}

/// Whether dots are raised or sunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Positive plate: dots are added.
    Embossing,
    /// Negative plate: every dot is a recess.
    Counter,
}

/// Flat plate dimensions. The box is centred on `center_*`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateSpec {
    /// Extent along X.
    pub width: f64,
    /// Extent along Y.
    pub height: f64,
    /// Extent along Z.
    pub thickness: f64,
    /// Centre X.
    #[serde(default)]
    pub center_x: f64,
    /// Centre Y.
    #[serde(default)]
    pub center_y: f64,
    /// Centre Z.
    #[serde(default)]
    pub center_z: f64,
}

/// Cylindrical shell dimensions, centred on the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CylinderSpec {
    /// Outer radius.
    pub radius: f64,
    /// Length along the axis.
    pub height: f64,
    /// Wall thickness of the uniform shell, used when no bore is given.
    pub wall_thickness: f64,
    /// Cross-section of a polygonal through-cut, in the plane normal to the
    /// axis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bore_points: Option<Vec<[f64; 2]>>,
}

/// Position of a feature, in the convention of the base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    /// Cartesian point on a flat plate's surface.
    Flat {
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
        /// Surface height.
        z: f64,
    },
    /// Angle, axial height and surface radius on a cylinder.
    Cylindrical {
        /// Angle in radians, counter-clockwise from `+X` seen from `+Z`.
        theta: f64,
        /// Axial height from the cylinder's mid-plane.
        y: f64,
        /// Surface radius; defaults to the cylinder radius.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        radius: Option<f64>,
    },
}

impl Position {
    /// Which base convention the position uses.
    pub fn kind(&self) -> ShapeKind {
        match self {
            Position::Flat { .. } => ShapeKind::Flat,
            Position::Cylindrical { .. } => ShapeKind::Cylindrical,
        }
    }
}

/// Shape family and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum DotShape {
    /// Truncated cone.
    Standard {
        /// Radius at the surface.
        base_radius: f64,
        /// Radius at the tip.
        top_radius: f64,
        /// Height above (or depth below) the surface.
        height: f64,
    },
    /// Frustum topped by a spherical cap.
    Rounded {
        /// Radius at the surface.
        base_radius: f64,
        /// Height of the frustum part.
        #[serde(default)]
        base_height: f64,
        /// Radius of the sphere the cap is cut from.
        dome_radius: f64,
        /// Height of the cap.
        dome_height: f64,
    },
    /// Sphere centred on the surface. Always a recess.
    Hemisphere {
        /// Sphere radius.
        radius: f64,
    },
    /// Spherical cap recess with a given opening and depth.
    Bowl {
        /// Opening radius at the surface.
        radius: f64,
        /// Depth below the surface.
        depth: f64,
    },
    /// Truncated cone. Raised like a standard dot unless `is_recess` is
    /// set, in which case the radii swap so the cavity is wide at the
    /// surface.
    Cone {
        /// Radius at the surface.
        base_radius: f64,
        /// Radius at the far end.
        top_radius: f64,
        /// Height above, or depth below, the surface.
        height: f64,
    },
}

impl DotShape {
    /// Family name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            DotShape::Standard { .. } => "standard",
            DotShape::Rounded { .. } => "rounded",
            DotShape::Hemisphere { .. } => "hemisphere",
            DotShape::Bowl { .. } => "bowl",
            DotShape::Cone { .. } => "cone",
        }
    }

    /// Families that can only be subtracted.
    pub fn is_inherent_recess(&self) -> bool {
        matches!(self, DotShape::Hemisphere { .. } | DotShape::Bowl { .. })
    }

    /// Radius of the footprint on the surface.
    pub fn footprint_radius(&self) -> f64 {
        match *self {
            DotShape::Standard { base_radius, .. }
            | DotShape::Rounded { base_radius, .. }
            | DotShape::Cone { base_radius, .. } => base_radius,
            DotShape::Hemisphere { radius } | DotShape::Bowl { radius, .. } => radius,
        }
    }

    pub(crate) fn numeric_fields(&self) -> Vec<(&'static str, f64)> {
        match *self {
            DotShape::Standard {
                base_radius,
                top_radius,
                height,
            }
            | DotShape::Cone {
                base_radius,
                top_radius,
                height,
            } => vec![
                ("base_radius", base_radius),
                ("top_radius", top_radius),
                ("height", height),
            ],
            DotShape::Rounded {
                base_radius,
                base_height,
                dome_radius,
                dome_height,
            } => vec![
                ("base_radius", base_radius),
                ("base_height", base_height),
                ("dome_radius", dome_radius),
                ("dome_height", dome_height),
            ],
            DotShape::Hemisphere { radius } => vec![("radius", radius)],
            DotShape::Bowl { radius, depth } => vec![("radius", radius), ("depth", depth)],
        }
    }
}

/// One braille dot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DotSpec {
    /// Where the dot sits.
    pub position: Position,
    /// Family and parameters.
    #[serde(flatten)]
    pub shape: DotShape,
    /// Sinks a cone dot on an embossing plate. Other families ignore it.
    #[serde(default)]
    pub is_recess: bool,
}

impl DotSpec {
    /// Whether this dot is subtracted under `polarity`.
    ///
    /// Hemispheres and bowls always are, as is every dot on a counter
    /// plate. On an embossing plate standard and rounded dots are always
    /// raised and cones follow `is_recess`.
    pub fn is_recess_for(&self, polarity: Polarity) -> bool {
        match self.shape {
            DotShape::Hemisphere { .. } | DotShape::Bowl { .. } => true,
            _ if polarity == Polarity::Counter => true,
            DotShape::Cone { .. } => self.is_recess,
            DotShape::Standard { .. } | DotShape::Rounded { .. } => false,
        }
    }
}

/// Marker family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Isosceles triangle pointing forward.
    Triangle,
    /// Rectangle.
    Rectangle,
    /// Bitmap glyph.
    Character,
}

impl MarkerKind {
    /// Kind name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            MarkerKind::Triangle => "triangle",
            MarkerKind::Rectangle => "rectangle",
            MarkerKind::Character => "character",
        }
    }
}

/// An orientation or indicator feature. Always subtracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSpec {
    /// Marker family.
    pub kind: MarkerKind,
    /// Centre of the marker.
    pub position: Position,
    /// Triangle edge, default rectangle edge, or glyph height.
    pub size: f64,
    /// Cavity depth below the surface.
    pub depth: f64,
    /// Rotate a triangle by 180° in the surface plane.
    #[serde(default)]
    pub mirrored: bool,
    /// Glyph payload for character markers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    /// Rectangle extent along the forward direction. Defaults to `size`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Rectangle extent along the axial direction. Defaults to `size`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// One element of a feature list.
///
/// An element that does not fit its schema is kept as raw JSON with the
/// parser's message, so that [`validate`] can skip it like any other invalid
/// feature instead of the whole specification failing to parse.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureEntry<T> {
    /// A well-formed feature.
    Parsed(T),
    /// An element that failed to parse.
    Malformed {
        /// The element as sent.
        raw: serde_json::Value,
        /// Why it did not parse.
        error: String,
    },
}

impl<T> FeatureEntry<T> {
    /// The feature, when it parsed.
    pub fn parsed(&self) -> Option<&T> {
        match self {
            FeatureEntry::Parsed(feature) => Some(feature),
            FeatureEntry::Malformed { .. } => None,
        }
    }

    /// Mutable access to the feature, when it parsed.
    pub fn parsed_mut(&mut self) -> Option<&mut T> {
        match self {
            FeatureEntry::Parsed(feature) => Some(feature),
            FeatureEntry::Malformed { .. } => None,
        }
    }
}

impl<T> From<T> for FeatureEntry<T> {
    fn from(feature: T) -> Self {
        FeatureEntry::Parsed(feature)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for FeatureEntry<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(match T::deserialize(&raw) {
            Ok(feature) => FeatureEntry::Parsed(feature),
            Err(error) => FeatureEntry::Malformed {
                raw,
                error: error.to_string(),
            },
        })
    }
}

impl<T: Serialize> Serialize for FeatureEntry<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeatureEntry::Parsed(feature) => feature.serialize(serializer),
            FeatureEntry::Malformed { raw, .. } => raw.serialize(serializer),
        }
    }
}

/// Root input of a generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySpec {
    /// Base family.
    pub shape_kind: ShapeKind,
    /// Dot polarity.
    pub polarity: Polarity,
    /// Plate dimensions for `flat`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate: Option<PlateSpec>,
    /// Cylinder dimensions for `cylindrical`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cylinder: Option<CylinderSpec>,
    /// Dots, in declaration order.
    #[serde(default)]
    pub dots: Vec<FeatureEntry<DotSpec>>,
    /// Markers, in declaration order.
    #[serde(default)]
    pub markers: Vec<FeatureEntry<MarkerSpec>>,
}

impl GeometrySpec {
    /// Parses a specification from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Json`] for malformed input outside the feature
    /// lists. Malformed features and semantic checks are left to
    /// [`validate`].
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests;
