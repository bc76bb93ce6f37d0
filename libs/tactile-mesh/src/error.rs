//! # Engine Errors
//!
//! Error types for specification validation, feature construction and
//! boolean evaluation.
//!
//! ## Taxonomy
//!
//! - [`SpecError`]: fatal, raised before any mesh work begins.
//! - [`FeatureError`]: recoverable, the offending dot or marker is skipped.
//! - [`EngineError`]: fatal for the job, surfaced as a generation failure.
//! - [`LoaderError`]: a runtime resource could not be fetched.

use crate::csg::BooleanOp;
use config::constants::ConfigError;
use thiserror::Error;

/// Result alias for fallible engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Fatal problems with a [`GeometrySpec`](crate::spec::GeometrySpec).
#[derive(Debug, Error)]
pub enum SpecError {
    /// The request body is not valid specification JSON.
    #[error("invalid specification JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The base block required by `shape_kind` is absent.
    #[error("missing `{field}` for shape_kind `{shape_kind}`")]
    MissingBase {
        /// Name of the missing block (`plate` or `cylinder`).
        field: &'static str,
        /// The declared shape kind.
        shape_kind: &'static str,
    },

    /// Both base blocks were supplied.
    #[error("`plate` and `cylinder` are mutually exclusive")]
    ConflictingBase,

    /// A numeric base field is non-finite or out of range.
    #[error("invalid `{field}`: {value} ({reason})")]
    InvalidField {
        /// Dotted path of the field, e.g. `cylinder.radius`.
        field: &'static str,
        /// The rejected value.
        value: f64,
        /// What the field must satisfy.
        reason: &'static str,
    },

    /// The bore cross-section cannot form a through-cut.
    #[error("invalid `cylinder.bore_points`: {0}")]
    InvalidBore(String),
}

impl SpecError {
    /// Creates an invalid field error.
    pub fn field(field: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidField {
            field,
            value,
            reason,
        }
    }
}

/// A single dot or marker that cannot be built.
///
/// These never abort a job. The engine logs them and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// A numeric parameter is NaN or infinite.
    #[error("non-finite `{0}`")]
    NonFinite(&'static str),

    /// A size parameter is zero or negative.
    #[error("`{field}` must be positive, got {value}")]
    NonPositive {
        /// Parameter name.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The position uses the wrong coordinate convention for the base.
    #[error("{found} position on a {expected} base")]
    PositionMismatch {
        /// Coordinate convention required by the base.
        expected: &'static str,
        /// Coordinate convention supplied.
        found: &'static str,
    },

    /// Construction produced geometry with no volume or with NaN vertices.
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    /// A character marker has no payload.
    #[error("character marker without a character")]
    MissingCharacter,
}

/// Failure to fetch a runtime resource.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoaderError {
    /// The loader does not know the resource.
    #[error("resource `{0}` not found")]
    NotFound(String),

    /// The source was reachable but failed.
    #[error("resource `{name}` unavailable: {reason}")]
    Unavailable {
        /// Resource name.
        name: String,
        /// Source-specific failure description.
        reason: String,
    },

    /// The resource bytes could not be decoded.
    #[error("resource `{name}` is malformed: {reason}")]
    Malformed {
        /// Resource name.
        name: String,
        /// Decoder failure description.
        reason: String,
    },
}

/// Fatal errors for one generation job.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Specification validation failed.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// Engine configuration is out of range.
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),

    /// The validated base still produced unusable geometry.
    #[error("base solid cannot be built: {0}")]
    Base(FeatureError),

    /// A boolean step could not produce a result.
    #[error("{operation} failed{}: {reason}", feature_suffix(.feature_index))]
    Boolean {
        /// The operation that failed.
        operation: BooleanOp,
        /// Index of the feature involved, when known.
        feature_index: Option<usize>,
        /// Evaluator message.
        reason: String,
    },

    /// The guaranteed-manifold runtime has not been initialised.
    #[error("backend `{0}` is not ready: initialize the runtime first")]
    NotReady(&'static str),

    /// The finished mesh has open or over-shared edges.
    #[error("result is not manifold: {open_edges} unmatched edges")]
    NonManifold {
        /// Directed edges without exactly one opposite partner.
        open_edges: usize,
    },

    /// A handle outlived the arena slot it referred to.
    #[error("solid handle no longer refers to a live solid")]
    StaleHandle,

    /// Runtime resource loading failed.
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// The mesh could not be encoded.
    #[error("STL export failed: {0}")]
    Export(#[from] std::io::Error),

    /// The job exceeded its time budget.
    #[error("generation timed out after {0} ms")]
    Timeout(u64),
}

impl EngineError {
    /// Creates a boolean failure error.
    pub fn boolean(
        operation: BooleanOp,
        feature_index: Option<usize>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Boolean {
            operation,
            feature_index,
            reason: reason.into(),
        }
    }

    /// Attaches a feature index to a boolean failure that has none.
    pub fn at_feature(self, index: usize) -> Self {
        match self {
            Self::Boolean {
                operation,
                feature_index: None,
                reason,
            } => Self::Boolean {
                operation,
                feature_index: Some(index),
                reason,
            },
            other => other,
        }
    }
}

fn feature_suffix(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" at feature {i}"),
        None => String::new(),
    }
}
