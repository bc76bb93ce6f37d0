//! Centralized configuration values shared across the tactile mesh pipeline.
//!
//! Each public item documents its purpose and, where useful, a minimal usage
//! example so that downstream crates can avoid scattering literals.

use thiserror::Error;

// =============================================================================
// PRECISION
// =============================================================================

/// Numerical tolerance used for degenerate-geometry checks (zero-length
/// normals, collapsed edges).
///
/// # Examples
/// ```
/// use config::constants::EPSILON_TOLERANCE;
/// assert!(EPSILON_TOLERANCE < 1.0e-6);
/// ```
pub const EPSILON_TOLERANCE: f64 = 1.0e-9;

/// Thickness of a BSP splitting plane. Points closer than this are coplanar.
pub const PLANE_EPSILON: f64 = 1.0e-5;

/// Distance below which two vertices are welded into one when a polygon soup
/// is converted back to an indexed mesh.
///
/// # Examples
/// ```
/// use config::constants::{PLANE_EPSILON, WELD_TOLERANCE};
/// assert!(WELD_TOLERANCE >= PLANE_EPSILON);
/// ```
pub const WELD_TOLERANCE: f64 = 1.0e-5;

/// Small positive offset applied on the outward side of feature placements so
/// that a feature never shares an exact plane with the base solid.
///
/// # Examples
/// ```
/// use config::constants::COPLANAR_OFFSET;
/// assert!(COPLANAR_OFFSET >= 0.01 && COPLANAR_OFFSET <= 0.05);
/// ```
pub const COPLANAR_OFFSET: f64 = 0.02;

// =============================================================================
// TESSELLATION
// =============================================================================

/// Segment count for base cylinders. A multiple of four so that the
/// tessellated outline touches the nominal diameter on both axes.
///
/// # Examples
/// ```
/// use config::constants::DEFAULT_SEGMENTS;
/// assert_eq!(DEFAULT_SEGMENTS % 4, 0);
/// ```
pub const DEFAULT_SEGMENTS: u32 = 48;

/// Segment count for the small round features (dots and spherical recesses).
pub const FEATURE_SEGMENTS: u32 = 16;

/// Extra length added on both ends of tools that must cut fully through a
/// solid (inner cylinder, bore extrusion).
pub const THROUGH_CUT_MARGIN: f64 = 1.0;

/// Side length of the temporary cutting box used to trim a sphere into a cap,
/// expressed as a multiple of the sphere radius.
pub const CAP_CUTTER_SCALE: f64 = 4.0;

// =============================================================================
// MARKERS
// =============================================================================

/// Depth used when a character marker falls back to a rectangle because its
/// glyph is not in the bitmap font.
///
/// # Examples
/// ```
/// use config::constants::CHARACTER_FALLBACK_DEPTH;
/// assert!(CHARACTER_FALLBACK_DEPTH > 0.0);
/// ```
pub const CHARACTER_FALLBACK_DEPTH: f64 = 0.5;

/// Columns of a bitmap font glyph.
pub const GLYPH_COLUMNS: usize = 5;

/// Rows of a bitmap font glyph.
pub const GLYPH_ROWS: usize = 7;

// =============================================================================
// RUNTIME
// =============================================================================

/// Bytes of stack space reserved when growing recursion limits using the
/// `stacker` crate.
///
/// # Examples
/// ```
/// use config::constants::STACKER_STACK_SIZE_BYTES;
/// assert!(STACKER_STACK_SIZE_BYTES >= 1024);
/// ```
pub const STACKER_STACK_SIZE_BYTES: usize = 8 * 1024 * 1024;

/// Remaining stack below which `stacker` allocates a new segment.
pub const STACKER_RED_ZONE_BYTES: usize = 64 * 1024;

/// Timeout applied by the generation service when the request carries none.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Attempts made by a retrying resource loader before giving up.
pub const DEFAULT_LOADER_ATTEMPTS: u32 = 3;

/// Immutable snapshot of global configuration settings that can be shared
/// between crates.
///
/// # Examples
/// ```
/// use config::constants::GlobalConfig;
/// let config = GlobalConfig::default();
/// assert!(config.tolerance > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalConfig {
    /// Numeric tolerance propagated into geometry kernels.
    pub tolerance: f64,
    /// Segment count for base cylinders.
    pub default_segments: u32,
    /// Segment count for dots and other small round features.
    pub feature_segments: u32,
    /// Outward offset separating features from base faces.
    pub coplanar_offset: f64,
}

impl GlobalConfig {
    /// Builds a configuration enforcing strict validation of every field.
    ///
    /// Segment counts must be multiples of four (at least 4) so that circles
    /// reach their nominal extent on both axes.
    ///
    /// # Examples
    /// ```
    /// use config::constants::GlobalConfig;
    /// let cfg = GlobalConfig::new(1.0e-6, 24, 12, 0.02).expect("valid config");
    /// assert_eq!(cfg.default_segments, 24);
    /// ```
    pub fn new(
        tolerance: f64,
        default_segments: u32,
        feature_segments: u32,
        coplanar_offset: f64,
    ) -> Result<Self, ConfigError> {
        if tolerance <= 0.0 || !tolerance.is_finite() {
            return Err(ConfigError::InvalidTolerance(tolerance));
        }
        for segments in [default_segments, feature_segments] {
            if segments < 4 || segments % 4 != 0 {
                return Err(ConfigError::InvalidSegments(segments));
            }
        }
        if coplanar_offset <= tolerance || !coplanar_offset.is_finite() {
            return Err(ConfigError::InvalidOffset(coplanar_offset));
        }
        Ok(Self {
            tolerance,
            default_segments,
            feature_segments,
            coplanar_offset,
        })
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            tolerance: EPSILON_TOLERANCE,
            default_segments: DEFAULT_SEGMENTS,
            feature_segments: FEATURE_SEGMENTS,
            coplanar_offset: COPLANAR_OFFSET,
        }
    }
}

/// Error returned when invalid configuration values are provided.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Raised when tolerance is zero, negative or not finite.
    #[error("tolerance must be positive: {0}")]
    InvalidTolerance(f64),
    /// Raised when a segment count is not a positive multiple of four.
    #[error("segment count must be a multiple of 4 and >= 4: {0}")]
    InvalidSegments(u32),
    /// Raised when the coplanar offset does not exceed the tolerance.
    #[error("coplanar offset must exceed the tolerance: {0}")]
    InvalidOffset(f64),
}

#[cfg(test)]
mod tests;
