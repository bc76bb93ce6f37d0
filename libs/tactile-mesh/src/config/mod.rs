//! Engine-level configuration building on the shared `config` crate.
//!
//! [`EngineConfig`] travels with each generation request (the `options`
//! object) and is validated once before any geometry is built.

use config::constants::{
    ConfigError, GlobalConfig, COPLANAR_OFFSET, DEFAULT_SEGMENTS, DEFAULT_TIMEOUT_MS,
    FEATURE_SEGMENTS, WELD_TOLERANCE,
};
use serde::{Deserialize, Serialize};

/// Per-job engine configuration.
///
/// Every field has a default, so `{}` is a valid `options` object.
///
/// # Examples
/// ```
/// use tactile_mesh::config::EngineConfig;
///
/// let cfg: EngineConfig = serde_json::from_str(r#"{"repair": true}"#).unwrap();
/// assert!(cfg.repair);
/// assert_eq!(cfg.default_segments, EngineConfig::default().default_segments);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Segments per ring for the base cylinder and bore.
    pub default_segments: u32,
    /// Segments per ring for dots.
    pub feature_segments: u32,
    /// Offset keeping feature faces off base faces.
    pub coplanar_offset: f64,
    /// Vertex weld distance used when extracting meshes.
    pub weld_tolerance: f64,
    /// Re-extract general backend results with T-junction resolution.
    pub repair: bool,
    /// Time budget for service jobs. Zero disables the timeout.
    pub timeout_ms: u64,
}

impl EngineConfig {
    /// Checks the numeric fields against the shared rules in
    /// [`GlobalConfig::new`].
    ///
    /// # Examples
    /// ```
    /// use tactile_mesh::config::EngineConfig;
    ///
    /// let cfg = EngineConfig { feature_segments: 10, ..EngineConfig::default() };
    /// assert!(cfg.validated().is_err());
    /// ```
    pub fn validated(self) -> Result<Self, ConfigError> {
        GlobalConfig::new(
            self.weld_tolerance,
            self.default_segments,
            self.feature_segments,
            self.coplanar_offset,
        )?;
        Ok(self)
    }

    /// The shared configuration view of this engine configuration.
    pub fn global(&self) -> GlobalConfig {
        GlobalConfig {
            tolerance: self.weld_tolerance,
            default_segments: self.default_segments,
            feature_segments: self.feature_segments,
            coplanar_offset: self.coplanar_offset,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_segments: DEFAULT_SEGMENTS,
            feature_segments: FEATURE_SEGMENTS,
            coplanar_offset: COPLANAR_OFFSET,
            weld_tolerance: WELD_TOLERANCE,
            repair: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}
