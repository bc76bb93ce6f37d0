//! # Config Crate
//!
//! Centralized configuration constants for the tactile mesh pipeline.
//! Tolerances, tessellation counts and the small offsets used to keep boolean
//! operands off each other's planes are defined here so that every crate in
//! the workspace agrees on them.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{GlobalConfig, COPLANAR_OFFSET, DEFAULT_SEGMENTS};
//!
//! let cfg = GlobalConfig::default();
//! assert_eq!(cfg.default_segments, DEFAULT_SEGMENTS);
//! assert!(COPLANAR_OFFSET > cfg.tolerance);
//! ```

pub mod constants;
