//! # Tactile Mesh
//!
//! Builds watertight meshes of tactile parts: braille dots and orientation
//! markers on a flat plate or a cylindrical shell, combined with CSG and
//! exported as binary STL.
//!
//! ## Pipeline
//!
//! ```text
//! GeometrySpec (JSON)
//!       ↓ spec::validate
//! ValidatedSpec
//!       ↓ base + primitives + placement
//! placed solids
//!       ↓ engine::Engine<CsgBackend> (batched union, add, subtract)
//! Mesh
//!       ↓ export::to_binary_stl
//! STL bytes
//! ```
//!
//! ## Example
//!
//! ```rust
//! use tactile_mesh::backend::ManifoldRuntime;
//! use tactile_mesh::job::{run_job, BackendKind, GenerationRequest};
//! use tactile_mesh::spec::GeometrySpec;
//!
//! let spec = GeometrySpec::from_json(r#"{
//!     "shape_kind": "flat", "polarity": "embossing",
//!     "plate": {"width": 20, "height": 10, "thickness": 2, "center_z": 1},
//!     "dots": [{"position": {"x": 0, "y": 0, "z": 2}, "shape": "standard",
//!               "base_radius": 0.8, "top_radius": 0.4, "height": 0.5}]
//! }"#).unwrap();
//! let request = GenerationRequest {
//!     request_id: "demo".into(),
//!     spec,
//!     backend: BackendKind::General,
//!     options: Default::default(),
//! };
//! let response = run_job(&request, &ManifoldRuntime::new());
//! assert!(response.is_success());
//! ```

pub mod backend;
pub mod base;
pub mod config;
pub mod csg;
pub mod engine;
pub mod error;
pub mod export;
pub mod job;
pub mod mesh;
pub mod placement;
pub mod primitives;
pub mod spec;

pub use backend::{CsgBackend, ManifoldBackend, ManifoldRuntime, MeshBackend};
pub use config::EngineConfig;
pub use engine::{Engine, Generated, RenderStats};
pub use error::{EngineError, EngineResult, FeatureError, LoaderError, SpecError};
pub use export::to_binary_stl;
pub use job::{BackendKind, GenerationRequest, GenerationResponse};
pub use mesh::Mesh;
pub use spec::GeometrySpec;
