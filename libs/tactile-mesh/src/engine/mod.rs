//! # Generation Engine
//!
//! Drives one job over a [`CsgBackend`]:
//!
//! 1. build the base solid
//! 2. union the raised dots and add them
//! 3. union the recess dots and subtract them (every dot on a counter plate)
//! 4. union the markers and subtract them
//! 5. rotate cylinders into the export frame
//! 6. finalize the mesh
//!
//! A feature that cannot be built is skipped with a warning. A failed
//! boolean step fails the job.

mod features;

pub use features::{
    dot_solid, marker_solid, rectangle_cavity, site_for, triangle_cavity, MarkerSolid,
};

use crate::backend::CsgBackend;
use crate::base::build_base;
use crate::config::EngineConfig;
use crate::csg::BooleanOp;
use crate::error::EngineResult;
use crate::mesh::Mesh;
use crate::placement::up_axis_correction;
use crate::spec::{
    validate, BaseSpec, DotSpec, GeometrySpec, MarkerSpec, Polarity, ShapeKind, ValidatedSpec,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Counters reported with every successful job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Dots built and combined.
    pub dots_rendered: usize,
    /// Markers built and combined, fallbacks included.
    pub markers_rendered: usize,
    /// Character markers replaced by a rectangle.
    pub fallback_markers: usize,
    /// Features dropped by validation or construction.
    pub skipped_features: usize,
    /// Vertices in the output mesh.
    pub vertex_count: usize,
    /// Triangles in the output mesh.
    pub triangle_count: usize,
    /// Wall-clock time, filled in by the job runner.
    pub elapsed_ms: f64,
    /// Backend name.
    pub backend: String,
}

/// Output of [`Engine::generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    /// The finished part, export frame.
    pub mesh: Mesh,
    /// Job counters.
    pub stats: RenderStats,
}

/// Generation engine over one backend.
///
/// # Example
///
/// ```rust
/// use tactile_mesh::backend::MeshBackend;
/// use tactile_mesh::config::EngineConfig;
/// use tactile_mesh::engine::Engine;
/// use tactile_mesh::spec::GeometrySpec;
///
/// let spec = GeometrySpec::from_json(r#"{
///     "shape_kind": "flat", "polarity": "embossing",
///     "plate": {"width": 10, "height": 10, "thickness": 2, "center_z": 1}
/// }"#).unwrap();
/// let config = EngineConfig::default();
/// let engine = Engine::new(MeshBackend::new(&config), config).unwrap();
/// let generated = engine.generate(&spec).unwrap();
/// assert_eq!(generated.stats.triangle_count, 12);
/// ```
#[derive(Debug)]
pub struct Engine<B> {
    backend: B,
    config: EngineConfig,
}

impl<B: CsgBackend> Engine<B> {
    /// Creates an engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`](crate::error::EngineError::Config)
    /// for out-of-range configuration.
    pub fn new(backend: B, config: EngineConfig) -> EngineResult<Self> {
        Ok(Self {
            backend,
            config: config.validated()?,
        })
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The validated configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates and generates a specification.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Spec`](crate::error::EngineError::Spec) for a
    /// fatal validation problem, or the first failed boolean step.
    pub fn generate(&self, spec: &GeometrySpec) -> EngineResult<Generated> {
        let validated = validate(spec)?;
        self.generate_validated(&validated)
    }

    /// Generates an already validated specification.
    pub fn generate_validated(&self, spec: &ValidatedSpec) -> EngineResult<Generated> {
        let backend = &self.backend;
        let mut stats = RenderStats {
            skipped_features: spec.skipped,
            backend: backend.name().to_string(),
            ..RenderStats::default()
        };
        info!(
            backend = backend.name(),
            shape = spec.base.kind().as_str(),
            dots = spec.dots.len(),
            markers = spec.markers.len(),
            "generating"
        );

        let mut part = self.build_base(&spec.base)?;

        let mut raised = Vec::new();
        let mut sunk = Vec::new();
        for (index, dot) in &spec.dots {
            match self.build_dot(*index, dot, &spec.base, spec.polarity)? {
                Some(handle) if dot.is_recess_for(spec.polarity) => sunk.push((*index, handle)),
                Some(handle) => raised.push((*index, handle)),
                None => {
                    stats.skipped_features += 1;
                    continue;
                }
            }
            stats.dots_rendered += 1;
        }
        debug!(raised = raised.len(), sunk = sunk.len(), "dots built");
        if let Some(dots) = backend.union_batch(raised)? {
            part = backend.combine(part, dots, BooleanOp::Union)?;
        }
        if let Some(dots) = backend.union_batch(sunk)? {
            part = backend.combine(part, dots, BooleanOp::Subtract)?;
        }

        let mut markers = Vec::new();
        for (index, marker) in &spec.markers {
            match self.build_marker(*index, marker, &spec.base)? {
                Some((handle, fallback)) => {
                    stats.markers_rendered += 1;
                    stats.fallback_markers += usize::from(fallback);
                    markers.push((*index, handle));
                }
                None => stats.skipped_features += 1,
            }
        }
        if let Some(cavities) = backend.union_batch(markers)? {
            part = backend.combine(part, cavities, BooleanOp::Subtract)?;
        }

        if spec.base.kind() == ShapeKind::Cylindrical {
            part = backend.transform(part, &up_axis_correction())?;
        }
        let mesh = backend.finalize(part)?;

        stats.vertex_count = mesh.vertex_count();
        stats.triangle_count = mesh.triangle_count();
        info!(
            backend = backend.name(),
            triangles = stats.triangle_count,
            skipped = stats.skipped_features,
            "generated"
        );
        Ok(Generated { mesh, stats })
    }

    /// Builds the base solid.
    pub fn build_base(&self, base: &BaseSpec) -> EngineResult<B::Handle> {
        build_base(&self.backend, base, &self.config)
    }

    /// Builds one placed dot, or `None` when it has to be skipped.
    pub fn build_dot(
        &self,
        index: usize,
        dot: &DotSpec,
        base: &BaseSpec,
        polarity: Polarity,
    ) -> EngineResult<Option<B::Handle>> {
        let solid = site_for(&dot.position, base)
            .and_then(|site| dot_solid(dot, &site, polarity, &self.config));
        match solid {
            Ok(solid) => self.backend.import(solid).map(Some),
            Err(error) => {
                warn!(index, kind = dot.shape.name(), %error, "skipping dot");
                Ok(None)
            }
        }
    }

    /// Builds one placed marker cavity and its fallback flag, or `None`
    /// when it has to be skipped.
    pub fn build_marker(
        &self,
        index: usize,
        marker: &MarkerSpec,
        base: &BaseSpec,
    ) -> EngineResult<Option<(B::Handle, bool)>> {
        let solid = site_for(&marker.position, base)
            .and_then(|site| marker_solid(marker, &site, self.backend.font(), &self.config));
        match solid {
            Ok(MarkerSolid { solid, fallback }) => {
                if fallback {
                    warn!(
                        index,
                        character = marker.character.as_deref().unwrap_or_default(),
                        "unsupported character, using rectangle marker"
                    );
                }
                Ok(Some((self.backend.import(solid)?, fallback)))
            }
            Err(error) => {
                warn!(index, kind = marker.kind.name(), %error, "skipping marker");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests;
