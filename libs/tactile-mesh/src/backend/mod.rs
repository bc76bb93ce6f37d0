//! # Boolean Evaluation Backends
//!
//! The engine is written once over [`CsgBackend`]. Two implementations
//! exist:
//!
//! | Backend | Handle | Guarantee |
//! |---------|--------|-----------|
//! | [`MeshBackend`] | owned [`Mesh`] | fast, parallel batches, may leave T-junctions unless `repair` is set |
//! | [`ManifoldBackend`] | [`ScopedSolid`] arena key | result verified watertight, needs an initialised [`ManifoldRuntime`] |
//!
//! Handles are consumed by every operation. A job never mixes backends.

mod manifold;
mod mesh_backend;

pub use manifold::{
    EmbeddedLoader, ManifoldBackend, ManifoldRuntime, ResourceLoader, RetryLoader, ScopedSolid,
    SolidKey,
};
pub use mesh_backend::MeshBackend;

use crate::csg::{BooleanOp, Solid};
use crate::error::EngineResult;
use crate::mesh::Mesh;
use crate::primitives::GlyphFont;
use glam::DMat4;
use tracing::debug;

/// A boolean evaluator the engine can drive.
pub trait CsgBackend {
    /// Opaque intermediate result.
    type Handle;

    /// Name reported in statistics and failures.
    fn name(&self) -> &'static str;

    /// Glyph table used for character markers.
    fn font(&self) -> &GlyphFont;

    /// Takes ownership of a freshly built solid.
    fn import(&self, solid: Solid) -> EngineResult<Self::Handle>;

    /// Combines two handles. `a` is the first operand of `op`.
    fn combine(&self, a: Self::Handle, b: Self::Handle, op: BooleanOp)
        -> EngineResult<Self::Handle>;

    /// Applies an affine transform.
    fn transform(&self, handle: Self::Handle, matrix: &DMat4) -> EngineResult<Self::Handle>;

    /// Produces the output mesh.
    fn finalize(&self, handle: Self::Handle) -> EngineResult<Mesh>;

    /// Unions tagged handles by pairwise tree reduction.
    ///
    /// Each entry carries the index of the feature it came from; a failed
    /// union reports the index of its first operand. Returns `None` for an
    /// empty batch.
    fn union_batch(
        &self,
        handles: Vec<(usize, Self::Handle)>,
    ) -> EngineResult<Option<Self::Handle>> {
        let mut level = handles;
        while level.len() > 1 {
            debug!(backend = self.name(), size = level.len(), "union level");
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            let mut iter = level.into_iter();
            while let Some((index, a)) = iter.next() {
                next.push(match iter.next() {
                    Some((_, b)) => (
                        index,
                        self.combine(a, b, BooleanOp::Union)
                            .map_err(|e| e.at_feature(index))?,
                    ),
                    None => (index, a),
                });
            }
            level = next;
        }
        Ok(level.pop().map(|(_, handle)| handle))
    }
}

/// Fails a boolean step whose result carries NaN or infinite vertices.
pub(crate) fn check_finite(solid: Solid, op: BooleanOp) -> EngineResult<Solid> {
    if solid.is_finite() {
        Ok(solid)
    } else {
        Err(crate::error::EngineError::boolean(
            op,
            None,
            "result has non-finite vertices",
        ))
    }
}
