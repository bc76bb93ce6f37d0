//! General evaluator over indexed triangle meshes.

use super::{check_finite, CsgBackend};
use crate::config::EngineConfig;
use crate::csg::{BooleanOp, Solid};
use crate::error::EngineResult;
use crate::mesh::{extract, ExtractOptions, Mesh};
use crate::primitives::GlyphFont;
use glam::DMat4;
use rayon::prelude::*;
use tracing::debug;

/// Backend whose handles are plain meshes.
///
/// Every operation converts both meshes to polygons, runs the BSP boolean
/// and welds the result back into a mesh. By default the weld leaves
/// T-junctions and cracks in place. With [`EngineConfig::repair`] every
/// weld resolves T-junctions and seals cracks, and the final mesh is
/// re-extracted the same way, so the result is closed.
#[derive(Debug, Clone)]
pub struct MeshBackend {
    font: GlyphFont,
    repair: bool,
    weld_tolerance: f64,
}

impl MeshBackend {
    /// Creates a backend using the built-in glyph font.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_font(config, GlyphFont::builtin())
    }

    /// Creates a backend with an explicit glyph font.
    pub fn with_font(config: &EngineConfig, font: GlyphFont) -> Self {
        Self {
            font,
            repair: config.repair,
            weld_tolerance: config.weld_tolerance,
        }
    }

    fn weld(&self, solid: &Solid) -> Mesh {
        let options = if self.repair {
            ExtractOptions::closed(self.weld_tolerance)
        } else {
            ExtractOptions::weld_only(self.weld_tolerance)
        };
        extract(solid.polygons(), &options)
    }
}

impl CsgBackend for MeshBackend {
    type Handle = Mesh;

    fn name(&self) -> &'static str {
        "general"
    }

    fn font(&self) -> &GlyphFont {
        &self.font
    }

    fn import(&self, solid: Solid) -> EngineResult<Mesh> {
        Ok(self.weld(&solid))
    }

    fn combine(&self, a: Mesh, b: Mesh, op: BooleanOp) -> EngineResult<Mesh> {
        let result = check_finite(a.to_solid().apply(b.to_solid(), op), op)?;
        Ok(self.weld(&result))
    }

    fn transform(&self, mut handle: Mesh, matrix: &DMat4) -> EngineResult<Mesh> {
        handle.transform(matrix);
        Ok(handle)
    }

    fn finalize(&self, handle: Mesh) -> EngineResult<Mesh> {
        if self.repair {
            debug!(triangles = handle.triangle_count(), "repairing general result");
            Ok(self.weld(&handle.to_solid()))
        } else {
            Ok(handle)
        }
    }

    /// Runs each reduction level in parallel.
    fn union_batch(&self, handles: Vec<(usize, Mesh)>) -> EngineResult<Option<Mesh>> {
        let mut level = handles;
        while level.len() > 1 {
            debug!(backend = self.name(), size = level.len(), "parallel union level");
            let mut pairs = Vec::with_capacity(level.len().div_ceil(2));
            let mut iter = level.into_iter();
            while let Some(a) = iter.next() {
                pairs.push((a, iter.next()));
            }
            level = pairs
                .into_par_iter()
                .map(|((index, a), b)| match b {
                    Some((_, b)) => self
                        .combine(a, b, BooleanOp::Union)
                        .map(|mesh| (index, mesh))
                        .map_err(|e| e.at_feature(index)),
                    None => Ok((index, a)),
                })
                .collect::<EngineResult<Vec<_>>>()?;
        }
        Ok(level.pop().map(|(_, mesh)| mesh))
    }
}
