//! # Guaranteed-Manifold Backend
//!
//! Intermediates live in a per-job [`SlotMap`] arena and are reached through
//! [`ScopedSolid`] guards that free their slot when dropped. Skipped
//! features, `?` early returns and panics all release through the same
//! path, and [`ManifoldBackend::live_count`] exposes leaks.
//!
//! The backend can only be created from a [`ManifoldRuntime`] whose
//! resources have been loaded with [`ManifoldRuntime::initialize`].

use super::{check_finite, CsgBackend};
use crate::config::EngineConfig;
use crate::csg::{BooleanOp, Solid};
use crate::error::{EngineError, EngineResult, LoaderError};
use crate::mesh::{extract, ExtractOptions, Mesh};
use crate::primitives::{GlyphFont, GLYPH_FONT_RESOURCE};
use config::constants::DEFAULT_LOADER_ATTEMPTS;
use glam::DMat4;
use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

// =============================================================================
// RESOURCE LOADING
// =============================================================================

/// Source of runtime resources.
pub trait ResourceLoader {
    /// Fetches the bytes of the named resource.
    fn load(&self, name: &str) -> Result<Vec<u8>, LoaderError>;
}

/// Serves resources compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedLoader;

impl ResourceLoader for EmbeddedLoader {
    fn load(&self, name: &str) -> Result<Vec<u8>, LoaderError> {
        match name {
            GLYPH_FONT_RESOURCE => Ok(GlyphFont::builtin().to_bytes()),
            other => Err(LoaderError::NotFound(other.to_string())),
        }
    }
}

/// Retries [`LoaderError::Unavailable`] failures of another loader.
///
/// Other errors are returned immediately.
///
/// ```rust
/// use tactile_mesh::backend::{EmbeddedLoader, ResourceLoader, RetryLoader};
///
/// let loader = RetryLoader::new(EmbeddedLoader, 3);
/// assert!(loader.load("glyph-font-5x7").is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct RetryLoader<L> {
    inner: L,
    attempts: u32,
}

impl<L: ResourceLoader> RetryLoader<L> {
    /// Wraps `inner`, trying at most `attempts` times (at least once).
    pub fn new(inner: L, attempts: u32) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
        }
    }

    /// Wraps `inner` with the default attempt count.
    pub fn with_default_attempts(inner: L) -> Self {
        Self::new(inner, DEFAULT_LOADER_ATTEMPTS)
    }

    /// The wrapped loader.
    pub fn inner(&self) -> &L {
        &self.inner
    }
}

impl<L: ResourceLoader> ResourceLoader for RetryLoader<L> {
    fn load(&self, name: &str) -> Result<Vec<u8>, LoaderError> {
        let mut attempt = 1;
        loop {
            match self.inner.load(name) {
                Err(error @ LoaderError::Unavailable { .. }) if attempt < self.attempts => {
                    warn!(resource = name, attempt, %error, "resource load failed, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

// =============================================================================
// RUNTIME
// =============================================================================

/// Host-session state of the manifold backend.
///
/// Construct once, call [`initialize`](Self::initialize) before the first
/// manifold job and pass the runtime explicitly to every job.
#[derive(Debug, Clone, Default)]
pub struct ManifoldRuntime {
    font: Option<GlyphFont>,
}

impl ManifoldRuntime {
    /// Creates an uninitialised runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the runtime's resources. Calling it again on a ready runtime
    /// does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Loader`] when a resource cannot be fetched or
    /// decoded. The runtime stays not ready.
    pub fn initialize(&mut self, loader: &dyn ResourceLoader) -> EngineResult<()> {
        if self.is_ready() {
            return Ok(());
        }
        let bytes = loader.load(GLYPH_FONT_RESOURCE)?;
        let font = GlyphFont::from_bytes(&bytes)?;
        info!(glyphs = font.len(), "manifold runtime ready");
        self.font = Some(font);
        Ok(())
    }

    /// Returns `true` once [`initialize`](Self::initialize) has succeeded.
    pub fn is_ready(&self) -> bool {
        self.font.is_some()
    }

    /// Releases loaded resources. The runtime can be initialised again.
    pub fn dispose(&mut self) {
        if self.font.take().is_some() {
            debug!("manifold runtime disposed");
        }
    }

    /// The loaded glyph font.
    pub fn font(&self) -> Option<&GlyphFont> {
        self.font.as_ref()
    }
}

// =============================================================================
// ARENA
// =============================================================================

new_key_type! {
    /// Key of a solid in a job arena.
    pub struct SolidKey;
}

type Arena = Rc<RefCell<SlotMap<SolidKey, Solid>>>;

/// Owning guard for one arena slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct ScopedSolid {
    key: SolidKey,
    arena: Arena,
}

impl ScopedSolid {
    /// Arena key of the guarded solid.
    pub fn key(&self) -> SolidKey {
        self.key
    }

    fn take(&self) -> EngineResult<Solid> {
        self.arena
            .try_borrow_mut()
            .ok()
            .and_then(|mut arena| arena.remove(self.key))
            .ok_or(EngineError::StaleHandle)
    }
}

impl Drop for ScopedSolid {
    fn drop(&mut self) {
        if let Ok(mut arena) = self.arena.try_borrow_mut() {
            arena.remove(self.key);
        }
    }
}

// =============================================================================
// BACKEND
// =============================================================================

/// Backend whose handles are arena-held polygon solids.
///
/// Every boolean result is extracted closed (T-junctions resolved, cracks
/// sealed), checked for open edges and stored back as the triangles of that
/// closed mesh, so no intermediate is ever non-manifold. [`finalize`]
/// extracts and checks once more.
///
/// [`finalize`]: CsgBackend::finalize
#[derive(Debug)]
pub struct ManifoldBackend<'rt> {
    font: &'rt GlyphFont,
    arena: Arena,
    weld_tolerance: f64,
}

impl<'rt> ManifoldBackend<'rt> {
    /// Creates a backend with an empty arena.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotReady`] when the runtime has not been
    /// initialised.
    pub fn new(runtime: &'rt ManifoldRuntime, config: &EngineConfig) -> EngineResult<Self> {
        let font = runtime.font().ok_or(EngineError::NotReady("manifold"))?;
        Ok(Self {
            font,
            arena: Rc::new(RefCell::new(SlotMap::with_key())),
            weld_tolerance: config.weld_tolerance,
        })
    }

    /// Number of solids currently held in the arena.
    pub fn live_count(&self) -> usize {
        self.arena.borrow().len()
    }

    fn store(&self, solid: Solid) -> EngineResult<ScopedSolid> {
        let key = self
            .arena
            .try_borrow_mut()
            .map_err(|_| EngineError::StaleHandle)?
            .insert(solid);
        Ok(ScopedSolid {
            key,
            arena: Rc::clone(&self.arena),
        })
    }

    /// Extracts `solid` as a closed mesh, failing when edges stay open.
    fn closed_mesh(&self, solid: &Solid, op: Option<BooleanOp>) -> EngineResult<Mesh> {
        let mesh = extract(solid.polygons(), &ExtractOptions::closed(self.weld_tolerance));
        match mesh.open_edge_count() {
            0 => Ok(mesh),
            open_edges => {
                warn!(op = ?op, open_edges, "result is not manifold");
                Err(EngineError::NonManifold { open_edges })
            }
        }
    }

    fn owns(&self, handle: &ScopedSolid) -> EngineResult<()> {
        if Rc::ptr_eq(&self.arena, &handle.arena) {
            Ok(())
        } else {
            Err(EngineError::StaleHandle)
        }
    }
}

impl CsgBackend for ManifoldBackend<'_> {
    type Handle = ScopedSolid;

    fn name(&self) -> &'static str {
        "manifold"
    }

    fn font(&self) -> &GlyphFont {
        self.font
    }

    fn import(&self, solid: Solid) -> EngineResult<ScopedSolid> {
        self.store(solid)
    }

    fn combine(&self, a: ScopedSolid, b: ScopedSolid, op: BooleanOp) -> EngineResult<ScopedSolid> {
        self.owns(&a)?;
        self.owns(&b)?;
        let result = check_finite(a.take()?.apply(b.take()?, op), op)?;
        let mesh = self.closed_mesh(&result, Some(op))?;
        self.store(mesh.to_solid())
    }

    fn transform(&self, handle: ScopedSolid, matrix: &DMat4) -> EngineResult<ScopedSolid> {
        self.owns(&handle)?;
        let solid = handle.take()?.transform(matrix);
        self.store(solid)
    }

    fn finalize(&self, handle: ScopedSolid) -> EngineResult<Mesh> {
        self.owns(&handle)?;
        self.closed_mesh(&handle.take()?, None)
    }
}
