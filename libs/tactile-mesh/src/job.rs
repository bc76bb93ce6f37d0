//! # Generation Jobs
//!
//! The host-facing request/response boundary. [`run_job`] executes one
//! request synchronously and never fails: every error becomes a
//! [`GenerationResponse::Failure`]. With the `service` feature,
//! [`GenerationService`] runs jobs on tokio's blocking pool under a
//! timeout.

use crate::backend::{ManifoldBackend, ManifoldRuntime, MeshBackend};
use crate::config::EngineConfig;
use crate::engine::{Engine, Generated, RenderStats};
use crate::error::EngineResult;
use crate::export::to_binary_stl;
use crate::spec::GeometrySpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Which backend evaluates a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// [`MeshBackend`].
    #[default]
    General,
    /// [`ManifoldBackend`].
    Manifold,
}

impl BackendKind {
    /// Parses a backend name as sent by hosts.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "general" => Some(Self::General),
            "manifold" => Some(Self::Manifold),
            _ => None,
        }
    }

    /// Backend name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Manifold => "manifold",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Caller-chosen id echoed in the response.
    pub request_id: String,
    /// What to build.
    pub spec: GeometrySpec,
    /// Evaluator to use.
    #[serde(default)]
    pub backend: BackendKind,
    /// Engine options.
    #[serde(default)]
    pub options: EngineConfig,
}

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationResponse {
    /// The part was built.
    Success {
        /// Id from the request.
        request_id: String,
        /// Binary STL.
        stl: Vec<u8>,
        /// Job counters.
        stats: RenderStats,
    },
    /// The job failed as a whole.
    Failure {
        /// Id from the request.
        request_id: String,
        /// Human-readable cause.
        message: String,
        /// Backend that was asked for.
        backend: BackendKind,
    },
}

impl GenerationResponse {
    /// Id of the request this answers.
    pub fn request_id(&self) -> &str {
        match self {
            Self::Success { request_id, .. } | Self::Failure { request_id, .. } => request_id,
        }
    }

    /// Returns `true` for [`GenerationResponse::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    fn failure(request: &GenerationRequest, message: impl Into<String>) -> Self {
        Self::Failure {
            request_id: request.request_id.clone(),
            message: message.into(),
            backend: request.backend,
        }
    }
}

/// Runs `spec` on the chosen backend and returns the mesh and counters.
///
/// `elapsed_ms` is left at zero.
///
/// # Errors
///
/// Any fatal [`EngineError`](crate::error::EngineError), including
/// [`NotReady`](crate::error::EngineError::NotReady) when the manifold
/// backend is asked for before `runtime` is initialised.
pub fn generate(
    spec: &GeometrySpec,
    backend: BackendKind,
    options: EngineConfig,
    runtime: &ManifoldRuntime,
) -> EngineResult<Generated> {
    match backend {
        BackendKind::General => Engine::new(MeshBackend::new(&options), options)?.generate(spec),
        BackendKind::Manifold => {
            Engine::new(ManifoldBackend::new(runtime, &options)?, options)?.generate(spec)
        }
    }
}

/// Runs a request, timing it with `now_ms` (milliseconds from any fixed
/// origin).
pub fn run_job_with_clock(
    request: &GenerationRequest,
    runtime: &ManifoldRuntime,
    now_ms: impl Fn() -> f64,
) -> GenerationResponse {
    let started = now_ms();
    info!(request_id = %request.request_id, backend = %request.backend, "job started");
    let outcome = generate(&request.spec, request.backend, request.options, runtime)
        .and_then(|generated| Ok((to_binary_stl(&generated.mesh)?, generated.stats)));
    match outcome {
        Ok((stl, mut stats)) => {
            stats.elapsed_ms = (now_ms() - started).max(0.0);
            info!(
                request_id = %request.request_id,
                bytes = stl.len(),
                elapsed_ms = stats.elapsed_ms,
                "job finished"
            );
            GenerationResponse::Success {
                request_id: request.request_id.clone(),
                stl,
                stats,
            }
        }
        Err(error) => {
            warn!(request_id = %request.request_id, %error, "job failed");
            GenerationResponse::failure(request, error.to_string())
        }
    }
}

/// Runs a request, timed with the monotonic system clock.
#[cfg(not(target_arch = "wasm32"))]
pub fn run_job(request: &GenerationRequest, runtime: &ManifoldRuntime) -> GenerationResponse {
    let origin = std::time::Instant::now();
    run_job_with_clock(request, runtime, || origin.elapsed().as_secs_f64() * 1000.0)
}

#[cfg(feature = "service")]
pub use service::GenerationService;

#[cfg(feature = "service")]
mod service {
    use super::{run_job, GenerationRequest, GenerationResponse};
    use crate::backend::{ManifoldRuntime, ResourceLoader};
    use crate::error::{EngineError, EngineResult};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::RwLock;
    use tracing::warn;

    /// Runs jobs off the calling task with a per-request timeout.
    ///
    /// The manifold runtime is shared by all jobs of the service. Each job
    /// runs on a snapshot taken when it starts, so no lock outlives the
    /// call that started it, including a job that timed out.
    #[derive(Debug, Clone, Default)]
    pub struct GenerationService {
        runtime: Arc<RwLock<ManifoldRuntime>>,
    }

    impl GenerationService {
        /// Creates a service with an uninitialised runtime.
        pub fn new() -> Self {
            Self::default()
        }

        /// Initialises the manifold runtime.
        pub async fn initialize(&self, loader: &(dyn ResourceLoader + Sync)) -> EngineResult<()> {
            self.runtime.write().await.initialize(loader)
        }

        /// Returns `true` once the manifold runtime is ready.
        pub async fn is_ready(&self) -> bool {
            self.runtime.read().await.is_ready()
        }

        /// Releases the manifold runtime's resources.
        pub async fn dispose(&self) {
            self.runtime.write().await.dispose();
        }

        /// Runs one request on the blocking pool.
        ///
        /// When `options.timeout_ms` is non-zero and elapses first, the
        /// job's eventual result is discarded and a failure is returned.
        pub async fn generate(&self, request: GenerationRequest) -> GenerationResponse {
            let timeout_ms = request.options.timeout_ms;
            let request_id = request.request_id.clone();
            let backend = request.backend;
            let runtime = self.runtime.read().await.clone();
            let task = tokio::task::spawn_blocking(move || run_job(&request, &runtime));

            let joined = if timeout_ms > 0 {
                match tokio::time::timeout(Duration::from_millis(timeout_ms), task).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        let error = EngineError::Timeout(timeout_ms);
                        warn!(request_id = %request_id, %error, "job abandoned");
                        return GenerationResponse::Failure {
                            request_id,
                            message: error.to_string(),
                            backend,
                        };
                    }
                }
            } else {
                task.await
            };

            joined.unwrap_or_else(|error| GenerationResponse::Failure {
                request_id,
                message: format!("generation worker failed: {error}"),
                backend,
            })
        }
    }
}
