//! WASM-facing entry points for tactile mesh generation.
//!
//! This crate is compiled to a `cdylib` and consumed from JavaScript via
//! `wasm-bindgen`. Native tests call `generate_internal`, which takes the
//! runtime and clock explicitly instead of the thread-local runtime and
//! `Date.now()`.
//!
//! ```
//! use tactile_mesh::backend::ManifoldRuntime;
//!
//! let request = r#"{"request_id": "r1", "spec": {
//!     "shape_kind": "flat", "polarity": "embossing",
//!     "plate": {"width": 10, "height": 10, "thickness": 1}}}"#;
//! let handle = tactile_wasm::generate_internal(request, &ManifoldRuntime::new(), || 0.0).unwrap();
//! assert_eq!(handle.triangle_count(), 12);
//! ```

use config::constants::DEFAULT_SEGMENTS;
use std::cell::RefCell;
use tactile_mesh::backend::{EmbeddedLoader, ManifoldRuntime, RetryLoader};
use tactile_mesh::job::{run_job_with_clock, BackendKind, GenerationRequest, GenerationResponse};
use tactile_mesh::RenderStats;
use wasm_bindgen::prelude::*;

thread_local! {
    static RUNTIME: RefCell<ManifoldRuntime> = RefCell::new(ManifoldRuntime::new());
}

/// Installs a panic hook that forwards Rust panics to the browser console.
///
/// # Examples
/// ```no_run
/// // In JavaScript: import and call once at startup.
/// // import { init_panic_hook } from "tactile-wasm";
/// // init_panic_hook();
/// ```
#[cfg(feature = "console_error_panic_hook")]
#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Returns the default segment count for base outlines.
///
/// # Examples
/// ```
/// assert!(tactile_wasm::default_segments() >= 3);
/// ```
#[wasm_bindgen]
pub fn default_segments() -> u32 {
    DEFAULT_SEGMENTS
}

/// Loads the resources the `manifold` backend needs. Safe to call again.
///
/// # Errors
/// Returns a JavaScript error when a resource cannot be loaded.
#[wasm_bindgen]
pub fn initialize_runtime() -> Result<(), JsValue> {
    RUNTIME.with(|runtime| {
        let mut runtime = runtime
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("runtime is busy"))?;
        initialize_runtime_internal(&mut runtime).map_err(|message| JsValue::from_str(&message))
    })
}

/// Returns `true` once [`initialize_runtime`] has succeeded.
#[wasm_bindgen]
pub fn runtime_ready() -> bool {
    RUNTIME.with(|runtime| runtime.try_borrow().map(|r| r.is_ready()).unwrap_or(false))
}

/// Releases the runtime's resources.
#[wasm_bindgen]
pub fn dispose_runtime() {
    RUNTIME.with(|runtime| {
        if let Ok(mut runtime) = runtime.try_borrow_mut() {
            runtime.dispose();
        }
    });
}

/// Initialises `runtime` from the embedded resources, retrying transient
/// failures.
pub fn initialize_runtime_internal(runtime: &mut ManifoldRuntime) -> Result<(), String> {
    runtime
        .initialize(&RetryLoader::with_default_attempts(EmbeddedLoader))
        .map_err(|err| err.to_string())
}

/// A finished part.
///
/// # Examples
/// ```no_run
/// // In JavaScript:
/// // const part = generate_stl(JSON.stringify(request));
/// // const blob = new Blob([part.stl()], { type: "model/stl" });
/// // console.log(JSON.parse(part.stats_json()).elapsed_ms);
/// ```
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct StlHandle {
    request_id: String,
    stl: Vec<u8>,
    stats: RenderStats,
}

#[wasm_bindgen]
impl StlHandle {
    /// Id echoed from the request.
    pub fn request_id(&self) -> String {
        self.request_id.clone()
    }

    /// Binary STL as a Uint8Array.
    pub fn stl(&self) -> Vec<u8> {
        self.stl.clone()
    }

    /// Number of triangles in the STL.
    pub fn triangle_count(&self) -> u32 {
        u32::try_from(self.stats.triangle_count).unwrap_or(u32::MAX)
    }

    /// Job counters as JSON.
    pub fn stats_json(&self) -> String {
        serde_json::to_string(&self.stats).unwrap_or_default()
    }
}

impl StlHandle {
    /// Job counters.
    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }
}

/// Builds the part described by a JSON `GenerationRequest`.
///
/// # Errors
/// Throws the `GenerationResponse` failure object, with `status`,
/// `request_id`, `message` and `backend` fields, when the request is
/// malformed or the job fails.
///
/// # Examples
/// ```no_run
/// // In JavaScript:
/// // initialize_runtime();
/// // try {
/// //   const part = generate_stl(JSON.stringify({
/// //     request_id: "r1", backend: "manifold", spec,
/// //   }));
/// // } catch (failure) {
/// //   console.error(`${failure.request_id} failed:`, failure.message);
/// // }
/// ```
#[wasm_bindgen]
pub fn generate_stl(request_json: &str) -> Result<StlHandle, JsValue> {
    RUNTIME.with(|runtime| {
        let runtime = runtime
            .try_borrow()
            .map_err(|_| JsValue::from_str("runtime is busy"))?;
        generate_internal(request_json, &runtime, js_sys::Date::now)
            .map_err(|failure| failure_value(&failure))
    })
}

/// Converts a failure response into a plain JavaScript object.
fn failure_value(failure: &GenerationResponse) -> JsValue {
    match serde_json::to_string(failure) {
        Ok(json) => js_sys::JSON::parse(&json).unwrap_or_else(|_| JsValue::from_str(&json)),
        Err(err) => JsValue::from_str(&err.to_string()),
    }
}

/// Failure for a request that does not parse. The id and backend are taken
/// from the raw JSON when present.
fn invalid_request(request_json: &str, err: &serde_json::Error) -> GenerationResponse {
    let raw: serde_json::Value = serde_json::from_str(request_json).unwrap_or_default();
    GenerationResponse::Failure {
        request_id: raw["request_id"].as_str().unwrap_or_default().to_string(),
        message: format!("invalid request: {err}"),
        backend: raw["backend"]
            .as_str()
            .and_then(BackendKind::parse)
            .unwrap_or_default(),
    }
}

/// Internal implementation of `generate_stl`.
///
/// `now_ms` supplies wall-clock milliseconds for the elapsed time. Errors
/// are always [`GenerationResponse::Failure`].
pub fn generate_internal(
    request_json: &str,
    runtime: &ManifoldRuntime,
    now_ms: impl Fn() -> f64,
) -> Result<StlHandle, GenerationResponse> {
    let request: GenerationRequest =
        serde_json::from_str(request_json).map_err(|err| invalid_request(request_json, &err))?;
    match run_job_with_clock(&request, runtime, now_ms) {
        GenerationResponse::Success {
            request_id,
            stl,
            stats,
        } => Ok(StlHandle {
            request_id,
            stl,
            stats,
        }),
        failure @ GenerationResponse::Failure { .. } => Err(failure),
    }
}
