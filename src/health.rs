//! Built-in Kubernetes health-check handlers.
//!
//! Kubernetes asks two questions. tatami answers them.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! Register them on your router:
//!
//! ```rust,no_run
//! use tatami::{Router, handler_fn, health};
//!
//! # fn main() -> Result<(), tatami::Error> {
//! let router = Router::new()
//!     .get("/healthz", handler_fn(health::liveness))?
//!     .get("/readyz", handler_fn(health::readiness))?;
//! # Ok(())
//! # }
//! ```
//!
//! Replace `readiness` with your own handler if the pod must verify
//! dependency availability (database connections, downstream services)
//! before accepting traffic.

use crate::context::Context;
use crate::request::Request;
use crate::response::ResponseWriter;

/// Kubernetes liveness probe handler.
///
/// Always answers `200 {"status":"ok"}`. If the process can respond to HTTP
/// at all, it is alive — this handler intentionally has no dependencies.
pub async fn liveness(_ctx: &mut Context, w: &mut ResponseWriter, _req: &mut Request) {
    w.write_json(&serde_json::json!({ "status": "ok" }));
}

/// Kubernetes readiness probe handler (default implementation).
///
/// Answers `200 {"status":"ready"}`.
pub async fn readiness(_ctx: &mut Context, w: &mut ResponseWriter, _req: &mut Request) {
    w.write_json(&serde_json::json!({ "status": "ready" }));
}
