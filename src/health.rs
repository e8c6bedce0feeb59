//! Built-in Kubernetes health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! They are ordinary handlers and register like any other:
//!
//! ```rust
//! use arbor::{Router, health};
//!
//! let app = Router::new()
//!     .get("/healthz", health::liveness)
//!     .get("/readyz", health::readiness);
//! ```

use http::StatusCode;

use crate::context::Context;
use crate::handler::BoxFuture;

/// Always `200 OK` with body `"ok"`. No dependencies on purpose: if the
/// process can answer HTTP at all, it is alive.
pub fn liveness(ctx: &mut Context) -> BoxFuture<'_> {
    Box::pin(async move { ctx.text(StatusCode::OK, "ok") })
}

/// `200 OK` with body `"ready"`. Replace it with your own handler to gate on
/// dependency health.
pub fn readiness(ctx: &mut Context) -> BoxFuture<'_> {
    Box::pin(async move { ctx.text(StatusCode::OK, "ready") })
}
