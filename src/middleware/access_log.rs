//! Per-request access records.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use http::StatusCode;
use serde::Serialize;
use tracing::{error, info};

use super::Middleware;
use crate::context::Context;
use crate::handler::{BoxFuture, BoxedHandler, Handler};

type Sink = Arc<dyn Fn(&str) + Send + Sync>;

/// One served request.
#[derive(Debug, Serialize)]
pub struct AccessRecord {
    pub host: String,
    /// The registered route, empty when nothing matched.
    pub route: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub elapsed_ms: u64,
}

/// Records every request after the inner chain has produced its response.
///
/// The matched route is only known once routing ran, so the record is taken
/// on the way out. A panic in the inner chain is still recorded, with status
/// `500`, and then resumed.
///
/// By default records go to `tracing` at `info` level under the
/// `arbor::access` target. [`AccessLog::sink`] redirects them, serialised as
/// JSON, to any function.
#[derive(Clone, Default)]
pub struct AccessLog {
    sink: Option<Sink>,
}

impl AccessLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }
}

impl Middleware for AccessLog {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(AccessLogStage { sink: self.sink.clone(), next })
    }
}

struct AccessLogStage {
    sink: Option<Sink>,
    next: BoxedHandler,
}

impl Handler for AccessLogStage {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
        Box::pin(async move {
            let started = Instant::now();
            let outcome = AssertUnwindSafe(self.next.call(ctx)).catch_unwind().await;

            let status = match outcome {
                Ok(()) => ctx.outgoing_status(),
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let record = AccessRecord {
                host: ctx.host().unwrap_or_default().to_owned(),
                route: ctx.matched_route().unwrap_or_default().to_owned(),
                method: ctx.method().to_string(),
                path: ctx.path().to_owned(),
                status: status.as_u16(),
                elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            };

            match &self.sink {
                Some(sink) => match serde_json::to_string(&record) {
                    Ok(line) => sink(&line),
                    Err(e) => error!("access record serialisation failed: {e}"),
                },
                None => info!(
                    target: "arbor::access",
                    host = %record.host,
                    route = %record.route,
                    method = %record.method,
                    path = %record.path,
                    status = record.status,
                    elapsed_ms = record.elapsed_ms,
                    "request served"
                ),
            }

            if let Err(payload) = outcome {
                panic::resume_unwind(payload);
            }
        })
    }
}
