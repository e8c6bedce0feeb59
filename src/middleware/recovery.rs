//! Panic recovery.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use http::StatusCode;
use tracing::error;

use super::Middleware;
use crate::context::Context;
use crate::handler::{BoxFuture, BoxedHandler, Handler};

/// Converts a panic in the inner chain into a fixed response.
///
/// The panic stops at this layer: the buffered response is overwritten with
/// `status` and `body`, the panic message is logged, and the outer layers
/// and the flush step run as usual.
#[derive(Clone)]
pub struct Recovery {
    status: StatusCode,
    body: Arc<[u8]>,
}

impl Recovery {
    pub fn new() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: Arc::from(&b"Internal Server Error"[..]),
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn body(mut self, body: impl AsRef<[u8]>) -> Self {
        self.body = Arc::from(body.as_ref());
        self
    }
}

impl Default for Recovery {
    fn default() -> Self { Self::new() }
}

impl Middleware for Recovery {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(RecoveryStage { config: self.clone(), next })
    }
}

struct RecoveryStage {
    config: Recovery,
    next: BoxedHandler,
}

impl Handler for RecoveryStage {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
        Box::pin(async move {
            let outcome = AssertUnwindSafe(self.next.call(ctx)).catch_unwind().await;
            if let Err(panic) = outcome {
                error!(
                    method = %ctx.method(),
                    path = %ctx.path(),
                    route = ctx.matched_route().unwrap_or_default(),
                    "handler panicked: {}",
                    panic_message(&*panic)
                );
                ctx.set_status(self.config.status);
                ctx.set_body(self.config.body.to_vec());
            }
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}
