//! Request dispatch: resolve, invoke, flush.
//!
//! The chain a request travels through, outermost first:
//!
//! ```text
//! Flush → middleware[0] → … → middleware[n-1] → Resolve → handler
//! ```
//!
//! `Resolve` looks the route up and calls the bound handler, or buffers a
//! `404 NOT FOUND`. `Flush` runs after everything inside it has returned,
//! however early a middleware decided to stop, and freezes the buffered
//! response exactly once.

use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use tracing::{debug, error};

use crate::context::Context;
use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::middleware::{self, Middleware};
use crate::response::HttpResponse;
use crate::router::Router;

/// Body sent for unmatched requests.
pub const NOT_FOUND_BODY: &[u8] = b"NOT FOUND";

/// Turns requests into responses through the middleware chain and router.
///
/// Cheap to share: wrap it in an `Arc` and call [`dispatch`](Self::dispatch)
/// from as many tasks as you like.
pub struct Dispatcher {
    chain: BoxedHandler,
}

impl Dispatcher {
    pub fn new(router: Router) -> Self {
        Self::with_middleware(router, Vec::new())
    }

    /// `middleware[0]` is the outermost layer.
    pub fn with_middleware(router: Router, middleware: Vec<Arc<dyn Middleware>>) -> Self {
        let terminal: BoxedHandler = Arc::new(Resolve { router });
        let inner = middleware::compose(terminal, &middleware);
        Self { chain: Arc::new(Flush { inner }) }
    }

    pub async fn dispatch(&self, request: http::Request<Bytes>) -> HttpResponse {
        let mut ctx = Context::new(request);
        self.chain.call(&mut ctx).await;

        ctx.take_flushed().unwrap_or_else(|| {
            error!(path = %ctx.path(), "chain returned without a flushed response");
            let mut response = http::Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
    }
}

// ── Chain ends ────────────────────────────────────────────────────────────────

struct Resolve {
    router: Router,
}

impl Handler for Resolve {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
        Box::pin(async move {
            let Some(found) = self.router.find_route(ctx.method(), ctx.path()) else {
                debug!(method = %ctx.method(), path = %ctx.path(), "no route");
                ctx.set_status(StatusCode::NOT_FOUND);
                ctx.set_body(NOT_FOUND_BODY);
                return;
            };

            debug!(method = %ctx.method(), path = %ctx.path(), route = found.route, "route matched");
            ctx.set_route(found.route, found.params);
            found.handler.call(ctx).await;
        })
    }
}

struct Flush {
    inner: BoxedHandler,
}

impl Handler for Flush {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
        Box::pin(async move {
            self.inner.call(ctx).await;
            ctx.flush();
        })
    }
}
