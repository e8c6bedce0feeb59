//! Fixed bodies for selected status codes.

use std::collections::HashMap;
use std::sync::Arc;

use http::StatusCode;

use super::Middleware;
use crate::context::Context;
use crate::handler::{BoxFuture, BoxedHandler, Handler};

/// Replaces the buffered body whenever the inner chain ends with one of the
/// registered status codes. Only an explicitly set status counts: a response
/// that falls back to `200` is left alone.
///
/// ```rust
/// use arbor::StatusCode;
/// use arbor::middleware::ErrorPages;
///
/// let pages = ErrorPages::new()
///     .register(StatusCode::NOT_FOUND, "<h1>nothing here</h1>")
///     .register(StatusCode::INTERNAL_SERVER_ERROR, "<h1>oops</h1>");
/// ```
#[derive(Clone, Default)]
pub struct ErrorPages {
    pages: Arc<HashMap<StatusCode, Vec<u8>>>,
}

impl ErrorPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Arc::make_mut(&mut self.pages).insert(status, body.into());
        self
    }
}

impl Middleware for ErrorPages {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(ErrorPagesStage { pages: Arc::clone(&self.pages), next })
    }
}

struct ErrorPagesStage {
    pages: Arc<HashMap<StatusCode, Vec<u8>>>,
    next: BoxedHandler,
}

impl Handler for ErrorPagesStage {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
        Box::pin(async move {
            self.next.call(ctx).await;
            let page = ctx.status_code().and_then(|status| self.pages.get(&status));
            if let Some(page) = page {
                ctx.set_body(page.clone());
            }
        })
    }
}
