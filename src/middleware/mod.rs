//! Middleware layer.
//!
//! A middleware wraps the next stage of the chain and returns a new stage.
//! It may run code before calling `next`, after it, both, or skip `next`
//! entirely to short-circuit (an auth gate rejecting a request, say).
//!
//! Given middleware `[A, B]`, a request that reaches the handler runs:
//!
//! ```text
//! A before → B before → handler → B after → A after → flush
//! ```
//!
//! Built-in middleware:
//! - [`AccessLog`]: one record per request: route, method, path, status, latency
//! - [`Recovery`]: turns a panicking handler into a fixed error response
//! - [`ErrorPages`]: replaces the body of selected status codes

mod access_log;
mod error_pages;
mod recovery;

use std::sync::Arc;

pub use access_log::{AccessLog, AccessRecord};
pub use error_pages::ErrorPages;
pub use recovery::Recovery;

use crate::context::Context;
use crate::handler::{BoxFuture, BoxedHandler, Handler};

/// Wraps the next stage of the chain.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

/// Folds `middleware` around `terminal`, last-registered innermost, so the
/// first entry sees the request first and the response last.
pub(crate) fn compose(terminal: BoxedHandler, middleware: &[Arc<dyn Middleware>]) -> BoxedHandler {
    middleware.iter().rev().fold(terminal, |next, m| m.wrap(next))
}

// ── from_fn ───────────────────────────────────────────────────────────────────

/// The rest of the chain, as seen by a [`from_fn`] middleware.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    inner: &'a BoxedHandler,
}

impl<'a> Next<'a> {
    pub fn run<'b>(self, ctx: &'b mut Context) -> BoxFuture<'b>
    where
        'a: 'b,
    {
        self.inner.call(ctx)
    }
}

/// Builds a middleware from a function.
///
/// ```rust
/// use arbor::{BoxFuture, Context, StatusCode};
/// use arbor::middleware::{self, Next};
///
/// fn require_token<'a>(ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
///     Box::pin(async move {
///         if ctx.header("authorization").is_none() {
///             ctx.text(StatusCode::UNAUTHORIZED, "missing token");
///             return;
///         }
///         next.run(ctx).await;
///     })
/// }
///
/// let auth = middleware::from_fn(require_token);
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a> + Send + Sync + 'static,
{
    FromFn { f: Arc::new(f) }
}

/// Middleware returned by [`from_fn`].
pub struct FromFn<F> {
    f: Arc<F>,
}

impl<F> Middleware for FromFn<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a> + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(FromFnStage { f: Arc::clone(&self.f), next })
    }
}

struct FromFnStage<F> {
    f: Arc<F>,
    next: BoxedHandler,
}

impl<F> Handler for FromFnStage<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
        (self.f)(ctx, Next { inner: &self.next })
    }
}
