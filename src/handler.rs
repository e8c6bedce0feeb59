//! Handler trait and type erasure.
//!
//! # The handler contract
//!
//! A handler receives the request's [`Context`] by mutable reference and
//! writes its answer into the context's buffered response. It returns
//! nothing: the response leaves the process only when the outermost flush
//! step runs, after every middleware has had its turn.
//!
//! The router needs to hold handlers of *different* types in one tree, so
//! they are stored as trait objects:
//!
//! ```text
//! fn hello(ctx: &mut Context) -> BoxFuture<'_> { … }   ← user writes this
//!        ↓ router.get("/", hello)
//! Arc::new(hello)                                      ← BoxedHandler
//!        ↓
//! handler.call(&mut ctx)  at request time              ← one vtable dispatch
//! ```
//!
//! The returned future borrows the context for `'a`, which is why handlers are
//! plain functions returning a [`BoxFuture`] rather than `async fn`: an
//! `async fn` taking `&mut Context` cannot name the lifetime of its own
//! future in a trait bound.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;

/// A heap-allocated, type-erased future borrowing the request context.
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn Handler>;

/// Anything that can serve a request.
///
/// Implemented for every function of the shape
///
/// ```text
/// fn name(ctx: &mut Context) -> BoxFuture<'_>
/// ```
///
/// and implementable by hand for stateful handlers and middleware stages:
///
/// ```rust
/// use arbor::{BoxFuture, Context, Handler};
///
/// struct Greeting(&'static str);
///
/// impl Handler for Greeting {
///     fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
///         Box::pin(async move { ctx.set_body(self.0) })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
        (self)(ctx)
    }
}

pub(crate) fn boxed(handler: impl Handler) -> BoxedHandler {
    Arc::new(handler)
}
