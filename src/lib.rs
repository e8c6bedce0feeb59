//! # arbor
//!
//! An embeddable HTTP request router with onion-style middleware and
//! buffered responses.
//!
//! ## The pieces
//!
//! - A segment trie per HTTP method: static, `:param`, `:param(regex)` and
//!   trailing `*` segments, conflicts rejected at registration time
//! - A [`Context`] per request: request accessors, captured parameters, and
//!   a response buffer that stays writable until the very end
//! - A middleware chain: first registered sees the request first and the
//!   response last; the buffered response is flushed once, after all of it
//! - A hyper server: HTTP/1.1 and HTTP/2, graceful SIGTERM / Ctrl-C drain
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use arbor::middleware::{AccessLog, Recovery};
//! use arbor::{BoxFuture, Context, Router, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), arbor::Error> {
//!     let app = Router::new()
//!         .get("/users/:id", get_user)
//!         .post("/users", create_user);
//!
//!     Server::bind("0.0.0.0:3000")?
//!         .middleware(AccessLog::new())
//!         .middleware(Recovery::new())
//!         .serve(app)
//!         .await
//! }
//!
//! fn get_user(ctx: &mut Context) -> BoxFuture<'_> {
//!     Box::pin(async move {
//!         let id = ctx.param("id").unwrap_or("unknown").to_owned();
//!         ctx.text(StatusCode::OK, format!("user {id}"));
//!     })
//! }
//!
//! fn create_user(ctx: &mut Context) -> BoxFuture<'_> {
//!     Box::pin(async move {
//!         if ctx.body().is_empty() {
//!             ctx.set_status(StatusCode::BAD_REQUEST);
//!             return;
//!         }
//!         ctx.text(StatusCode::CREATED, "created");
//!     })
//! }
//! ```

mod context;
mod dispatch;
mod error;
mod handler;
mod response;
mod router;
mod server;
mod tree;
mod value;

pub mod config;
pub mod health;
pub mod logging;
pub mod middleware;

pub use context::Context;
pub use dispatch::{Dispatcher, NOT_FOUND_BODY};
pub use error::{Error, RouteError};
pub use handler::{BoxFuture, BoxedHandler, Handler};
pub use http::{Method, StatusCode};
pub use response::{ContentType, HttpResponse};
pub use router::{RouteMatch, Router};
pub use server::Server;
pub use tree::NodeKind;
pub use value::{StringValue, ValueError};
