//! Trie request router.
//!
//! One tree per HTTP method. Registration validates eagerly and rejects
//! conflicting routes; resolution is a single non-backtracking walk that
//! either finds a bound handler or reports a miss.

use std::collections::HashMap;

use http::Method;

use crate::error::RouteError;
use crate::handler::{self, BoxedHandler, Handler};
use crate::tree::Node;

/// The application router.
///
/// Build it once at startup, then hand it to a [`Dispatcher`](crate::Dispatcher)
/// or [`Server::serve`](crate::Server::serve). After that it is only ever
/// read, so it is shared across concurrent requests without locking.
pub struct Router {
    trees: HashMap<Method, Node<BoxedHandler>>,
}

/// A successful lookup: the bound handler, its route and captured params.
pub struct RouteMatch<'r> {
    pub handler: &'r BoxedHandler,
    pub route: &'r str,
    pub params: HashMap<String, String>,
}

impl Router {
    pub fn new() -> Self {
        Self { trees: HashMap::new() }
    }

    /// Registers `handler` for `method` + `path`.
    ///
    /// Path syntax: `/literal`, `/:name`, `/:name(regex)`, and a trailing `/*`.
    /// Any malformed or conflicting path is rejected with a [`RouteError`]
    /// and nothing is bound.
    pub fn add_route(&mut self, method: Method, path: &str, handler: impl Handler) -> Result<(), RouteError> {
        self.trees
            .entry(method)
            .or_insert_with(Node::root)
            .insert(path, handler::boxed(handler))
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// # Panics
    ///
    /// Panics on any [`RouteError`]. A bad route table is a programming
    /// error; failing at startup beats serving a half-built router. Use
    /// [`Router::add_route`] to handle the error yourself.
    ///
    /// ```rust
    /// # use arbor::{BoxFuture, Context, Method, Router};
    /// # fn get_user(_: &mut Context) -> BoxFuture<'_> { Box::pin(async {}) }
    /// # fn create_user(_: &mut Context) -> BoxFuture<'_> { Box::pin(async {}) }
    /// # fn delete_user(_: &mut Context) -> BoxFuture<'_> { Box::pin(async {}) }
    /// Router::new()
    ///     .on(Method::DELETE, "/users/:id", delete_user)
    ///     .get("/users/:id", get_user)
    ///     .post("/users", create_user);
    /// ```
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        if let Err(e) = self.add_route(method, path, handler) {
            panic!("invalid route: {e}");
        }
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PATCH, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    pub fn head(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::HEAD, path, handler)
    }

    pub fn options(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::OPTIONS, path, handler)
    }

    /// Finds the handler bound to `method` + `path`.
    ///
    /// `None` covers an unknown method, a path that leaves the tree, and a
    /// path that stops on an intermediate segment nobody bound a handler to.
    pub fn find_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let resolved = self.trees.get(method)?.resolve(path)?;
        let node = resolved.node;
        Some(RouteMatch {
            handler: node.value()?,
            route: node.route()?,
            params: resolved.params,
        })
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
