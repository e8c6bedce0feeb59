//! Minimal arbor example: CRUD-style endpoints, middleware and health checks.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl 'http://localhost:3000/search?q=trie'
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl http://localhost:3000/files/a/b/c.txt
//!   curl -H 'authorization: x' http://localhost:3000/admin/stats
//!   curl http://localhost:3000/healthz

use arbor::middleware::{self, AccessLog, ErrorPages, Next, Recovery};
use arbor::{BoxFuture, Context, Router, Server, StatusCode, health};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct CreateUser {
    name: String,
}

#[derive(Serialize)]
struct User<'a> {
    id: u64,
    name: &'a str,
}

#[tokio::main]
async fn main() -> Result<(), arbor::Error> {
    arbor::logging::init(&arbor::config::LogConfig::default())?;

    let app = Router::new()
        .get("/users/:id([0-9]+)", get_user)
        .post("/users", create_user)
        .get("/search", search)
        .get("/files/*", file)
        .get("/admin/stats", stats)
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness);

    Server::bind("0.0.0.0:3000")?
        .middleware(AccessLog::new())
        .middleware(Recovery::new())
        .middleware(ErrorPages::new().register(StatusCode::NOT_FOUND, "nothing here\n"))
        .middleware(middleware::from_fn(admin_gate))
        .serve(app)
        .await
}

// GET /users/:id([0-9]+)
fn get_user(ctx: &mut Context) -> BoxFuture<'_> {
    Box::pin(async move {
        let id = match ctx.path_value("id").to_u64() {
            Ok(id) => id,
            Err(e) => return ctx.text(StatusCode::BAD_REQUEST, e.to_string()),
        };
        if let Err(e) = ctx.json(StatusCode::OK, &User { id, name: "alice" }) {
            ctx.text(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    })
}

// POST /users
fn create_user(ctx: &mut Context) -> BoxFuture<'_> {
    Box::pin(async move {
        let input: CreateUser = match ctx.bind_json() {
            Ok(input) => input,
            Err(e) => return ctx.text(StatusCode::BAD_REQUEST, e.to_string()),
        };
        if let Err(e) = ctx.json(StatusCode::CREATED, &User { id: 99, name: &input.name }) {
            ctx.text(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    })
}

// GET /search?q=...
fn search(ctx: &mut Context) -> BoxFuture<'_> {
    Box::pin(async move {
        let q = ctx.query_value("q").unwrap_or("").to_owned();
        ctx.text(StatusCode::OK, format!("searching for {q:?}\n"));
    })
}

// GET /files/*. The wildcard swallows every remaining segment.
fn file(ctx: &mut Context) -> BoxFuture<'_> {
    Box::pin(async move {
        let rest = ctx.path().trim_start_matches("/files/").to_owned();
        ctx.text(StatusCode::OK, format!("file {rest}\n"));
    })
}

// GET /admin/stats
fn stats(ctx: &mut Context) -> BoxFuture<'_> {
    Box::pin(async move { ctx.text(StatusCode::OK, "all good\n") })
}

// Short-circuits /admin/* without an authorization header.
fn admin_gate<'a>(ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
    Box::pin(async move {
        if ctx.path().starts_with("/admin") && ctx.header("authorization").is_none() {
            ctx.text(StatusCode::UNAUTHORIZED, "unauthorized\n");
            return;
        }
        next.run(ctx).await;
    })
}
