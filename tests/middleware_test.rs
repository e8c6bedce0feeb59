use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use arbor::middleware::{self, AccessLog, ErrorPages, Middleware, Next, Recovery};
use arbor::{BoxFuture, Context, Dispatcher, HttpResponse, Method, Router, StatusCode};
use bytes::Bytes;
use futures_util::FutureExt;
use http::{HeaderName, HeaderValue};
use http_body_util::BodyExt;

fn request(method: Method, uri: &str) -> http::Request<Bytes> {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "example.test")
        .body(Bytes::new())
        .unwrap()
}

async fn body_of(response: HttpResponse) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Indexes past the end of an empty buffer.
fn boom(ctx: &mut Context) -> BoxFuture<'_> {
    Box::pin(async move {
        let buffer: Vec<u8> = Vec::new();
        let byte = buffer[ctx.path().len()];
        ctx.set_body(vec![byte]);
    })
}

fn user(ctx: &mut Context) -> BoxFuture<'_> {
    Box::pin(async move {
        let id = ctx.param("id").unwrap_or_default().to_owned();
        ctx.text(StatusCode::OK, format!("user {id}"));
    })
}

#[tokio::test]
async fn test_recovery_turns_panic_into_500() {
    let router = Router::new().get("/boom", boom);
    let dispatcher = Dispatcher::with_middleware(router, vec![Arc::new(Recovery::new())]);

    let response = dispatcher.dispatch(request(Method::GET, "/boom")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_of(response).await, "Internal Server Error");
}

#[tokio::test]
async fn test_recovery_with_custom_response() {
    let router = Router::new().get("/boom", boom);
    let recovery = Recovery::new().status(StatusCode::SERVICE_UNAVAILABLE).body("try later");
    let dispatcher = Dispatcher::with_middleware(router, vec![Arc::new(recovery)]);

    let response = dispatcher.dispatch(request(Method::GET, "/boom")).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_of(response).await, "try later");
}

#[tokio::test]
async fn test_recovery_leaves_healthy_requests_alone() {
    let router = Router::new().get("/users/:id", user);
    let dispatcher = Dispatcher::with_middleware(router, vec![Arc::new(Recovery::new())]);

    let response = dispatcher.dispatch(request(Method::GET, "/users/7")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_of(response).await, "user 7");
}

fn capture() -> (AccessLog, Arc<Mutex<Vec<serde_json::Value>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink_lines = Arc::clone(&lines);
    let log = AccessLog::new().sink(move |line| {
        let value = serde_json::from_str(line).unwrap();
        sink_lines.lock().unwrap().push(value);
    });
    (log, lines)
}

#[tokio::test]
async fn test_access_log_records_matched_route() {
    let (log, lines) = capture();
    let router = Router::new().get("/users/:id", user);
    let dispatcher = Dispatcher::with_middleware(router, vec![Arc::new(log)]);

    dispatcher.dispatch(request(Method::GET, "/users/42")).await;
    dispatcher.dispatch(request(Method::POST, "/users/42")).await;

    let lines = lines.lock().unwrap();
    assert_eq!(lines.len(), 2);

    assert_eq!(lines[0]["host"], "example.test");
    assert_eq!(lines[0]["route"], "/users/:id");
    assert_eq!(lines[0]["method"], "GET");
    assert_eq!(lines[0]["path"], "/users/42");
    assert_eq!(lines[0]["status"], 200);

    // No POST route: nothing matched, so the route is empty.
    assert_eq!(lines[1]["route"], "");
    assert_eq!(lines[1]["method"], "POST");
    assert_eq!(lines[1]["status"], 404);
}

#[tokio::test]
async fn test_access_log_outside_recovery_sees_the_500() {
    let (log, lines) = capture();
    let router = Router::new().get("/boom", boom);
    let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(log), Arc::new(Recovery::new())];
    let dispatcher = Dispatcher::with_middleware(router, chain);

    let response = dispatcher.dispatch(request(Method::GET, "/boom")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let lines = lines.lock().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["route"], "/boom");
    assert_eq!(lines[0]["status"], 500);
}

#[tokio::test]
async fn test_access_log_records_a_panic_without_recovery() {
    let (log, lines) = capture();
    let router = Router::new().get("/boom", boom);
    let dispatcher = Dispatcher::with_middleware(router, vec![Arc::new(log)]);

    let outcome = AssertUnwindSafe(dispatcher.dispatch(request(Method::GET, "/boom")))
        .catch_unwind()
        .await;

    // The panic still reaches the caller.
    assert!(outcome.is_err());
    let lines = lines.lock().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["route"], "/boom");
    assert_eq!(lines[0]["status"], 500);
}

fn accepted_raw(ctx: &mut Context) -> BoxFuture<'_> {
    Box::pin(async move {
        let response = http::Response::builder()
            .status(StatusCode::ACCEPTED)
            .body(http_body_util::Full::new(Bytes::from_static(b"queued")))
            .unwrap();
        ctx.respond_raw(response);
    })
}

#[tokio::test]
async fn test_access_log_reports_raw_response_status() {
    let (log, lines) = capture();
    let router = Router::new().post("/jobs", accepted_raw);
    let dispatcher = Dispatcher::with_middleware(router, vec![Arc::new(log)]);

    let response = dispatcher.dispatch(request(Method::POST, "/jobs")).await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(lines.lock().unwrap()[0]["status"], 202);
}

#[tokio::test]
async fn test_error_pages_replace_registered_statuses_only() {
    let router = Router::new().get("/users/:id", user);
    let pages = ErrorPages::new().register(StatusCode::NOT_FOUND, "<h1>nothing here</h1>");
    let dispatcher = Dispatcher::with_middleware(router, vec![Arc::new(pages)]);

    let miss = dispatcher.dispatch(request(Method::GET, "/nope")).await;
    assert_eq!(miss.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_of(miss).await, "<h1>nothing here</h1>");

    let hit = dispatcher.dispatch(request(Method::GET, "/users/3")).await;
    assert_eq!(hit.status(), StatusCode::OK);
    assert_eq!(body_of(hit).await, "user 3");
}

fn body_only(ctx: &mut Context) -> BoxFuture<'_> {
    Box::pin(async move { ctx.set_body("handler body") })
}

fn explicit_ok(ctx: &mut Context) -> BoxFuture<'_> {
    Box::pin(async move { ctx.text(StatusCode::OK, "handler body") })
}

#[tokio::test]
async fn test_error_pages_ignore_unset_status() {
    let router = Router::new().get("/implicit", body_only).get("/explicit", explicit_ok);
    let pages = ErrorPages::new().register(StatusCode::OK, "replaced");
    let dispatcher = Dispatcher::with_middleware(router, vec![Arc::new(pages)]);

    let implicit = dispatcher.dispatch(request(Method::GET, "/implicit")).await;
    assert_eq!(implicit.status(), StatusCode::OK);
    assert_eq!(body_of(implicit).await, "handler body");

    let explicit = dispatcher.dispatch(request(Method::GET, "/explicit")).await;
    assert_eq!(body_of(explicit).await, "replaced");
}

fn require_token<'a>(ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a> {
    Box::pin(async move {
        if ctx.header("authorization").is_none() {
            ctx.text(StatusCode::UNAUTHORIZED, "missing token");
            return;
        }
        next.run(ctx).await;
        ctx.set_header(HeaderName::from_static("x-authorized"), HeaderValue::from_static("yes"));
    })
}

#[tokio::test]
async fn test_from_fn_can_short_circuit_or_continue() {
    let router = Router::new().get("/users/:id", user);
    let dispatcher =
        Dispatcher::with_middleware(router, vec![Arc::new(middleware::from_fn(require_token))]);

    let denied = dispatcher.dispatch(request(Method::GET, "/users/1")).await;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    assert!(denied.headers().get("x-authorized").is_none());
    assert_eq!(body_of(denied).await, "missing token");

    let mut allowed = request(Method::GET, "/users/1");
    allowed
        .headers_mut()
        .insert("authorization", HeaderValue::from_static("Bearer t"));
    let response = dispatcher.dispatch(allowed).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-authorized"], "yes");
    assert_eq!(body_of(response).await, "user 1");
}
