use std::sync::{Arc, Mutex};

use arbor::middleware::Middleware;
use arbor::{
    BoxFuture, BoxedHandler, Context, Dispatcher, Handler, HttpResponse, Method, NOT_FOUND_BODY,
    Router, StatusCode,
};
use bytes::Bytes;
use http_body_util::BodyExt;

type Log = Arc<Mutex<Vec<String>>>;

fn request(method: Method, uri: &str) -> http::Request<Bytes> {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
}

async fn body_of(response: HttpResponse) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Handler that records its invocation and echoes what it saw.
struct Record {
    log: Log,
}

impl Handler for Record {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
        Box::pin(async move {
            self.log.lock().unwrap().push("handler".to_owned());
            let id = ctx.param("id").unwrap_or("-").to_owned();
            let route = ctx.matched_route().unwrap_or("-").to_owned();
            ctx.set_body(format!("{route} {id}"));
        })
    }
}

/// Middleware that logs `<label>-before` / `<label>-after` and appends its
/// label to the buffered body on the way out.
struct Trace {
    label: &'static str,
    log: Log,
}

impl Middleware for Trace {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(TraceStage { label: self.label, log: Arc::clone(&self.log), next })
    }
}

struct TraceStage {
    label: &'static str,
    log: Log,
    next: BoxedHandler,
}

impl Handler for TraceStage {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
        Box::pin(async move {
            self.log.lock().unwrap().push(format!("{}-before", self.label));
            self.next.call(ctx).await;
            self.log.lock().unwrap().push(format!("{}-after", self.label));
            let mut body = ctx.response_body().to_vec();
            body.extend_from_slice(format!(" {}", self.label).as_bytes());
            ctx.set_body(body);
        })
    }
}

/// Rejects every request without calling the rest of the chain.
struct Gate {
    log: Log,
}

impl Middleware for Gate {
    fn wrap(&self, _next: BoxedHandler) -> BoxedHandler {
        Arc::new(GateStage { log: Arc::clone(&self.log) })
    }
}

struct GateStage {
    log: Log,
}

impl Handler for GateStage {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
        Box::pin(async move {
            self.log.lock().unwrap().push("gate".to_owned());
            ctx.text(StatusCode::UNAUTHORIZED, "denied");
        })
    }
}

fn traced(log: &Log, labels: &[&'static str]) -> Vec<Arc<dyn Middleware>> {
    labels
        .iter()
        .map(|&label| Arc::new(Trace { label, log: Arc::clone(log) }) as Arc<dyn Middleware>)
        .collect()
}

#[tokio::test]
async fn test_middleware_runs_in_onion_order_before_flush() {
    let log = Log::default();
    let router = Router::new().get("/user/:id", Record { log: Arc::clone(&log) });
    let dispatcher = Dispatcher::with_middleware(router, traced(&log, &["A", "B"]));

    let response = dispatcher.dispatch(request(Method::GET, "/user/42")).await;

    assert_eq!(entries(&log), ["A-before", "B-before", "handler", "B-after", "A-after"]);
    assert_eq!(response.status(), StatusCode::OK);
    // Both "after" steps wrote into the buffer, so the flush came last.
    assert_eq!(body_of(response).await, "/user/:id 42 B A");
}

#[tokio::test]
async fn test_not_found_skips_handler() {
    let log = Log::default();
    let router = Router::new().get("/user/:id/detail", Record { log: Arc::clone(&log) });
    let dispatcher = Dispatcher::with_middleware(router, traced(&log, &["A"]));

    let response = dispatcher.dispatch(request(Method::GET, "/user/42")).await;

    assert_eq!(entries(&log), ["A-before", "A-after"]);
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let expected = format!("{} A", String::from_utf8_lossy(NOT_FOUND_BODY));
    assert_eq!(body_of(response).await, expected);
}

#[tokio::test]
async fn test_nested_route_scenario() {
    let log = Log::default();
    let router = Router::new()
        .get("/", Record { log: Arc::clone(&log) })
        .get("/a/b/c", Record { log: Arc::clone(&log) });
    let dispatcher = Dispatcher::new(router);

    let miss = dispatcher.dispatch(request(Method::GET, "/a/b")).await;
    assert_eq!(miss.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_of(miss).await, "NOT FOUND");

    let hit = dispatcher.dispatch(request(Method::GET, "/a/b/c")).await;
    assert_eq!(hit.status(), StatusCode::OK);
    assert_eq!(body_of(hit).await, "/a/b/c -");

    let root = dispatcher.dispatch(request(Method::GET, "/")).await;
    assert_eq!(body_of(root).await, "/ -");
    assert_eq!(entries(&log), ["handler", "handler"]);
}

#[tokio::test]
async fn test_short_circuit_still_flushes_and_unwinds() {
    let log = Log::default();
    let router = Router::new().get("/secret", Record { log: Arc::clone(&log) });
    let mut middleware = traced(&log, &["A"]);
    middleware.push(Arc::new(Gate { log: Arc::clone(&log) }));
    middleware.extend(traced(&log, &["C"]));
    let dispatcher = Dispatcher::with_middleware(router, middleware);

    let response = dispatcher.dispatch(request(Method::GET, "/secret")).await;

    assert_eq!(entries(&log), ["A-before", "gate", "A-after"]);
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_of(response).await, "denied A");
}

#[tokio::test]
async fn test_unset_status_is_sent_as_ok() {
    fn silent(_ctx: &mut Context) -> BoxFuture<'_> {
        Box::pin(async {})
    }

    let dispatcher = Dispatcher::new(Router::new().post("/quiet", silent));
    let response = dispatcher.dispatch(request(Method::POST, "/quiet")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_of(response).await, "");
}

#[tokio::test]
async fn test_raw_response_escapes_the_buffer() {
    fn raw(ctx: &mut Context) -> BoxFuture<'_> {
        Box::pin(async move {
            let response = http::Response::builder()
                .status(StatusCode::ACCEPTED)
                .body(http_body_util::Full::new(Bytes::from_static(b"raw")))
                .unwrap();
            ctx.respond_raw(response);
        })
    }

    let log = Log::default();
    let dispatcher = Dispatcher::with_middleware(Router::new().get("/raw", raw), traced(&log, &["A"]));
    let response = dispatcher.dispatch(request(Method::GET, "/raw")).await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    // A's "after" edit landed in the buffer, which is not what was sent.
    assert_eq!(body_of(response).await, "raw");
}

#[tokio::test]
async fn test_concurrent_requests_do_not_share_context() {
    let log = Log::default();
    let router = Router::new().get("/item/:id", Record { log: Arc::clone(&log) });
    let dispatcher = Arc::new(Dispatcher::new(router));

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..32 {
        let dispatcher = Arc::clone(&dispatcher);
        tasks.spawn(async move {
            let response = dispatcher.dispatch(request(Method::GET, &format!("/item/{i}"))).await;
            (i, body_of(response).await)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (i, body) = joined.unwrap();
        assert_eq!(body, format!("/item/:id {i}"));
    }
    assert_eq!(entries(&log).len(), 32);
}
