//! Per-request context.
//!
//! One [`Context`] is built for every inbound request and owned by the task
//! serving it. It carries the request, the path parameters captured by the
//! router, the route that matched, and the buffered response that handlers
//! and middleware write into.

use std::collections::HashMap;
use std::sync::OnceLock;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode, Uri};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::response::{Buffered, ContentType, HttpResponse};
use crate::value::StringValue;

pub struct Context {
    request: http::Request<Bytes>,
    path_params: HashMap<String, String>,
    matched_route: Option<String>,
    response: Buffered,
    raw: Option<HttpResponse>,
    flushed: Option<HttpResponse>,
    query_cache: OnceLock<HashMap<String, String>>,
    form_cache: OnceLock<HashMap<String, String>>,
}

impl Context {
    /// Wraps a request whose body has already been read into memory.
    pub fn new(request: http::Request<Bytes>) -> Self {
        Self {
            request,
            path_params: HashMap::new(),
            matched_route: None,
            response: Buffered::default(),
            raw: None,
            flushed: None,
            query_cache: OnceLock::new(),
            form_cache: OnceLock::new(),
        }
    }

    // ── Request ───────────────────────────────────────────────────────────────

    pub fn request(&self) -> &http::Request<Bytes> { &self.request }
    pub fn method(&self) -> &Method { self.request.method() }
    pub fn uri(&self) -> &Uri { self.request.uri() }
    pub fn path(&self) -> &str { self.request.uri().path() }
    pub fn headers(&self) -> &HeaderMap { self.request.headers() }
    pub fn body(&self) -> &Bytes { self.request.body() }

    /// Header value as a string. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// `Host` header, falling back to the URI authority (HTTP/2).
    pub fn host(&self) -> Option<&str> {
        self.request
            .headers()
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| self.request.uri().authority().map(|a| a.as_str()))
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `ctx.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.path_params.get(key).map(String::as_str)
    }

    pub fn path_value(&self, key: &str) -> StringValue {
        match self.path_params.get(key) {
            Some(v) => StringValue::present(key, v.as_str()),
            None => StringValue::missing(key),
        }
    }

    pub fn path_params(&self) -> &HashMap<String, String> { &self.path_params }

    /// The registered route that served this request, e.g. `/users/:id`.
    /// `None` until routing has happened, and for unmatched requests.
    pub fn matched_route(&self) -> Option<&str> { self.matched_route.as_deref() }

    pub(crate) fn set_route(&mut self, route: &str, params: HashMap<String, String>) {
        self.matched_route = Some(route.to_owned());
        self.path_params = params;
    }

    /// Query-string lookup. The query is parsed once, on first use; for a
    /// repeated key the first occurrence wins.
    pub fn query_value(&self, key: &str) -> StringValue {
        let query = self.query_cache.get_or_init(|| {
            parse_pairs(self.request.uri().query().unwrap_or_default().as_bytes())
        });
        lookup(query, key)
    }

    /// Form lookup: url-encoded body fields first, then the query string.
    pub fn form_value(&self, key: &str) -> StringValue {
        let form = self.form_cache.get_or_init(|| {
            if self.is_urlencoded() {
                parse_pairs(self.request.body())
            } else {
                HashMap::new()
            }
        });
        match form.get(key) {
            Some(v) => StringValue::present(key, v.as_str()),
            None => self.query_value(key),
        }
    }

    fn is_urlencoded(&self) -> bool {
        self.header(CONTENT_TYPE.as_str()).is_some_and(|ct| {
            let media_type = ct.split(';').next().unwrap_or_default().trim();
            media_type.eq_ignore_ascii_case(ContentType::FormData.as_str())
        })
    }

    /// Deserialises the request body as JSON.
    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(self.request.body())
    }

    // ── Buffered response ─────────────────────────────────────────────────────

    /// The status that will be sent: `200` unless something set another.
    pub fn status(&self) -> StatusCode { self.response.effective_status() }

    /// The explicitly set status, `None` if nothing set one.
    pub fn status_code(&self) -> Option<StatusCode> { self.response.status }

    /// The status the client will receive: the raw response's when
    /// [`respond_raw`](Self::respond_raw) was used, the buffered one otherwise.
    pub fn outgoing_status(&self) -> StatusCode {
        match &self.raw {
            Some(raw) => raw.status(),
            None => self.status(),
        }
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.response.status = Some(status);
    }

    pub fn response_body(&self) -> &[u8] { &self.response.body }

    /// Replaces the buffered body.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.response.body = body.into();
    }

    pub fn response_headers(&self) -> &HeaderMap { &self.response.headers }
    pub fn response_headers_mut(&mut self) -> &mut HeaderMap { &mut self.response.headers }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response.headers.insert(name, value);
    }

    /// `text/plain` body with `status`.
    pub fn text(&mut self, status: StatusCode, body: impl Into<String>) {
        self.bytes(status, ContentType::Text, body.into().into_bytes());
    }

    pub fn bytes(&mut self, status: StatusCode, content_type: ContentType, body: impl Into<Vec<u8>>) {
        self.response.set_content_type(content_type);
        self.set_status(status);
        self.set_body(body);
    }

    /// Serialises `value` as the JSON body. On failure the buffer is left
    /// untouched.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) -> Result<(), serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        self.bytes(status, ContentType::Json, body);
        Ok(())
    }

    /// Sends `response` as-is, bypassing the buffer.
    ///
    /// Middleware running after this call still sees the buffer, but nothing
    /// it writes there reaches the client.
    pub fn respond_raw(&mut self, response: HttpResponse) {
        self.raw = Some(response);
    }

    // ── Flush ─────────────────────────────────────────────────────────────────

    pub fn is_flushed(&self) -> bool { self.flushed.is_some() }

    /// Freezes the outgoing response. Only the first call has any effect.
    pub(crate) fn flush(&mut self) {
        if self.flushed.is_some() {
            warn!(path = %self.path(), "response already flushed, ignoring");
            return;
        }
        let response = match self.raw.take() {
            Some(raw) => raw,
            None => self.response.take(),
        };
        self.flushed = Some(response);
    }

    pub(crate) fn take_flushed(&mut self) -> Option<HttpResponse> {
        self.flushed.take()
    }
}

fn parse_pairs(input: &[u8]) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    for (k, v) in url::form_urlencoded::parse(input) {
        pairs.entry(k.into_owned()).or_insert_with(|| v.into_owned());
    }
    pairs
}

fn lookup(pairs: &HashMap<String, String>, key: &str) -> StringValue {
    match pairs.get(key) {
        Some(v) => StringValue::present(key, v.as_str()),
        None => StringValue::missing(key),
    }
}
