//! Buffered response state.
//!
//! Handlers never write to the socket. They fill a [`Buffered`] response on
//! the [`Context`](crate::Context); middleware may read and overwrite it on
//! the way out; the flush step turns it into an `http::Response` exactly once.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use http::StatusCode;
use http_body_util::Full;

/// The response type handed to hyper.
pub type HttpResponse = http::Response<Full<Bytes>>;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for [`Context::bytes`](crate::Context::bytes).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Csv,          // text/csv
    EventStream,  // text/event-stream  (SSE)
    FormData,     // application/x-www-form-urlencoded
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::EventStream => "text/event-stream",
            Self::FormData    => "application/x-www-form-urlencoded",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }

    pub(crate) fn header_value(self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

// ── Buffered ──────────────────────────────────────────────────────────────────

/// Status, headers and body accumulated during dispatch.
///
/// `status` stays `None` until someone sets it; the flush step sends `200`
/// in that case.
#[derive(Debug, Default)]
pub(crate) struct Buffered {
    pub(crate) status: Option<StatusCode>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Vec<u8>,
}

impl Buffered {
    pub(crate) fn effective_status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub(crate) fn set_content_type(&mut self, content_type: ContentType) {
        self.headers.insert(CONTENT_TYPE, content_type.header_value());
    }

    /// Moves the buffer out into a wire response, leaving it empty.
    pub(crate) fn take(&mut self) -> HttpResponse {
        let status = self.effective_status();
        let Buffered { headers, body, .. } = std::mem::take(self);

        let mut response = http::Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}
