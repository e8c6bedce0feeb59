//! Error types.
//!
//! Two families, never mixed:
//!
//! - [`RouteError`]: configuration errors raised while routes are being
//!   registered. They can only be fixed by changing registration code.
//! - [`Error`]: infrastructure failures: binding a port, reading a config
//!   file, installing the log subscriber.
//!
//! Request-time outcomes (404, 500, …) are neither. They are expressed as
//! buffered responses on the [`Context`](crate::Context).

use crate::tree::NodeKind;

/// A route registration was rejected.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("route path is empty")]
    EmptyPath,

    #[error("route `{0}` must begin with `/`")]
    MissingLeadingSlash(String),

    #[error("route `{0}` must not end with `/`")]
    TrailingSlash(String),

    #[error("route `{0}` contains an empty segment (`//`)")]
    EmptySegment(String),

    #[error("route `{0}` is already registered")]
    Duplicate(String),

    #[error("route `{route}`: wildcard `*` is only allowed as the last segment")]
    WildcardNotLast { route: String },

    #[error("route `{route}`: parameter segment `{segment}` has no name")]
    UnnamedParam { route: String, segment: String },

    #[error("route `{route}`: invalid pattern in segment `{segment}`: {source}")]
    InvalidPattern {
        route: String,
        segment: String,
        #[source]
        source: regex_lite::Error,
    },

    #[error(
        "route `{route}`: segment `{segment}` conflicts with existing {existing} segment `{existing_segment}`"
    )]
    Conflict {
        route: String,
        segment: String,
        existing: NodeKind,
        existing_segment: String,
    },
}

/// The error type returned by arbor's fallible infrastructure operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("logging: {0}")]
    Logging(String),

    #[error(transparent)]
    Route(#[from] RouteError),
}
