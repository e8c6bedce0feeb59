//! Server configuration.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! addr = "0.0.0.0:3000"
//!
//! [log]
//! filter = "info,arbor=debug"
//! format = "json"
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: SocketAddr,
    pub log: LogConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives. `RUST_LOG`, when set, wins.
    pub filter: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000)),
            log: LogConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: "info".to_owned(), format: LogFormat::Pretty }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn parses_all_fields() {
        let config = ServerConfig::from_toml_str(
            r#"
            addr = "127.0.0.1:8081"

            [log]
            filter = "warn,arbor=debug"
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.addr, "127.0.0.1:8081".parse().unwrap());
        assert_eq!(config.log.filter, "warn,arbor=debug");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn rejects_bad_address() {
        let err = ServerConfig::from_toml_str(r#"addr = "nowhere""#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
