//! Typed access to optional request values.

use std::fmt;
use std::str::FromStr;

/// Why a [`StringValue`] holds no usable string.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("missing value for `{key}`")]
    Missing { key: String },

    #[error("invalid value `{value}` for `{key}`: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// A request value that may be absent: path parameter, query-string or form
/// field.
///
/// Lookups never panic. Absence is carried in the value and surfaces only
/// when the caller asks for the string or converts it:
///
/// ```rust
/// # use arbor::{StringValue, ValueError};
/// let page = StringValue::present("page", "3");
/// assert_eq!(page.parse::<u32>(), Ok(3));
///
/// let size = StringValue::missing("size");
/// assert_eq!(size.to_i64().unwrap_or(20), 20);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StringValue {
    key: String,
    value: Option<String>,
}

impl StringValue {
    pub fn present(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: Some(value.into()) }
    }

    pub fn missing(key: impl Into<String>) -> Self {
        Self { key: key.into(), value: None }
    }

    pub fn key(&self) -> &str { &self.key }
    pub fn is_present(&self) -> bool { self.value.is_some() }

    /// The raw string, or [`ValueError::Missing`].
    pub fn as_str(&self) -> Result<&str, ValueError> {
        self.value.as_deref().ok_or_else(|| ValueError::Missing { key: self.key.clone() })
    }

    pub fn into_string(self) -> Result<String, ValueError> {
        let Self { key, value } = self;
        value.ok_or(ValueError::Missing { key })
    }

    pub fn unwrap_or<'s>(&'s self, default: &'s str) -> &'s str {
        self.value.as_deref().unwrap_or(default)
    }

    /// Converts with [`FromStr`]. A parse failure is reported as
    /// [`ValueError::Invalid`] carrying the offending input.
    pub fn parse<T>(&self) -> Result<T, ValueError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.as_str()?;
        raw.parse::<T>().map_err(|e| ValueError::Invalid {
            key: self.key.clone(),
            value: raw.to_owned(),
            reason: e.to_string(),
        })
    }

    pub fn to_i64(&self) -> Result<i64, ValueError> {
        self.parse()
    }

    pub fn to_u64(&self) -> Result<u64, ValueError> {
        self.parse()
    }

    pub fn to_bool(&self) -> Result<bool, ValueError> {
        self.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_value_converts() {
        let v = StringValue::present("id", "42");
        assert_eq!(v.as_str(), Ok("42"));
        assert_eq!(v.to_i64(), Ok(42));
        assert_eq!(v.to_u64(), Ok(42));
        assert_eq!(v.clone().into_string(), Ok("42".to_owned()));
    }

    #[test]
    fn missing_value_reports_key() {
        let v = StringValue::missing("id");
        assert!(!v.is_present());
        assert_eq!(v.as_str(), Err(ValueError::Missing { key: "id".into() }));
        assert_eq!(v.to_i64(), Err(ValueError::Missing { key: "id".into() }));
        assert_eq!(v.unwrap_or("0"), "0");
    }

    #[test]
    fn bad_number_is_an_error_not_a_panic() {
        let v = StringValue::present("id", "abc");
        match v.to_i64() {
            Err(ValueError::Invalid { key, value, .. }) => {
                assert_eq!(key, "id");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(StringValue::present("flag", "yes").to_bool().is_err());
        assert_eq!(StringValue::present("flag", "true").to_bool(), Ok(true));
    }
}
