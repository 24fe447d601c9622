//! Reference link URLs.

use core::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Errors that can occur when parsing a [`WebUrl`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WebUrlError {
    /// The input string is empty.
    #[error("url cannot be empty")]
    Empty,
    /// The input could not be parsed as an absolute URL.
    #[error("malformed url: {0}")]
    Malformed(String),
    /// Only web links are accepted.
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("url must include a host")]
    MissingHost,
}

/// A well-formed `http` or `https` URL.
///
/// Links store the URL exactly as entered (trimmed); this type only checks
/// that it is well-formed. No identifier is derived from it.
///
/// ## Examples
///
/// ```
/// use support_portal_core::WebUrl;
///
/// assert!(WebUrl::parse("https://docs.example.com/guide").is_ok());
/// assert!(WebUrl::parse("not a url").is_err());
/// assert!(WebUrl::parse("ftp://files.example.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebUrl(String);

impl WebUrl {
    /// Parse a link URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, is not an absolute URL, uses a
    /// scheme other than `http`/`https`, or has no host.
    pub fn parse(s: &str) -> Result<Self, WebUrlError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(WebUrlError::Empty);
        }

        let parsed = Url::parse(trimmed).map_err(|e| WebUrlError::Malformed(e.to_string()))?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(WebUrlError::UnsupportedScheme(other.to_owned())),
        }

        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(WebUrlError::MissingHost);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `WebUrl` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for WebUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for WebUrl {
    type Err = WebUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
