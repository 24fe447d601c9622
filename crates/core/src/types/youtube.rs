//! Platform video identifiers.
//!
//! A [`YouTubeId`] is the 11-character token that identifies a video on the
//! hosting platform. It is always derived from the source URL an admin
//! enters; the thumbnail and player URLs are built from it.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Recognises `youtu.be/ID`, `v/ID`, `u/<ch>/ID`, `embed/ID`, `watch?v=ID`
/// and `&v=ID`. The leading `.*` is greedy, so the capture starts after the
/// last marker in the URL.
static SOURCE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(youtu.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*").expect("Invalid regex")
});

/// Errors that can occur when deriving a [`YouTubeId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum YouTubeIdError {
    /// No recognised marker in the URL, or the token is not 11 characters.
    #[error("not a recognised video URL: {0}")]
    InvalidSourceUrl(String),
    /// A stored identifier does not have the expected length.
    #[error("video id must be exactly {expected} characters, got {actual}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Length of the rejected value.
        actual: usize,
    },
}

/// An 11-character platform video identifier.
///
/// ## Examples
///
/// ```
/// use support_portal_core::YouTubeId;
///
/// let id = YouTubeId::from_source_url("https://youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
/// assert_eq!(id.as_str(), "dQw4w9WgXcQ");
/// assert_eq!(
///     id.thumbnail_url(),
///     "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
/// );
///
/// assert!(YouTubeId::from_source_url("https://example.com/video").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YouTubeId(String);

impl YouTubeId {
    /// Length of every platform video identifier.
    pub const LENGTH: usize = 11;

    /// Extract the identifier from a source URL as entered by an admin.
    ///
    /// # Errors
    ///
    /// Returns [`YouTubeIdError::InvalidSourceUrl`] if the URL has no
    /// recognised marker or the captured token is not exactly 11 characters.
    pub fn from_source_url(url: &str) -> Result<Self, YouTubeIdError> {
        SOURCE_URL_RE
            .captures(url)
            .and_then(|caps| caps.get(2))
            .map(|token| token.as_str())
            .filter(|token| token.chars().count() == Self::LENGTH)
            .map(|token| Self(token.to_owned()))
            .ok_or_else(|| YouTubeIdError::InvalidSourceUrl(url.to_owned()))
    }

    /// Wrap an identifier that was stored earlier.
    ///
    /// # Errors
    ///
    /// Returns [`YouTubeIdError::InvalidLength`] unless the value is exactly
    /// 11 characters.
    pub fn parse(s: &str) -> Result<Self, YouTubeIdError> {
        let actual = s.chars().count();
        if actual != Self::LENGTH {
            return Err(YouTubeIdError::InvalidLength {
                expected: Self::LENGTH,
                actual,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// High-quality thumbnail used on the customer video grid.
    #[must_use]
    pub fn thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/hqdefault.jpg", self.0)
    }

    /// Medium thumbnail used in the admin video list.
    #[must_use]
    pub fn small_thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/mqdefault.jpg", self.0)
    }

    /// Embeddable player URL.
    #[must_use]
    pub fn embed_url(&self) -> String {
        format!("https://www.youtube.com/embed/{}", self.0)
    }

    /// Player URL for the overlay: starts playing, no related videos.
    #[must_use]
    pub fn autoplay_embed_url(&self) -> String {
        format!("{}?autoplay=1&rel=0", self.embed_url())
    }

    /// Canonical watch page URL.
    #[must_use]
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for YouTubeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for YouTubeId {
    type Error = YouTubeIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<YouTubeId> for String {
    fn from(id: YouTubeId) -> Self {
        id.0
    }
}

impl AsRef<str> for YouTubeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
