//! Newtype IDs for catalog records.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different collections. Each collection has
//! its own id space; ids are opaque strings once stored.

use std::sync::atomic::{AtomicI64, Ordering};

/// Macro to define a type-safe record ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use support_portal_core::define_id;
/// define_id!(NoteId);
/// define_id!(TagId);
///
/// let note_id = NoteId::new("1718000000000");
/// let tag_id = TagId::new("1718000000000");
///
/// // These are different types, so this won't compile:
/// // let _: NoteId = tag_id;
/// assert_eq!(note_id.as_str(), tag_id.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(VideoId);
define_id!(QueryId);
define_id!(LinkId);

/// Generator for time-derived record ids.
///
/// Tokens are the current Unix time in milliseconds, bumped forward when two
/// ids are requested within the same millisecond (or the clock steps back),
/// so every token handed out by one generator is strictly greater than the
/// previous one.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

static PROCESS_IDS: IdGenerator = IdGenerator::new();

impl IdGenerator {
    /// Create a generator with no ids issued yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// The generator shared by the whole process.
    #[must_use]
    pub fn global() -> &'static Self {
        &PROCESS_IDS
    }

    /// Produce the next token.
    pub fn next_token(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(previous.saturating_add(1)).to_string()
    }

    /// Produce the next token as a typed id.
    pub fn next_id<T: From<String>>(&self) -> T {
        T::from(self.next_token())
    }
}
