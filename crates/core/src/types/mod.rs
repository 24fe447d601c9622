//! Core types for the support portal.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod view;
pub mod web_url;
pub mod youtube;

pub use email::{Email, EmailError};
pub use id::*;
pub use view::{AppView, CollectionName, UnknownCollection};
pub use web_url::{WebUrl, WebUrlError};
pub use youtube::{YouTubeId, YouTubeIdError};
