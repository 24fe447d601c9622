//! Support portal catalog service.
//!
//! Keeps the video catalog, saved queries and reference links in memory,
//! hydrated from a remote document store and written back after every
//! admin mutation. Authentication is delegated to a remote identity
//! provider; only a signed-in administrator can mutate the catalog.
//!
//! The store and identity clients are injected through the
//! [`store::DocumentStore`] and [`identity::IdentityProvider`] traits.
//! [`state::FirebasePortal`] wires up the Firestore and Firebase
//! Authentication REST clients.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod identity;
pub mod search;
pub mod session;
pub mod state;
pub mod store;
pub mod sync;

pub use config::{ConfigError, PortalConfig};
pub use error::PortalError;
pub use state::{FirebasePortal, Portal};
pub use sync::ImportSummary;
