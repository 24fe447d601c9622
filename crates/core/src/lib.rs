//! Support Portal Core - catalog types and pure mutators.
//!
//! This crate provides the data model shared by every support portal
//! component:
//! - `portal` - catalog sync layer, document store and identity clients
//! - `cli` - operator command-line tools
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async runtime. Mutators take the current collection by
//! reference and return the next value; they never modify their input.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, platform video ids, link URLs and emails
//! - [`catalog`] - Videos, saved queries, links and the mutators over them

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod types;

pub use catalog::*;
pub use types::*;
