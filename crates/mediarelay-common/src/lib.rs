//! Shared types for mediarelay.
//!
//! This crate provides common types used across the mediarelay workspace:
//!
//! - [`ids`] - Typed identifiers for stored objects and upstream clients
//! - [`error`] - The error taxonomy of the streaming core
//! - [`types`] - Object metadata as resolved from an upstream source

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::{ClientId, ObjectId};
pub use types::{ObjectMetadata, TOKEN_LEN};
