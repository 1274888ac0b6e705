//! Mediarelay - HTTP range streaming of stored media
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod render;
pub mod server;
pub mod source;
pub mod streaming;
