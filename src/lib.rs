// ABOUTME: Library root for imagesync - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod daemon;
pub mod diagnostics;
pub mod error;
pub mod registry;
pub mod runtime;
pub mod sync;
pub mod types;
