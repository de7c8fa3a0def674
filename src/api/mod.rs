//! REST API module for Trellis.
//!
//! Provides the HTTP surface of the service: file classification,
//! taxonomy browsing, health, and metrics.

mod handlers;
mod rest;

pub use handlers::*;
pub use rest::*;
