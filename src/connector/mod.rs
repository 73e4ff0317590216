//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Registry storage (in-memory, session scoped)
//! - Fragment decoding (JSON and legacy rustdoc `implementors/*.js`)
//! - Fragment sources (filesystem)
//! - CLI wiring (container, router, controllers)

pub mod adapter;
pub mod api;

pub use adapter::*;
