//! # Domain Layer
//!
//! Core registry models, readiness state and the error type.
//! This layer is independent of fragment sources, decoders and the CLI.

mod error;
pub mod models;
pub mod services;

pub use error::*;
pub use models::*;
pub use services::*;
