//! # Application Layer
//!
//! Use cases and the interfaces they depend on, coordinating the domain
//! registry with fragment sources and decoders.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
