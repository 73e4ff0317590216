//! Domain services holding registry state transitions.

mod readiness;

pub use readiness::*;
