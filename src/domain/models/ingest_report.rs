use serde::{Deserialize, Serialize};

use super::InterfaceId;

/// An interface delivered again with a payload that differs from the one
/// already registered. The earlier payload is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationConflict {
    pub interface: InterfaceId,
    pub kept_implementors: usize,
    pub rejected_implementors: usize,
    pub origin: Option<String>,
}

/// Outcome of merging one fragment into the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Interfaces that moved from unregistered to registered.
    pub registered: Vec<InterfaceId>,
    /// Interfaces re-delivered with an identical payload.
    pub unchanged: Vec<InterfaceId>,
    pub conflicts: Vec<RegistrationConflict>,
    /// Set when this ingestion created the registry.
    pub created_registry: bool,
}

impl IngestReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing observable changed.
    pub fn is_noop(&self) -> bool {
        self.registered.is_empty() && !self.created_registry
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}
