use serde::{Deserialize, Serialize};

use super::{IngestReport, RegistrationConflict};

/// A fragment that could not be fetched or decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentFailure {
    pub origin: String,
    pub reason: String,
}

/// Totals for one pass over a fragment source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub fragments_seen: usize,
    pub fragments_ingested: usize,
    /// Byte-identical re-deliveries skipped without decoding.
    pub fragments_skipped: usize,
    pub interfaces_registered: usize,
    pub failures: Vec<FragmentFailure>,
    pub conflicts: Vec<RegistrationConflict>,
}

impl LoadSummary {
    pub fn record_ingested(&mut self, report: IngestReport) {
        self.fragments_ingested += 1;
        self.interfaces_registered += report.registered.len();
        self.conflicts.extend(report.conflicts);
    }

    pub fn record_failure(&mut self, origin: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(FragmentFailure {
            origin: origin.into(),
            reason: reason.into(),
        });
    }

    pub fn record_skipped(&mut self) {
        self.fragments_skipped += 1;
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.conflicts.is_empty()
    }
}
