use anyhow::Result;

use crate::cli::OutputFormat;
use crate::domain::LoadSummary;

use super::super::Container;

pub struct CheckController<'a> {
    container: &'a Container,
}

impl<'a> CheckController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Fails when any fragment could not be fetched or decoded. Conflicting
    /// re-deliveries are reported but do not fail the check.
    pub async fn check(&self, format: OutputFormat) -> Result<String> {
        let summary = self.container.loaded().await?;

        let report = match format {
            OutputFormat::Json => serde_json::to_string_pretty(&summary)?,
            OutputFormat::Text => self.format_summary(&summary),
        };

        if !summary.failures.is_empty() {
            anyhow::bail!("{}", report);
        }
        Ok(report)
    }

    fn format_summary(&self, summary: &LoadSummary) -> String {
        let mut out = format!(
            "Fragment check: {}\n\
             ─────────────────────────────────────────\n\
             Fragments seen        : {}\n\
             Fragments ingested    : {}\n\
             Duplicates skipped    : {}\n\
             Interfaces registered : {}\n",
            self.container.fragments_dir(),
            summary.fragments_seen,
            summary.fragments_ingested,
            summary.fragments_skipped,
            summary.interfaces_registered
        );

        if !summary.failures.is_empty() {
            out.push_str(&format!("\nMalformed ({}):\n", summary.failures.len()));
            for failure in &summary.failures {
                out.push_str(&format!("  ✗ {}: {}\n", failure.origin, failure.reason));
            }
        }

        if !summary.conflicts.is_empty() {
            out.push_str(&format!("\nConflicts ({}):\n", summary.conflicts.len()));
            for conflict in &summary.conflicts {
                out.push_str(&format!(
                    "  ! {} kept {} implementor(s), rejected {} from {}\n",
                    conflict.interface,
                    conflict.kept_implementors,
                    conflict.rejected_implementors,
                    conflict.origin.as_deref().unwrap_or("<unnamed>")
                ));
            }
        }

        if summary.is_clean() {
            out.push_str("\nAll fragments are well formed.\n");
        }
        out
    }
}
