use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::{FragmentDecoder, ImplementorRegistry};
use crate::domain::{DomainError, Fragment, IngestReport, RawFragment};

/// Entry point a loader calls for every fragment it receives: decode, then
/// merge into the registry.
pub struct IngestFragmentUseCase {
    registry: Arc<dyn ImplementorRegistry>,
    decoders: Vec<Arc<dyn FragmentDecoder>>,
}

impl IngestFragmentUseCase {
    pub fn new(
        registry: Arc<dyn ImplementorRegistry>,
        decoders: Vec<Arc<dyn FragmentDecoder>>,
    ) -> Self {
        Self { registry, decoders }
    }

    /// Decodes `raw` and ingests it.
    ///
    /// A malformed fragment is rejected before the registry is touched, so
    /// previously registered interfaces are never affected.
    pub async fn execute(&self, raw: &RawFragment) -> Result<IngestReport, DomainError> {
        let decoder = self
            .decoders
            .iter()
            .find(|decoder| decoder.supports(raw))
            .ok_or_else(|| {
                DomainError::malformed(format!(
                    "no decoder for {} fragment {}",
                    raw.format(),
                    raw.origin()
                ))
            })?;

        let fragment = match decoder.decode(raw) {
            Ok(fragment) => fragment.with_origin(raw.origin()),
            Err(e) => {
                warn!("Rejected fragment {}: {}", raw.origin(), e);
                return Err(e);
            }
        };

        debug!(
            "Decoded {} fragment {} ({} interfaces)",
            raw.format(),
            raw.origin(),
            fragment.len()
        );

        self.ingest(fragment).await
    }

    /// Ingests an already decoded fragment.
    pub async fn ingest(&self, fragment: Fragment) -> Result<IngestReport, DomainError> {
        let origin = fragment.origin().unwrap_or("<inline>").to_string();
        let report = self.registry.ingest(fragment).await?;

        if report.is_noop() {
            debug!("Ingested {}: nothing new", origin);
            return Ok(report);
        }
        debug!(
            "Ingested {}: {} registered, {} unchanged, {} conflicts",
            origin,
            report.registered.len(),
            report.unchanged.len(),
            report.conflicts.len()
        );

        Ok(report)
    }
}
