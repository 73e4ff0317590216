use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures_util::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::{FragmentSource, IngestFragmentUseCase};
use crate::domain::{DomainError, IngestReport, LoadSummary};

pub const DEFAULT_LOAD_CONCURRENCY: usize = 8;

enum FragmentOutcome {
    Ingested(IngestReport),
    Skipped,
    Failed { origin: String, reason: String },
}

/// Fetches every fragment a source offers and ingests each one independently.
///
/// Fragments complete in whatever order their fetches finish. One fragment
/// failing never stops the others.
pub struct LoadFragmentsUseCase {
    source: Arc<dyn FragmentSource>,
    ingest: Arc<IngestFragmentUseCase>,
    concurrency: usize,
    show_progress: bool,
    ingested_hashes: Mutex<HashSet<String>>,
}

impl LoadFragmentsUseCase {
    pub fn new(source: Arc<dyn FragmentSource>, ingest: Arc<IngestFragmentUseCase>) -> Self {
        Self {
            source,
            ingest,
            concurrency: DEFAULT_LOAD_CONCURRENCY,
            show_progress: false,
            ingested_hashes: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub async fn execute(&self) -> Result<LoadSummary, DomainError> {
        let start_time = Instant::now();
        let locators = self.source.list().await?;
        let total = locators.len();
        info!("Found {} fragments to load", total);

        let progress_bar = if self.show_progress {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .map_err(|e| DomainError::internal(format!("progress template: {}", e)))?
                    .progress_chars("#>-"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let outcomes: Vec<FragmentOutcome> = stream::iter(locators)
            .map(|locator| {
                let progress_bar = progress_bar.clone();
                async move {
                    progress_bar.set_message(locator.clone());
                    let outcome = self.load_one(&locator).await;
                    progress_bar.inc(1);
                    outcome
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        progress_bar.finish_and_clear();

        let mut summary = LoadSummary {
            fragments_seen: total,
            ..LoadSummary::default()
        };
        for outcome in outcomes {
            match outcome {
                FragmentOutcome::Ingested(report) => summary.record_ingested(report),
                FragmentOutcome::Skipped => summary.record_skipped(),
                FragmentOutcome::Failed { origin, reason } => {
                    summary.record_failure(origin, reason)
                }
            }
        }

        info!(
            "Loaded {} of {} fragments in {:.2?} ({} interfaces, {} skipped, {} failed, {} conflicts)",
            summary.fragments_ingested,
            total,
            start_time.elapsed(),
            summary.interfaces_registered,
            summary.fragments_skipped,
            summary.failures.len(),
            summary.conflicts.len()
        );

        Ok(summary)
    }

    async fn load_one(&self, locator: &str) -> FragmentOutcome {
        let raw = match self.source.fetch(locator).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to fetch fragment {}: {}", locator, e);
                return FragmentOutcome::Failed {
                    origin: locator.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        let delivery_key = raw.delivery_key();
        if !self.ingested_hashes.lock().await.insert(delivery_key.clone()) {
            debug!("Skipping re-delivered fragment {}", locator);
            return FragmentOutcome::Skipped;
        }

        match self.ingest.execute(&raw).await {
            Ok(report) => FragmentOutcome::Ingested(report),
            Err(e) => {
                self.ingested_hashes.lock().await.remove(&delivery_key);
                FragmentOutcome::Failed {
                    origin: raw.origin().to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use async_trait::async_trait;

    use crate::application::{FragmentDecoder, ImplementorRegistry};
    use crate::connector::{InMemoryImplementorRegistry, JsonFragmentDecoder};
    use crate::domain::{
        Fragment, ImplementorLookup, InterfaceId, RawFragment, ReadyCallback, RegisteredCallback,
        RegistrationId, RegistrySnapshot,
    };

    struct StaticSource {
        fragments: Vec<(String, String)>,
    }

    #[async_trait]
    impl FragmentSource for StaticSource {
        async fn list(&self) -> Result<Vec<String>, DomainError> {
            Ok(self.fragments.iter().map(|(locator, _)| locator.clone()).collect())
        }

        async fn fetch(&self, locator: &str) -> Result<RawFragment, DomainError> {
            self.fragments
                .iter()
                .find(|(candidate, _)| candidate == locator)
                .map(|(locator, content)| RawFragment::from_path(Path::new(locator), content.clone()))
                .ok_or_else(|| DomainError::not_found(locator.to_string()))
        }
    }

    /// Yields before every ingestion so concurrent loads interleave.
    struct YieldingRegistry {
        inner: InMemoryImplementorRegistry,
    }

    #[async_trait]
    impl ImplementorRegistry for YieldingRegistry {
        async fn ingest(&self, fragment: Fragment) -> Result<IngestReport, DomainError> {
            tokio::task::yield_now().await;
            self.inner.ingest(fragment).await
        }

        async fn lookup(&self, interface: &InterfaceId) -> ImplementorLookup {
            self.inner.lookup(interface).await
        }

        async fn snapshot(&self) -> Option<RegistrySnapshot> {
            self.inner.snapshot().await
        }

        async fn on_ready(&self, callback: ReadyCallback) -> RegistrationId {
            self.inner.on_ready(callback).await
        }

        async fn on_registered(
            &self,
            interface: &InterfaceId,
            callback: RegisteredCallback,
        ) -> RegistrationId {
            self.inner.on_registered(interface, callback).await
        }

        async fn withdraw(&self, registration: RegistrationId) -> bool {
            self.inner.withdraw(registration).await
        }
    }

    fn load_use_case(fragments: Vec<(&str, &str)>, concurrency: usize) -> LoadFragmentsUseCase {
        let registry = Arc::new(YieldingRegistry {
            inner: InMemoryImplementorRegistry::new(),
        });
        let decoders: Vec<Arc<dyn FragmentDecoder>> = vec![Arc::new(JsonFragmentDecoder::new())];
        let ingest = Arc::new(IngestFragmentUseCase::new(registry, decoders));
        let source = Arc::new(StaticSource {
            fragments: fragments
                .into_iter()
                .map(|(locator, content)| (locator.to_string(), content.to_string()))
                .collect(),
        });
        LoadFragmentsUseCase::new(source, ingest).with_concurrency(concurrency)
    }

    #[tokio::test]
    async fn test_concurrent_identical_deliveries_ingest_once() {
        let content = r#"{"Handler": [{"type": "GraphQLHandler"}]}"#;
        let fragments: Vec<(String, &str)> =
            (0..8).map(|i| (format!("copy{}.json", i), content)).collect();
        let use_case = load_use_case(
            fragments.iter().map(|(l, c)| (l.as_str(), *c)).collect(),
            8,
        );

        let summary = use_case.execute().await.expect("load");

        assert_eq!(summary.fragments_seen, 8);
        assert_eq!(summary.fragments_ingested, 1);
        assert_eq!(summary.fragments_skipped, 7);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_not_remembered() {
        let use_case = load_use_case(
            vec![
                ("good.json", r#"{"Handler": []}"#),
                ("bad.json", r#"{"Handler": 1}"#),
            ],
            2,
        );

        let first = use_case.execute().await.expect("first load");
        assert_eq!(first.fragments_ingested, 1);
        assert_eq!(first.failures.len(), 1);

        let second = use_case.execute().await.expect("second load");
        assert_eq!(second.fragments_skipped, 1);
        assert_eq!(second.failures.len(), 1);
        assert!(second.failures[0].origin.ends_with("bad.json"));
    }
}
