use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

use crate::application::{FragmentDecoder, FragmentSource, ImplementorRegistry};
use crate::domain::LoadSummary;
use crate::{
    FsFragmentSource, IngestFragmentUseCase, InMemoryImplementorRegistry, JsonFragmentDecoder,
    LoadFragmentsUseCase, QueryImplementorsUseCase, RustdocFragmentDecoder,
};

type LoadingHandle = Shared<BoxFuture<'static, Result<LoadSummary, String>>>;

pub struct ContainerConfig {
    pub fragments_dir: String,
    pub concurrency: usize,
    /// Draw a progress bar on stderr while fragments load.
    pub show_progress: bool,
}

/// Wires one session: a fresh registry, the decoders, and a background task
/// loading every fragment under `fragments_dir`.
pub struct Container {
    registry: Arc<InMemoryImplementorRegistry>,
    loading: LoadingHandle,
    config: ContainerConfig,
}

impl Container {
    /// Must be called inside a tokio runtime; loading starts immediately.
    pub async fn new(config: ContainerConfig) -> Result<Self> {
        let registry = Arc::new(InMemoryImplementorRegistry::new());
        debug!("Registry session {}", registry.session_id());

        let decoders: Vec<Arc<dyn FragmentDecoder>> = vec![
            Arc::new(JsonFragmentDecoder::new()),
            Arc::new(RustdocFragmentDecoder::new()),
        ];
        let ingest_use_case = Arc::new(IngestFragmentUseCase::new(
            registry.clone() as Arc<dyn ImplementorRegistry>,
            decoders,
        ));

        let source: Arc<dyn FragmentSource> =
            Arc::new(FsFragmentSource::new(PathBuf::from(&config.fragments_dir)));
        let load_use_case = LoadFragmentsUseCase::new(source, ingest_use_case.clone())
            .with_concurrency(config.concurrency)
            .with_progress(config.show_progress);

        debug!("Loading fragments from {}", config.fragments_dir);
        let task = tokio::spawn(async move { load_use_case.execute().await });
        let loading = async move {
            match task.await {
                Ok(Ok(summary)) => Ok(summary),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(format!("fragment loading task failed: {}", e)),
            }
        }
        .boxed()
        .shared();

        Ok(Self {
            registry,
            loading,
            config,
        })
    }

    /// Resolves once every fragment has been attempted.
    pub async fn loaded(&self) -> Result<LoadSummary> {
        self.loading.clone().await.map_err(anyhow::Error::msg)
    }

    pub fn query_use_case(&self) -> QueryImplementorsUseCase {
        QueryImplementorsUseCase::new(self.registry.clone())
    }

    pub fn session_id(&self) -> &str {
        self.registry.session_id()
    }

    pub fn fragments_dir(&self) -> &str {
        &self.config.fragments_dir
    }
}
