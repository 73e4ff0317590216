use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ignore::WalkBuilder;
use tracing::debug;

use crate::application::FragmentSource;
use crate::domain::{DomainError, FragmentFormat, RawFragment};

/// Serves every `.json` and `.js` file under a directory as a fragment.
pub struct FsFragmentSource {
    root: PathBuf,
}

impl FsFragmentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl FragmentSource for FsFragmentSource {
    async fn list(&self) -> Result<Vec<String>, DomainError> {
        if !self.root.is_dir() {
            return Err(DomainError::not_found(format!(
                "fragment directory {} does not exist",
                self.root.display()
            )));
        }

        let root = self.root.clone();
        let mut locators = tokio::task::spawn_blocking(move || {
            WalkBuilder::new(&root)
                .hidden(true)
                .git_ignore(true)
                .git_global(true)
                .git_exclude(true)
                .build()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_file())
                .filter(|entry| FragmentFormat::from_path(entry.path()) != FragmentFormat::Unknown)
                .map(|entry| entry.path().to_string_lossy().to_string())
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| DomainError::internal(format!("fragment walk task failed: {}", e)))?;

        locators.sort();
        debug!(
            "Found {} fragment files under {}",
            locators.len(),
            self.root.display()
        );
        Ok(locators)
    }

    async fn fetch(&self, locator: &str) -> Result<RawFragment, DomainError> {
        let path = Path::new(locator);
        let content = tokio::fs::read_to_string(path).await?;
        Ok(RawFragment::from_path(path, content))
    }
}
