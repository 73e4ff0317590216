use async_trait::async_trait;

use crate::domain::{DomainError, RawFragment};

/// Where fragments come from. Each locator is fetched independently.
#[async_trait]
pub trait FragmentSource: Send + Sync {
    /// Locators of every fragment currently available.
    async fn list(&self) -> Result<Vec<String>, DomainError>;

    async fn fetch(&self, locator: &str) -> Result<RawFragment, DomainError>;
}
