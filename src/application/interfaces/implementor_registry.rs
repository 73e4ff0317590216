use async_trait::async_trait;

use crate::domain::{
    DomainError, Fragment, ImplementorLookup, IngestReport, InterfaceId, ReadyCallback,
    RegisteredCallback, RegistrationId, RegistrySnapshot,
};

/// Session-scoped store of interface → implementor facts.
///
/// Entries are only ever added. A lookup for an interface whose fragment has
/// not been ingested yields [`ImplementorLookup::Unknown`].
#[async_trait]
pub trait ImplementorRegistry: Send + Sync {
    /// Merge a decoded fragment. The first ingestion creates the registry.
    ///
    /// An interface already registered with a different payload keeps its
    /// original entry and is reported as a conflict.
    async fn ingest(&self, fragment: Fragment) -> Result<IngestReport, DomainError>;

    /// Implementors of `interface`, or `Unknown` if not yet registered.
    async fn lookup(&self, interface: &InterfaceId) -> ImplementorLookup;

    /// Current contents, or `None` before the first ingestion.
    async fn snapshot(&self) -> Option<RegistrySnapshot>;

    /// Run `callback` once the registry exists. Fires immediately if it already does.
    async fn on_ready(&self, callback: ReadyCallback) -> RegistrationId;

    /// Run `callback` once `interface` is registered. Fires immediately if it already is.
    async fn on_registered(
        &self,
        interface: &InterfaceId,
        callback: RegisteredCallback,
    ) -> RegistrationId;

    /// Cancel a pending registration. Returns false if it already fired.
    async fn withdraw(&self, registration: RegistrationId) -> bool;
}
