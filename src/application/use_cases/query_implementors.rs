use std::sync::Arc;

use tokio::sync::oneshot;

use crate::application::ImplementorRegistry;
use crate::domain::{
    DomainError, ImplementedInterface, ImplementorLookup, ImplementorSet, InterfaceId,
    ReadyCallback, RegistrationId, RegistrySnapshot, RegistryStats,
};

/// Consumer-facing queries: forward and reverse lookups plus readiness waits.
pub struct QueryImplementorsUseCase {
    registry: Arc<dyn ImplementorRegistry>,
}

impl QueryImplementorsUseCase {
    pub fn new(registry: Arc<dyn ImplementorRegistry>) -> Self {
        Self { registry }
    }

    pub async fn implementors(&self, interface: &str) -> Result<ImplementorLookup, DomainError> {
        let id = InterfaceId::parse(interface)?;
        Ok(self.registry.lookup(&id).await)
    }

    /// Interfaces implemented by `type_name`, matched by qualified or bare name.
    pub async fn implemented_by(
        &self,
        type_name: &str,
    ) -> Result<Vec<ImplementedInterface>, DomainError> {
        let type_name = type_name.trim();
        if type_name.is_empty() {
            return Err(DomainError::invalid_input("type name is empty"));
        }

        Ok(self
            .registry
            .snapshot()
            .await
            .map(|snapshot| snapshot.implemented_by(type_name))
            .unwrap_or_default())
    }

    pub async fn stats(&self) -> RegistryStats {
        self.registry
            .snapshot()
            .await
            .map(|snapshot| snapshot.stats())
            .unwrap_or_default()
    }

    pub async fn on_ready(&self, callback: ReadyCallback) -> RegistrationId {
        self.registry.on_ready(callback).await
    }

    /// Resolves once the registry exists.
    pub async fn ready(&self) -> Result<RegistrySnapshot, DomainError> {
        let (tx, rx) = oneshot::channel();
        self.registry
            .on_ready(Box::new(move |snapshot| {
                let _ = tx.send(snapshot);
            }))
            .await;

        rx.await
            .map_err(|_| DomainError::internal("readiness callback dropped before firing"))
    }

    /// Registers interest in `interface`; the receiver resolves when it is registered.
    ///
    /// Withdraw the returned id if the receiver is abandoned early.
    pub async fn subscribe(
        &self,
        interface: &InterfaceId,
    ) -> (RegistrationId, oneshot::Receiver<Arc<ImplementorSet>>) {
        let (tx, rx) = oneshot::channel();
        let id = self
            .registry
            .on_registered(
                interface,
                Box::new(move |set| {
                    let _ = tx.send(set);
                }),
            )
            .await;
        (id, rx)
    }

    pub async fn withdraw(&self, registration: RegistrationId) -> bool {
        self.registry.withdraw(registration).await
    }
}
