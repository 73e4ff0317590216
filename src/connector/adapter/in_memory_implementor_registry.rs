use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::ImplementorRegistry;
use crate::domain::{
    DomainError, Fragment, ImplementorLookup, IngestReport, InterfaceId, InterfaceWaiters,
    ReadyCallback, Readiness, RegisteredCallback, RegistrationConflict, RegistrationId,
    RegistrySnapshot,
};

struct RegistryState {
    /// `None` until the first successful ingestion.
    table: Option<RegistrySnapshot>,
    readiness: Readiness,
    waiters: InterfaceWaiters,
}

/// Process-local registry for one viewing session.
///
/// Writers take the lock only to merge entries and collect due callbacks;
/// callbacks run after the lock is released, so they may query the registry.
pub struct InMemoryImplementorRegistry {
    session_id: String,
    state: RwLock<RegistryState>,
    next_registration: AtomicU64,
}

impl InMemoryImplementorRegistry {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            state: RwLock::new(RegistryState {
                table: None,
                readiness: Readiness::new(),
                waiters: InterfaceWaiters::new(),
            }),
            next_registration: AtomicU64::new(1),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn pending_registrations(&self) -> usize {
        let state = self.state.read().await;
        state.readiness.pending_count() + state.waiters.pending_count()
    }

    fn next_id(&self) -> RegistrationId {
        RegistrationId::new(self.next_registration.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for InMemoryImplementorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImplementorRegistry for InMemoryImplementorRegistry {
    async fn ingest(&self, fragment: Fragment) -> Result<IngestReport, DomainError> {
        let origin = fragment.origin().map(String::from);
        let mut report = IngestReport::new();

        let (snapshot, ready_callbacks, registered_callbacks) = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;

            if state.table.is_none() {
                info!("Creating implementor registry (session {})", self.session_id);
                report.created_registry = true;
            }
            let table = state.table.get_or_insert_with(RegistrySnapshot::new);

            for (interface, set) in fragment.into_entries() {
                match table.get(&interface) {
                    Some(existing) if **existing == set => {
                        debug!("Interface {} re-delivered unchanged", interface);
                        report.unchanged.push(interface);
                    }
                    Some(existing) => {
                        warn!(
                            "Duplicate interface {} from {}: keeping {} registered implementors, ignoring {}",
                            interface,
                            origin.as_deref().unwrap_or("<inline>"),
                            existing.len(),
                            set.len()
                        );
                        report.conflicts.push(RegistrationConflict {
                            kept_implementors: existing.len(),
                            rejected_implementors: set.len(),
                            interface,
                            origin: origin.clone(),
                        });
                    }
                    None => {
                        table.insert_new(interface.clone(), Arc::new(set));
                        report.registered.push(interface);
                    }
                }
            }

            let snapshot = table.clone();
            let ready_callbacks = state.readiness.mark_ready();
            let registered_callbacks: Vec<_> = report
                .registered
                .iter()
                .filter_map(|interface| {
                    let callbacks = state.waiters.take(interface);
                    if callbacks.is_empty() {
                        return None;
                    }
                    snapshot
                        .get(interface)
                        .map(|set| (Arc::clone(set), callbacks))
                })
                .collect();

            (snapshot, ready_callbacks, registered_callbacks)
        };

        if !ready_callbacks.is_empty() {
            debug!("Registry ready, notifying {} consumers", ready_callbacks.len());
        }
        for callback in ready_callbacks {
            let snapshot = snapshot.clone();
            run_callback("readiness", move || callback(snapshot));
        }
        for (set, callbacks) in registered_callbacks {
            for callback in callbacks {
                let set = Arc::clone(&set);
                run_callback("registration", move || callback(set));
            }
        }

        Ok(report)
    }

    async fn lookup(&self, interface: &InterfaceId) -> ImplementorLookup {
        let state = self.state.read().await;
        match &state.table {
            Some(table) => table.lookup(interface),
            None => ImplementorLookup::Unknown,
        }
    }

    async fn snapshot(&self) -> Option<RegistrySnapshot> {
        self.state.read().await.table.clone()
    }

    async fn on_ready(&self, callback: ReadyCallback) -> RegistrationId {
        let id = self.next_id();
        let due = {
            let mut state = self.state.write().await;
            match state.readiness.enqueue(id, callback) {
                Some(callback) => {
                    let snapshot = state.table.clone().unwrap_or_default();
                    Some((callback, snapshot))
                }
                None => {
                    debug!("Queued readiness callback {}", id);
                    None
                }
            }
        };

        if let Some((callback, snapshot)) = due {
            run_callback("readiness", move || callback(snapshot));
        }
        id
    }

    async fn on_registered(
        &self,
        interface: &InterfaceId,
        callback: RegisteredCallback,
    ) -> RegistrationId {
        let id = self.next_id();
        let due = {
            let mut state = self.state.write().await;
            let existing = state
                .table
                .as_ref()
                .and_then(|table| table.get(interface))
                .cloned();
            match existing {
                Some(set) => Some((callback, set)),
                None => {
                    state.waiters.enqueue(interface.clone(), id, callback);
                    debug!("Queued callback {} for interface {}", id, interface);
                    None
                }
            }
        };

        if let Some((callback, set)) = due {
            run_callback("registration", move || callback(set));
        }
        id
    }

    async fn withdraw(&self, registration: RegistrationId) -> bool {
        let mut state = self.state.write().await;
        let withdrawn =
            state.readiness.withdraw(registration) || state.waiters.withdraw(registration);
        if withdrawn {
            debug!("Withdrew registration {}", registration);
        }
        withdrawn
    }
}

/// A panicking consumer is logged and never stops the remaining ones.
fn run_callback(kind: &str, callback: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
        warn!("A {} callback panicked; remaining consumers are still notified", kind);
    }
}
