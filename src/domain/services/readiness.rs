use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{ImplementorSet, InterfaceId, RegistrySnapshot};

/// Invoked once with the registry as it stood when the callback fired.
pub type ReadyCallback = Box<dyn FnOnce(RegistrySnapshot) + Send + Sync + 'static>;

/// Invoked once with the implementor set of the interface it waited for.
pub type RegisteredCallback = Box<dyn FnOnce(Arc<ImplementorSet>) + Send + Sync + 'static>;

/// Handle returned for every callback registration; used to withdraw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistrationId(u64);

impl RegistrationId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether the registry exists yet, plus the consumers waiting for it.
///
/// `NotReady` holds every pending callback in registration order; the move to
/// `Ready` hands them all out exactly once. `Ready` is terminal.
pub enum Readiness {
    NotReady {
        pending: Vec<(RegistrationId, ReadyCallback)>,
    },
    Ready,
}

impl Readiness {
    pub fn new() -> Self {
        Readiness::NotReady {
            pending: Vec::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        match self {
            Readiness::NotReady { pending } => pending.len(),
            Readiness::Ready => 0,
        }
    }

    /// Queues `callback` while not ready. When already ready the callback is
    /// handed back so the caller can invoke it straight away.
    pub fn enqueue(&mut self, id: RegistrationId, callback: ReadyCallback) -> Option<ReadyCallback> {
        match self {
            Readiness::NotReady { pending } => {
                pending.push((id, callback));
                None
            }
            Readiness::Ready => Some(callback),
        }
    }

    /// Removes a pending callback. Returns false if it already fired or never existed.
    pub fn withdraw(&mut self, id: RegistrationId) -> bool {
        match self {
            Readiness::NotReady { pending } => {
                let before = pending.len();
                pending.retain(|(pending_id, _)| *pending_id != id);
                pending.len() != before
            }
            Readiness::Ready => false,
        }
    }

    /// Transitions to `Ready` and drains the queue. Later calls return nothing.
    pub fn mark_ready(&mut self) -> Vec<ReadyCallback> {
        match std::mem::replace(self, Readiness::Ready) {
            Readiness::NotReady { pending } => pending.into_iter().map(|(_, cb)| cb).collect(),
            Readiness::Ready => Vec::new(),
        }
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::NotReady { pending } => f
                .debug_struct("NotReady")
                .field("pending", &pending.len())
                .finish(),
            Readiness::Ready => f.write_str("Ready"),
        }
    }
}

/// Consumers waiting for one specific interface to be registered.
#[derive(Default)]
pub struct InterfaceWaiters {
    waiting: HashMap<InterfaceId, Vec<(RegistrationId, RegisteredCallback)>>,
}

impl InterfaceWaiters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, interface: InterfaceId, id: RegistrationId, callback: RegisteredCallback) {
        self.waiting.entry(interface).or_default().push((id, callback));
    }

    pub fn withdraw(&mut self, id: RegistrationId) -> bool {
        let mut removed = false;
        self.waiting.retain(|_, callbacks| {
            let before = callbacks.len();
            callbacks.retain(|(pending_id, _)| *pending_id != id);
            removed |= callbacks.len() != before;
            !callbacks.is_empty()
        });
        removed
    }

    /// Removes and returns every callback waiting on `interface`.
    pub fn take(&mut self, interface: &InterfaceId) -> Vec<RegisteredCallback> {
        self.waiting
            .remove(interface)
            .map(|callbacks| callbacks.into_iter().map(|(_, cb)| cb).collect())
            .unwrap_or_default()
    }

    pub fn pending_count(&self) -> usize {
        self.waiting.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_callback(counter: &Arc<AtomicUsize>) -> ReadyCallback {
        let counter = Arc::clone(counter);
        Box::new(move |_snapshot| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_queued_callbacks_drain_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut readiness = Readiness::new();

        assert!(readiness
            .enqueue(RegistrationId::new(1), counting_callback(&fired))
            .is_none());
        assert!(readiness
            .enqueue(RegistrationId::new(2), counting_callback(&fired))
            .is_none());
        assert_eq!(readiness.pending_count(), 2);

        for cb in readiness.mark_ready() {
            cb(RegistrySnapshot::new());
        }
        assert_eq!(fired.load(Ordering::SeqCst), 2);
        assert!(matches!(readiness, Readiness::Ready));
        assert!(readiness.mark_ready().is_empty());
    }

    #[test]
    fn test_enqueue_after_ready_hands_callback_back() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut readiness = Readiness::new();
        readiness.mark_ready();

        let returned = readiness
            .enqueue(RegistrationId::new(7), counting_callback(&fired))
            .expect("ready state returns the callback");
        returned(RegistrySnapshot::new());

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(readiness.pending_count(), 0);
    }

    #[test]
    fn test_withdraw_pending() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut readiness = Readiness::new();
        readiness.enqueue(RegistrationId::new(1), counting_callback(&fired));
        readiness.enqueue(RegistrationId::new(2), counting_callback(&fired));

        assert!(readiness.withdraw(RegistrationId::new(1)));
        assert!(!readiness.withdraw(RegistrationId::new(1)));

        for cb in readiness.mark_ready() {
            cb(RegistrySnapshot::new());
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!readiness.withdraw(RegistrationId::new(2)));
    }

    #[test]
    fn test_interface_waiters() {
        let handler = InterfaceId::parse("Handler").unwrap();
        let other = InterfaceId::parse("Other").unwrap();
        let mut waiters = InterfaceWaiters::new();

        waiters.enqueue(handler.clone(), RegistrationId::new(1), Box::new(|_| {}));
        waiters.enqueue(handler.clone(), RegistrationId::new(2), Box::new(|_| {}));
        waiters.enqueue(other.clone(), RegistrationId::new(3), Box::new(|_| {}));
        assert_eq!(waiters.pending_count(), 3);

        assert!(waiters.withdraw(RegistrationId::new(3)));
        assert!(waiters.take(&other).is_empty());

        assert_eq!(waiters.take(&handler).len(), 2);
        assert!(waiters.take(&handler).is_empty());
        assert_eq!(waiters.pending_count(), 0);
    }
}
