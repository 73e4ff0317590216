use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{ImplementorDescriptor, ImplementorSet, InterfaceId};

/// Result of asking for an interface's implementors.
///
/// `Unknown` means no fragment for the interface has been ingested yet. It is
/// never conflated with a registered empty set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImplementorLookup {
    Registered(Arc<ImplementorSet>),
    Unknown,
}

impl ImplementorLookup {
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Registered(_))
    }

    pub fn implementors(&self) -> Option<&ImplementorSet> {
        match self {
            Self::Registered(set) => Some(set),
            Self::Unknown => None,
        }
    }

}

/// An interface a type implements, found by reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementedInterface {
    pub interface: InterfaceId,
    pub implementor: ImplementorDescriptor,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub interface_count: usize,
    pub implementor_count: usize,
    pub empty_interface_count: usize,
    pub crates: Vec<String>,
}

/// Immutable view of the registry at one point in time.
///
/// Cloning is cheap; the table is shared until the next write copies it.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    entries: Arc<HashMap<InterfaceId, Arc<ImplementorSet>>>,
}

impl RegistrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, interface: &InterfaceId) -> ImplementorLookup {
        match self.entries.get(interface) {
            Some(set) => ImplementorLookup::Registered(Arc::clone(set)),
            None => ImplementorLookup::Unknown,
        }
    }

    pub fn get(&self, interface: &InterfaceId) -> Option<&Arc<ImplementorSet>> {
        self.entries.get(interface)
    }

    pub fn contains(&self, interface: &InterfaceId) -> bool {
        self.entries.contains_key(interface)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered interface ids in sorted order.
    pub fn interfaces(&self) -> Vec<&InterfaceId> {
        let mut ids: Vec<&InterfaceId> = self.entries.keys().collect();
        ids.sort();
        ids
    }

    /// Every interface whose implementor list names `type_name`, sorted by interface id.
    pub fn implemented_by(&self, type_name: &str) -> Vec<ImplementedInterface> {
        let mut found: Vec<ImplementedInterface> = self
            .entries
            .iter()
            .flat_map(|(interface, set)| {
                set.iter()
                    .filter(|d| d.matches_type(type_name))
                    .map(|d| ImplementedInterface {
                        interface: interface.clone(),
                        implementor: d.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        found.sort_by(|a, b| a.interface.cmp(&b.interface));
        found
    }

    pub fn stats(&self) -> RegistryStats {
        let crates: BTreeSet<String> = self
            .entries
            .values()
            .flat_map(|set| set.iter().filter_map(|d| d.crate_name().map(String::from)))
            .collect();

        RegistryStats {
            interface_count: self.entries.len(),
            implementor_count: self.entries.values().map(|s| s.len()).sum(),
            empty_interface_count: self.entries.values().filter(|s| s.is_empty()).count(),
            crates: crates.into_iter().collect(),
        }
    }

    /// Adds an entry unless the interface is already present. Copies the
    /// table if another snapshot still shares it.
    pub(crate) fn insert_new(&mut self, interface: InterfaceId, set: Arc<ImplementorSet>) -> bool {
        if self.entries.contains_key(&interface) {
            return false;
        }
        Arc::make_mut(&mut self.entries).insert(interface, set);
        true
    }
}
