use serde::{Deserialize, Serialize};

use super::ImplementorDescriptor;

/// Implementors of a single interface, in emitter order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImplementorSet {
    implementors: Vec<ImplementorDescriptor>,
}

impl ImplementorSet {
    pub fn new(implementors: Vec<ImplementorDescriptor>) -> Self {
        Self { implementors }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.implementors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.implementors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImplementorDescriptor> {
        self.implementors.iter()
    }

    pub fn as_slice(&self) -> &[ImplementorDescriptor] {
        &self.implementors
    }

    pub fn get(&self, index: usize) -> Option<&ImplementorDescriptor> {
        self.implementors.get(index)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.implementors.iter().any(|d| d.matches_type(type_name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.implementors
            .iter()
            .map(ImplementorDescriptor::qualified_name)
            .collect()
    }
}

impl From<Vec<ImplementorDescriptor>> for ImplementorSet {
    fn from(implementors: Vec<ImplementorDescriptor>) -> Self {
        Self::new(implementors)
    }
}

impl<'a> IntoIterator for &'a ImplementorSet {
    type Item = &'a ImplementorDescriptor;
    type IntoIter = std::slice::Iter<'a, ImplementorDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.implementors.iter()
    }
}
