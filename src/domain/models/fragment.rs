use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ImplementorSet, InterfaceId};
use crate::domain::DomainError;

/// Encoding of a fragment on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentFormat {
    /// `{"Iface": [{"type": "..."}]}` documents.
    Json,
    /// rustdoc's `implementors/<path>/trait.<Name>.js` files.
    RustdocJs,
    Unknown,
}

impl FragmentFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "json" => FragmentFormat::Json,
            "js" => FragmentFormat::RustdocJs,
            _ => FragmentFormat::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(FragmentFormat::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentFormat::Json => "json",
            FragmentFormat::RustdocJs => "rustdoc-js",
            FragmentFormat::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FragmentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Undecoded fragment as delivered by a source.
#[derive(Debug, Clone)]
pub struct RawFragment {
    origin: String,
    format: FragmentFormat,
    content: String,
    content_hash: String,
}

impl RawFragment {
    pub fn new(origin: impl Into<String>, format: FragmentFormat, content: String) -> Self {
        let content_hash = compute_content_hash(&content);
        Self {
            origin: origin.into(),
            format,
            content,
            content_hash,
        }
    }

    /// Infers the format from the origin's extension.
    pub fn from_path(path: &Path, content: String) -> Self {
        Self::new(
            path.to_string_lossy().to_string(),
            FragmentFormat::from_path(path),
            content,
        )
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn format(&self) -> FragmentFormat {
        self.format
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Key under which a repeated delivery of this fragment is recognised.
    /// Rustdoc tables name their interface through the path, so the path is
    /// part of the key.
    pub fn delivery_key(&self) -> String {
        match self.format {
            FragmentFormat::RustdocJs => format!("{}#{}", self.origin, self.content_hash),
            _ => self.content_hash.clone(),
        }
    }
}

/// Computes SHA-256 hash of fragment content.
pub fn compute_content_hash(content: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(content.as_bytes());
    format!("{:x}", hash)
}

/// A decoded fragment: interface ids mapped to their implementor sets.
///
/// Usually holds one interface, occasionally a batch. An interface appears at
/// most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    origin: Option<String>,
    entries: Vec<(InterfaceId, ImplementorSet)>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(interface: InterfaceId, implementors: ImplementorSet) -> Self {
        Self {
            origin: None,
            entries: vec![(interface, implementors)],
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Adds an entry; a repeated interface id makes the fragment malformed.
    pub fn insert(
        &mut self,
        interface: InterfaceId,
        implementors: ImplementorSet,
    ) -> Result<(), DomainError> {
        if self.contains(&interface) {
            return Err(DomainError::malformed(format!(
                "interface '{}' appears more than once in one fragment",
                interface
            )));
        }
        self.entries.push((interface, implementors));
        Ok(())
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn contains(&self, interface: &InterfaceId) -> bool {
        self.entries.iter().any(|(id, _)| id == interface)
    }

    pub fn get(&self, interface: &InterfaceId) -> Option<&ImplementorSet> {
        self.entries
            .iter()
            .find(|(id, _)| id == interface)
            .map(|(_, set)| set)
    }

    pub fn entries(&self) -> &[(InterfaceId, ImplementorSet)] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<(InterfaceId, ImplementorSet)> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ImplementorDescriptor;

    fn id(raw: &str) -> InterfaceId {
        InterfaceId::parse(raw).unwrap()
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            FragmentFormat::from_path(Path::new("out/Handler.json")),
            FragmentFormat::Json
        );
        assert_eq!(
            FragmentFormat::from_path(Path::new("implementors/iron/middleware/trait.Handler.js")),
            FragmentFormat::RustdocJs
        );
        assert_eq!(
            FragmentFormat::from_path(Path::new("README.md")),
            FragmentFormat::Unknown
        );
    }

    #[test]
    fn test_raw_fragment_hash_tracks_content() {
        let a = RawFragment::new("a.json", FragmentFormat::Json, "{}".to_string());
        let b = RawFragment::new("b.json", FragmentFormat::Json, "{}".to_string());
        let c = RawFragment::new("c.json", FragmentFormat::Json, "{\"X\": []}".to_string());

        assert_eq!(a.content_hash().len(), 64);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn test_delivery_key_includes_path_for_rustdoc_tables() {
        let content = "implementors[\"iron\"] = [];".to_string();
        let handler = RawFragment::new("iron/trait.Handler.js", FragmentFormat::RustdocJs, content.clone());
        let plugin = RawFragment::new("iron/trait.Plugin.js", FragmentFormat::RustdocJs, content);
        assert_ne!(handler.delivery_key(), plugin.delivery_key());

        let a = RawFragment::new("a.json", FragmentFormat::Json, "{}".to_string());
        let b = RawFragment::new("b.json", FragmentFormat::Json, "{}".to_string());
        assert_eq!(a.delivery_key(), b.delivery_key());
    }

    #[test]
    fn test_insert_rejects_repeated_interface() {
        let mut fragment = Fragment::new();
        fragment
            .insert(
                id("Handler"),
                ImplementorSet::new(vec![ImplementorDescriptor::new("A")]),
            )
            .unwrap();

        let err = fragment
            .insert(id("Handler"), ImplementorSet::empty())
            .unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(fragment.len(), 1);
        assert_eq!(fragment.get(&id("Handler")).map(|s| s.len()), Some(1));
    }
}
