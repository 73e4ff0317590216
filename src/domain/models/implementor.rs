use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One concrete type implementing an interface.
///
/// Presentation concerns stay out of the descriptor: the registry only sees
/// the qualified name, instantiated type parameters, a link target and
/// free-form annotations supplied by the emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementorDescriptor {
    qualified_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    type_params: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    doc_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    crate_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    annotations: BTreeMap<String, String>,
}

impl ImplementorDescriptor {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            type_params: Vec::new(),
            doc_link: None,
            crate_name: None,
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_type_params(mut self, type_params: Vec<String>) -> Self {
        self.type_params = type_params;
        self
    }

    pub fn with_doc_link(mut self, doc_link: impl Into<String>) -> Self {
        self.doc_link = Some(doc_link.into());
        self
    }

    pub fn with_crate(mut self, crate_name: impl Into<String>) -> Self {
        self.crate_name = Some(crate_name.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Type name without its module path.
    pub fn name(&self) -> &str {
        self.qualified_name
            .rsplit("::")
            .next()
            .unwrap_or(&self.qualified_name)
    }

    pub fn type_params(&self) -> &[String] {
        &self.type_params
    }

    pub fn doc_link(&self) -> Option<&str> {
        self.doc_link.as_deref()
    }

    pub fn crate_name(&self) -> Option<&str> {
        self.crate_name.as_deref()
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// True when `type_name` is either the full qualified name or the bare name.
    pub fn matches_type(&self, type_name: &str) -> bool {
        self.qualified_name == type_name || self.name() == type_name
    }

    /// `Name<A, B>` style label for plain-text output.
    pub fn display_name(&self) -> String {
        if self.type_params.is_empty() {
            self.qualified_name.clone()
        } else {
            format!("{}<{}>", self.qualified_name, self.type_params.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let descriptor = ImplementorDescriptor::new("juniper::iron_handlers::GraphQLHandler")
            .with_type_params(vec!["Query".to_string(), "Mutation".to_string()])
            .with_doc_link("juniper/iron_handlers/struct.GraphQLHandler.html")
            .with_crate("juniper")
            .with_annotation("kind", "struct");

        assert_eq!(descriptor.name(), "GraphQLHandler");
        assert_eq!(descriptor.crate_name(), Some("juniper"));
        assert_eq!(descriptor.annotation("kind"), Some("struct"));
        assert_eq!(
            descriptor.display_name(),
            "juniper::iron_handlers::GraphQLHandler<Query, Mutation>"
        );
    }

    #[test]
    fn test_matches_type() {
        let descriptor = ImplementorDescriptor::new("juniper::iron_handlers::GraphQLHandler");
        assert!(descriptor.matches_type("GraphQLHandler"));
        assert!(descriptor.matches_type("juniper::iron_handlers::GraphQLHandler"));
        assert!(!descriptor.matches_type("GraphiQLHandler"));
        assert!(!descriptor.matches_type("iron_handlers::GraphQLHandler"));
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let json = serde_json::to_string(&ImplementorDescriptor::new("Foo")).unwrap();
        assert_eq!(json, r#"{"qualified_name":"Foo"}"#);
    }
}
