use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::application::FragmentDecoder;
use crate::domain::{
    DomainError, Fragment, FragmentFormat, ImplementorDescriptor, ImplementorSet, InterfaceId,
    RawFragment,
};

/// Key of the optional named wrapper object around the mapping.
const WRAPPER_KEY: &str = "implementors";

/// One element of an implementor array in a JSON fragment.
#[derive(Debug, Deserialize)]
struct DescriptorRecord {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    type_params: Vec<String>,
    #[serde(default, alias = "link")]
    href: Option<String>,
    #[serde(default, rename = "crate")]
    crate_name: Option<String>,
    #[serde(flatten)]
    annotations: BTreeMap<String, Value>,
}

/// Decodes `{"Iface": [{"type": "Impl", ...}], ...}` fragments.
///
/// The mapping may be wrapped as `{"implementors": {...}}`. Fields other than
/// `type`, `type_params`, `href`/`link` and `crate` are kept as annotations.
pub struct JsonFragmentDecoder;

impl JsonFragmentDecoder {
    pub fn new() -> Self {
        Self
    }

    fn decode_value(&self, value: Value) -> Result<Fragment, DomainError> {
        let mut mapping = match value {
            Value::Object(map) => map,
            other => {
                return Err(DomainError::malformed(format!(
                    "expected a top-level object, found {}",
                    json_kind(&other)
                )))
            }
        };

        if mapping.len() == 1 && mapping.get(WRAPPER_KEY).is_some_and(Value::is_object) {
            if let Some(Value::Object(inner)) = mapping.remove(WRAPPER_KEY) {
                mapping = inner;
            }
        }

        let mut fragment = Fragment::new();
        for (key, value) in mapping {
            let interface = InterfaceId::parse(&key)
                .map_err(|e| DomainError::malformed(format!("bad interface key '{}': {}", key, e)))?;
            let implementors = decode_set(&interface, value)?;
            fragment.insert(interface, implementors)?;
        }

        Ok(fragment)
    }
}

impl Default for JsonFragmentDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentDecoder for JsonFragmentDecoder {
    fn format(&self) -> FragmentFormat {
        FragmentFormat::Json
    }

    fn decode(&self, raw: &RawFragment) -> Result<Fragment, DomainError> {
        let value: Value = serde_json::from_str(raw.content())
            .map_err(|e| DomainError::malformed(format!("invalid JSON: {}", e)))?;
        self.decode_value(value)
    }
}

fn decode_set(interface: &InterfaceId, value: Value) -> Result<ImplementorSet, DomainError> {
    let elements = match value {
        Value::Array(elements) => elements,
        other => {
            return Err(DomainError::malformed(format!(
                "implementors of '{}' must be an array, found {}",
                interface,
                json_kind(&other)
            )))
        }
    };

    let mut implementors = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        let record: DescriptorRecord = serde_json::from_value(element).map_err(|e| {
            DomainError::malformed(format!(
                "implementor #{} of '{}' is invalid: {}",
                index, interface, e
            ))
        })?;
        implementors.push(to_descriptor(interface, index, record)?);
    }

    Ok(ImplementorSet::new(implementors))
}

fn to_descriptor(
    interface: &InterfaceId,
    index: usize,
    record: DescriptorRecord,
) -> Result<ImplementorDescriptor, DomainError> {
    let type_name = record.type_name.trim();
    if type_name.is_empty() {
        return Err(DomainError::malformed(format!(
            "implementor #{} of '{}' has an empty type",
            index, interface
        )));
    }

    let mut descriptor =
        ImplementorDescriptor::new(type_name).with_type_params(record.type_params);
    if let Some(href) = record.href {
        descriptor = descriptor.with_doc_link(href);
    }
    if let Some(crate_name) = record.crate_name {
        descriptor = descriptor.with_crate(crate_name);
    }
    for (key, value) in record.annotations {
        let value = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        descriptor = descriptor.with_annotation(key, value);
    }

    Ok(descriptor)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
