use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

const PATH_SEPARATOR: &str = "::";

/// Fully qualified name of a declared interface (trait).
///
/// A bare name such as `Handler` is accepted as well as a path such as
/// `iron::middleware::Handler`. Whitespace and empty path segments are
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InterfaceId(String);

impl InterfaceId {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_input("interface id is empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(DomainError::invalid_input(format!(
                "interface id '{}' contains whitespace",
                trimmed
            )));
        }
        if trimmed.split(PATH_SEPARATOR).any(str::is_empty) {
            return Err(DomainError::invalid_input(format!(
                "interface id '{}' has an empty path segment",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Builds an id from path segments, e.g. `["iron", "middleware", "Handler"]`.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR);
        Self::parse(&joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The interface name without its module path.
    pub fn name(&self) -> &str {
        self.0.rsplit(PATH_SEPARATOR).next().unwrap_or(&self.0)
    }

    /// The leading path segment, when the id is qualified.
    pub fn crate_name(&self) -> Option<&str> {
        self.0
            .split_once(PATH_SEPARATOR)
            .map(|(krate, _)| krate)
    }

    pub fn is_qualified(&self) -> bool {
        self.0.contains(PATH_SEPARATOR)
    }
}

impl TryFrom<String> for InterfaceId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InterfaceId> for String {
    fn from(id: InterfaceId) -> Self {
        id.0
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
