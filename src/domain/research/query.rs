//! Query and session identifiers

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ResearchError;

/// Maximum accepted query length, in characters
pub const MAX_QUERY_CHARS: usize = 2000;

/// A trimmed, non-empty research question
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Query(String);

impl Query {
    /// Validate and normalize a raw query
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ResearchError> {
        let trimmed = raw.as_ref().trim();

        if trimmed.is_empty() {
            return Err(ResearchError::validation("Query must not be empty"));
        }

        if trimmed.chars().count() > MAX_QUERY_CHARS {
            return Err(ResearchError::validation(format!(
                "Query exceeds {} characters",
                MAX_QUERY_CHARS
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Query {
    type Error = ResearchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Query> for String {
    fn from(query: Query) -> Self {
        query.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque session token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value.trim().to_string())
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
