use std::{fmt::Display, str::FromStr};

use uuid::Uuid;

/// A stored record body: a JSON object without its identifier.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Store-assigned identifier. Rendered as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses either the simple or the hyphenated UUID form.
    /// Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse().ok()
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub body: Document,
}

impl StoredDocument {
    pub fn new(id: DocumentId, body: Document) -> Self {
        Self { id, body }
    }
}
