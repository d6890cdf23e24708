use thiserror::Error;

use crate::document::{Document, DocumentId, StoredDocument};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid collection name: {0}")]
    InvalidCollection(String),
    #[error("store lock poisoned")]
    LockPoisoned,
    #[error("corrupt document {id} in {collection}")]
    CorruptDocument { collection: String, id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    ById(DocumentId),
}

impl Filter {
    pub fn matches(&self, id: &DocumentId) -> bool {
        match self {
            Filter::All => true,
            Filter::ById(wanted) => wanted == id,
        }
    }
}

/// Result of a replace-by-id. `modified` is zero when the record exists but
/// the new body equals the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaceOutcome {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteOutcome {
    pub deleted: u64,
}

/// A set of named collections of JSON documents keyed by store-assigned ids.
///
/// Reading a collection that was never written to yields no documents.
pub trait DocumentStore: Send + Sync {
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<StoredDocument>, StorageError>;
    fn insert(&self, collection: &str, body: Document) -> Result<DocumentId, StorageError>;
    fn replace(&self, collection: &str, id: &DocumentId, body: Document) -> Result<ReplaceOutcome, StorageError>;
    fn delete(&self, collection: &str, id: &DocumentId) -> Result<DeleteOutcome, StorageError>;

    /// Names of collections currently holding at least one document.
    fn collections(&self) -> Result<Vec<String>, StorageError>;

    fn find_one(&self, collection: &str, id: &DocumentId) -> Result<Option<StoredDocument>, StorageError> {
        Ok(self.find(collection, &Filter::ById(*id))?.into_iter().next())
    }
}

/// Collection names end up as table names in the SQL backends.
pub fn is_safe_collection_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn validate_collection(s: &str) -> Result<(), StorageError> {
    if !is_safe_collection_name(s) {
        return Err(StorageError::InvalidCollection(s.to_string()));
    }
    Ok(())
}
