//! In-memory document store backend for Relief.

use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use relief_core::{
    validate_collection, DeleteOutcome, Document, DocumentId, DocumentStore, Filter, ReplaceOutcome, StorageError,
    StoredDocument,
};

/// Collections kept in insertion order. Contents are lost when the process exits.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Vec<StoredDocument>>>, StorageError> {
        self.collections.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Vec<StoredDocument>>>, StorageError> {
        self.collections.write().map_err(|_| StorageError::LockPoisoned)
    }
}

impl DocumentStore for InMemoryStore {
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<StoredDocument>, StorageError> {
        validate_collection(collection)?;
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(&d.id)).cloned().collect())
            .unwrap_or_default())
    }

    fn insert(&self, collection: &str, body: Document) -> Result<DocumentId, StorageError> {
        validate_collection(collection)?;
        let id = DocumentId::generate();
        self.write()?
            .entry(collection.to_string())
            .or_default()
            .push(StoredDocument::new(id, body));
        tracing::debug!(collection, %id, "Document inserted");
        Ok(id)
    }

    fn replace(&self, collection: &str, id: &DocumentId, body: Document) -> Result<ReplaceOutcome, StorageError> {
        validate_collection(collection)?;
        let mut collections = self.write()?;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == *id));

        let outcome = match existing {
            None => ReplaceOutcome::default(),
            Some(doc) if doc.body == body => ReplaceOutcome { matched: 1, modified: 0 },
            Some(doc) => {
                doc.body = body;
                ReplaceOutcome { matched: 1, modified: 1 }
            }
        };
        tracing::debug!(collection, %id, matched = outcome.matched, modified = outcome.modified, "Document replaced");
        Ok(outcome)
    }

    fn delete(&self, collection: &str, id: &DocumentId) -> Result<DeleteOutcome, StorageError> {
        validate_collection(collection)?;
        let mut collections = self.write()?;
        let deleted = match collections.get_mut(collection) {
            Some(docs) => {
                let before = docs.len();
                docs.retain(|d| d.id != *id);
                (before - docs.len()) as u64
            }
            None => 0,
        };
        tracing::debug!(collection, %id, deleted, "Document deleted");
        Ok(DeleteOutcome { deleted })
    }

    fn collections(&self) -> Result<Vec<String>, StorageError> {
        let mut names: Vec<String> = self
            .read()?
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}
