use std::{marker::PhantomData, sync::Arc};

use relief_core::{DocumentId, DocumentStore, Entity, Filter, StorageError};

/// CRUD over the collection of one entity kind.
///
/// Ids are the strings handed out by the store. A string that is not a valid
/// id behaves exactly like an id with no record behind it.
pub struct Repository<E: Entity> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Every record in store order. An empty collection is not an error.
    pub fn list_all(&self) -> Result<Vec<E>, StorageError> {
        self.store
            .find(E::COLLECTION, &Filter::All)?
            .into_iter()
            .map(E::from_stored)
            .collect()
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<E>, StorageError> {
        let Some(id) = DocumentId::parse(id) else {
            return Ok(None);
        };
        self.store.find_one(E::COLLECTION, &id)?.map(E::from_stored).transpose()
    }

    /// Inserts `entity` and returns it carrying the new id. Any id it already
    /// carried is discarded.
    pub fn create(&self, mut entity: E) -> Result<E, StorageError> {
        let body = entity.to_document()?;
        let id = self.store.insert(E::COLLECTION, body)?;
        entity.set_id(Some(id.to_string()));
        Ok(entity)
    }

    /// Overwrites every field of the record at `id`. The entity's own id is
    /// ignored. Returns false only when no record has that id; writing an
    /// unchanged record still counts as success.
    pub fn replace(&self, id: &str, entity: &E) -> Result<bool, StorageError> {
        let Some(id) = DocumentId::parse(id) else {
            return Ok(false);
        };
        let outcome = self.store.replace(E::COLLECTION, &id, entity.to_document()?)?;
        Ok(outcome.matched == 1)
    }

    pub fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let Some(id) = DocumentId::parse(id) else {
            return Ok(false);
        };
        Ok(self.store.delete(E::COLLECTION, &id)?.deleted == 1)
    }
}

#[cfg(test)]
mod tests {
    use relief_core::{Document, Donation, ReplaceOutcome, StoredDocument};
    use relief_memory::InMemoryStore;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    use super::*;

    fn donation(kind: &str) -> Donation {
        Donation {
            id: None,
            donation_type: kind.to_string(),
            description: "Food supplies".to_string(),
            amount: dec!(500),
            date: datetime!(2024-01-16 14:30:00 UTC),
        }
    }

    #[test]
    fn create_ignores_caller_supplied_id() {
        let repo = Repository::<Donation>::new(Arc::new(InMemoryStore::new()));
        let mut input = donation("Goods");
        input.id = Some("chosen-by-client".to_string());

        let created = repo.create(input).unwrap();
        let id = created.id.clone().unwrap();
        assert_ne!(id, "chosen-by-client");
        assert!(DocumentId::parse(&id).is_some());
        assert!(repo.get_by_id("chosen-by-client").unwrap().is_none());
    }

    #[test]
    fn no_op_replace_still_succeeds() {
        let repo = Repository::<Donation>::new(Arc::new(InMemoryStore::new()));
        let created = repo.create(donation("Money")).unwrap();
        let id = created.id.clone().unwrap();
        assert!(repo.replace(&id, &created).unwrap());
        assert!(repo.replace(&id, &created).unwrap());
    }

    /// Store that fails every call, standing in for a lost connection.
    struct Unreachable;

    impl DocumentStore for Unreachable {
        fn find(&self, _: &str, _: &Filter) -> Result<Vec<StoredDocument>, StorageError> {
            Err(StorageError::Backend("connection refused".to_string()))
        }
        fn insert(&self, _: &str, _: Document) -> Result<DocumentId, StorageError> {
            Err(StorageError::Backend("connection refused".to_string()))
        }
        fn replace(&self, _: &str, _: &DocumentId, _: Document) -> Result<ReplaceOutcome, StorageError> {
            Err(StorageError::Backend("connection refused".to_string()))
        }
        fn delete(&self, _: &str, _: &DocumentId) -> Result<relief_core::DeleteOutcome, StorageError> {
            Err(StorageError::Backend("connection refused".to_string()))
        }
        fn collections(&self) -> Result<Vec<String>, StorageError> {
            Err(StorageError::Backend("connection refused".to_string()))
        }
    }

    #[test]
    fn store_failures_propagate() {
        let repo = Repository::<Donation>::new(Arc::new(Unreachable));
        assert!(matches!(repo.list_all(), Err(StorageError::Backend(_))));
        assert!(matches!(repo.create(donation("Money")), Err(StorageError::Backend(_))));
        let id = DocumentId::generate().to_string();
        assert!(matches!(repo.get_by_id(&id), Err(StorageError::Backend(_))));
        assert!(matches!(repo.delete(&id), Err(StorageError::Backend(_))));
    }

    #[test]
    fn malformed_ids_never_reach_the_store() {
        let repo = Repository::<Donation>::new(Arc::new(Unreachable));
        assert!(repo.get_by_id("1").unwrap().is_none());
        assert!(!repo.replace("1", &donation("Money")).unwrap());
        assert!(!repo.delete("not-an-id").unwrap());
    }
}
