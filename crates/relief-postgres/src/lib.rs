//! PostgreSQL document store backend for Relief.
//!
//! Each collection is a table with a JSONB `body` column. The blocking
//! `postgres` client runs its own runtime, so calls must not be made from
//! inside an async task.

use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use postgres::{Client, NoTls};
use relief_core::{
    validate_collection, DeleteOutcome, Document, DocumentId, DocumentStore, Filter, ReplaceOutcome, StorageError,
    StoredDocument,
};
use serde_json::Value;

pub struct PostgresStore {
    client: Mutex<Client>,
    known_tables: Mutex<HashSet<String>>,
}

fn backend(e: postgres::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

fn to_stored(collection: &str, id: &str, body: Value) -> Result<StoredDocument, StorageError> {
    let corrupt = || StorageError::CorruptDocument {
        collection: collection.to_string(),
        id: id.to_string(),
    };
    let doc_id = DocumentId::parse(id).ok_or_else(corrupt)?;
    match body {
        Value::Object(map) => Ok(StoredDocument::new(doc_id, map)),
        _ => Err(corrupt()),
    }
}

impl PostgresStore {
    pub fn new(connection_string: &str) -> Result<Self, StorageError> {
        let client = Client::connect(connection_string, NoTls)
            .map_err(|e| StorageError::Backend(format!("PostgreSQL connection failed: {}", e)))?;
        tracing::debug!("PostgreSQL store connected");
        Ok(Self {
            client: Mutex::new(client),
            known_tables: Mutex::new(HashSet::new()),
        })
    }

    fn lock(&self, collection: &str) -> Result<MutexGuard<'_, Client>, StorageError> {
        validate_collection(collection)?;
        let mut client = self.client.lock().map_err(|_| StorageError::LockPoisoned)?;
        let mut known = self.known_tables.lock().map_err(|_| StorageError::LockPoisoned)?;
        if !known.contains(collection) {
            client
                .batch_execute(&format!(
                    "CREATE TABLE IF NOT EXISTS \"{collection}\" (
                        id TEXT PRIMARY KEY,
                        body JSONB NOT NULL,
                        inserted_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
                    );"
                ))
                .map_err(backend)?;
            known.insert(collection.to_string());
        }
        Ok(client)
    }
}

impl DocumentStore for PostgresStore {
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<StoredDocument>, StorageError> {
        let mut client = self.lock(collection)?;
        let rows = match filter {
            Filter::All => client.query(
                &format!("SELECT id, body FROM \"{collection}\" ORDER BY inserted_at, id"),
                &[],
            ),
            Filter::ById(id) => client.query(
                &format!("SELECT id, body FROM \"{collection}\" WHERE id = $1"),
                &[&id.to_string()],
            ),
        }
        .map_err(backend)?;

        rows.into_iter()
            .map(|row| {
                let id: String = row.get(0);
                let body: Value = row.get(1);
                to_stored(collection, &id, body)
            })
            .collect()
    }

    fn insert(&self, collection: &str, body: Document) -> Result<DocumentId, StorageError> {
        let mut client = self.lock(collection)?;
        let id = DocumentId::generate();
        client
            .execute(
                &format!("INSERT INTO \"{collection}\" (id, body) VALUES ($1, $2)"),
                &[&id.to_string(), &Value::Object(body)],
            )
            .map_err(backend)?;
        tracing::debug!(collection, %id, "PostgreSQL document inserted");
        Ok(id)
    }

    fn replace(&self, collection: &str, id: &DocumentId, body: Document) -> Result<ReplaceOutcome, StorageError> {
        let mut client = self.lock(collection)?;
        let key = id.to_string();
        let modified = client
            .execute(
                &format!("UPDATE \"{collection}\" SET body = $2 WHERE id = $1 AND body IS DISTINCT FROM $2"),
                &[&key, &Value::Object(body)],
            )
            .map_err(backend)?;

        let outcome = if modified > 0 {
            ReplaceOutcome { matched: 1, modified }
        } else {
            let matched = client
                .query_opt(&format!("SELECT 1 FROM \"{collection}\" WHERE id = $1"), &[&key])
                .map_err(backend)?
                .map_or(0, |_| 1);
            ReplaceOutcome { matched, modified: 0 }
        };
        tracing::debug!(collection, %id, matched = outcome.matched, modified = outcome.modified, "PostgreSQL document replaced");
        Ok(outcome)
    }

    fn delete(&self, collection: &str, id: &DocumentId) -> Result<DeleteOutcome, StorageError> {
        let mut client = self.lock(collection)?;
        let deleted = client
            .execute(
                &format!("DELETE FROM \"{collection}\" WHERE id = $1"),
                &[&id.to_string()],
            )
            .map_err(backend)?;
        tracing::debug!(collection, %id, deleted, "PostgreSQL document deleted");
        Ok(DeleteOutcome { deleted })
    }

    fn collections(&self) -> Result<Vec<String>, StorageError> {
        let mut client = self.client.lock().map_err(|_| StorageError::LockPoisoned)?;
        let tables: Vec<String> = client
            .query(
                "SELECT table_name::TEXT FROM information_schema.tables
                 WHERE table_schema = current_schema() ORDER BY table_name",
                &[],
            )
            .map_err(backend)?
            .iter()
            .map(|row| row.get(0))
            .collect();

        let mut result = Vec::new();
        for table in tables {
            if !relief_core::is_safe_collection_name(&table) {
                continue;
            }
            let populated: bool = client
                .query_one(&format!("SELECT EXISTS (SELECT 1 FROM \"{table}\")"), &[])
                .map_err(backend)?
                .get(0);
            if populated {
                result.push(table);
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    // Needs a disposable database, e.g.
    // RELIEF_TEST_POSTGRES="host=localhost user=postgres dbname=relief_test"
    fn connect() -> PostgresStore {
        let conn = std::env::var("RELIEF_TEST_POSTGRES").expect("RELIEF_TEST_POSTGRES must be set");
        PostgresStore::new(&conn).unwrap()
    }

    fn body(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    #[ignore]
    fn crud_cycle() {
        let store = connect();
        let id = store.insert("Donations", body(json!({"type": "Money", "amount": 1000}))).unwrap();
        assert_eq!(store.find_one("Donations", &id).unwrap().unwrap().body["type"], json!("Money"));

        let same = store.replace("Donations", &id, body(json!({"amount": 1000, "type": "Money"}))).unwrap();
        assert_eq!(same, ReplaceOutcome { matched: 1, modified: 0 });

        let changed = store.replace("Donations", &id, body(json!({"type": "Goods"}))).unwrap();
        assert_eq!(changed, ReplaceOutcome { matched: 1, modified: 1 });

        assert_eq!(store.delete("Donations", &id).unwrap().deleted, 1);
        assert_eq!(store.delete("Donations", &id).unwrap().deleted, 0);
        assert!(store.find_one("Donations", &id).unwrap().is_none());
    }

    #[test]
    #[ignore]
    fn replace_on_missing_id_matches_nothing() {
        let store = connect();
        let outcome = store.replace("Volunteers", &DocumentId::generate(), Document::new()).unwrap();
        assert_eq!(outcome, ReplaceOutcome::default());
    }
}
