//! SQLite document store backend for Relief.
//!
//! Each collection is a table of `(id, body)` rows where `body` is the JSON
//! text of the document.

use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use relief_core::{
    validate_collection, DeleteOutcome, Document, DocumentId, DocumentStore, Filter, ReplaceOutcome, StorageError,
    StoredDocument,
};
use rusqlite::{params, Connection, OptionalExtension};

struct Inner {
    conn: Connection,
    known_tables: HashSet<String>,
}

pub struct SqliteStore {
    inner: Mutex<Inner>,
}

fn backend(e: rusqlite::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

fn parse_row(collection: &str, id: &str, body: &str) -> Result<StoredDocument, StorageError> {
    let corrupt = || StorageError::CorruptDocument {
        collection: collection.to_string(),
        id: id.to_string(),
    };
    let id = DocumentId::parse(id).ok_or_else(corrupt)?;
    let body: Document = serde_json::from_str(body).map_err(|_| corrupt())?;
    Ok(StoredDocument::new(id, body))
}

impl SqliteStore {
    /// Opens a database file, or a private in-memory database for `":memory:"`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(backend)?;

        // WAL is silently ignored for in-memory databases
        conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(())).map_err(backend)?;

        tracing::debug!(path, "SQLite store opened");
        Ok(Self {
            inner: Mutex::new(Inner {
                conn,
                known_tables: HashSet::new(),
            }),
        })
    }

    fn lock(&self, collection: &str) -> Result<MutexGuard<'_, Inner>, StorageError> {
        validate_collection(collection)?;
        let mut inner = self.inner.lock().map_err(|_| StorageError::LockPoisoned)?;
        if !inner.known_tables.contains(collection) {
            inner
                .conn
                .execute_batch(&format!(
                    "CREATE TABLE IF NOT EXISTS \"{collection}\" (
                        id TEXT PRIMARY KEY,
                        body TEXT NOT NULL
                    );"
                ))
                .map_err(backend)?;
            inner.known_tables.insert(collection.to_string());
        }
        Ok(inner)
    }
}

impl DocumentStore for SqliteStore {
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<StoredDocument>, StorageError> {
        let inner = self.lock(collection)?;
        let rows: Vec<(String, String)> = match filter {
            Filter::All => {
                let mut stmt = inner
                    .conn
                    .prepare(&format!("SELECT id, body FROM \"{collection}\" ORDER BY rowid"))
                    .map_err(backend)?;
                let mapped = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
                    .map_err(backend)?;
                mapped.collect::<Result<_, _>>().map_err(backend)?
            }
            Filter::ById(id) => inner
                .conn
                .query_row(
                    &format!("SELECT id, body FROM \"{collection}\" WHERE id = ?1"),
                    params![id.to_string()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(backend)?
                .into_iter()
                .collect(),
        };

        rows.iter()
            .map(|(id, body)| parse_row(collection, id, body))
            .collect()
    }

    fn insert(&self, collection: &str, body: Document) -> Result<DocumentId, StorageError> {
        let text = serde_json::to_string(&body)?;
        let inner = self.lock(collection)?;
        let id = DocumentId::generate();
        inner
            .conn
            .execute(
                &format!("INSERT INTO \"{collection}\" (id, body) VALUES (?1, ?2)"),
                params![id.to_string(), text],
            )
            .map_err(backend)?;
        tracing::debug!(collection, %id, "SQLite document inserted");
        Ok(id)
    }

    fn replace(&self, collection: &str, id: &DocumentId, body: Document) -> Result<ReplaceOutcome, StorageError> {
        let text = serde_json::to_string(&body)?;
        let inner = self.lock(collection)?;
        let key = id.to_string();

        let existing: Option<String> = inner
            .conn
            .query_row(
                &format!("SELECT body FROM \"{collection}\" WHERE id = ?1"),
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)?;

        let outcome = match existing {
            None => ReplaceOutcome::default(),
            Some(stored) => {
                if parse_row(collection, &key, &stored)?.body == body {
                    ReplaceOutcome { matched: 1, modified: 0 }
                } else {
                    let modified = inner
                        .conn
                        .execute(
                            &format!("UPDATE \"{collection}\" SET body = ?2 WHERE id = ?1"),
                            params![key, text],
                        )
                        .map_err(backend)?;
                    ReplaceOutcome { matched: 1, modified: modified as u64 }
                }
            }
        };
        tracing::debug!(collection, %id, matched = outcome.matched, modified = outcome.modified, "SQLite document replaced");
        Ok(outcome)
    }

    fn delete(&self, collection: &str, id: &DocumentId) -> Result<DeleteOutcome, StorageError> {
        let inner = self.lock(collection)?;
        let deleted = inner
            .conn
            .execute(
                &format!("DELETE FROM \"{collection}\" WHERE id = ?1"),
                params![id.to_string()],
            )
            .map_err(backend)?;
        tracing::debug!(collection, %id, deleted, "SQLite document deleted");
        Ok(DeleteOutcome { deleted: deleted as u64 })
    }

    fn collections(&self) -> Result<Vec<String>, StorageError> {
        let inner = self.inner.lock().map_err(|_| StorageError::LockPoisoned)?;
        let tables: Vec<String> = {
            let mut stmt = inner
                .conn
                .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .map_err(backend)?;
            let mapped = stmt.query_map([], |row| row.get(0)).map_err(backend)?;
            mapped.collect::<Result<_, _>>().map_err(backend)?
        };

        let mut result = Vec::new();
        for table in tables {
            if !relief_core::is_safe_collection_name(&table) {
                continue;
            }
            let populated: bool = inner
                .conn
                .query_row(&format!("SELECT EXISTS (SELECT 1 FROM \"{table}\")"), [], |row| row.get(0))
                .map_err(backend)?;
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

    fn body(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn round_trips_documents_in_insertion_order() {
        let store = SqliteStore::new(":memory:").unwrap();
        let a = store.insert("Donations", body(json!({"type": "Money", "amount": 1000}))).unwrap();
        let b = store.insert("Donations", body(json!({"type": "Goods", "amount": 500}))).unwrap();

        let all = store.find("Donations", &Filter::All).unwrap();
        assert_eq!(all.iter().map(|d| d.id).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(all[1].body["amount"], json!(500));

        let one = store.find_one("Donations", &a).unwrap().unwrap();
        assert_eq!(one.body["type"], json!("Money"));
        assert!(store.find_one("Donations", &DocumentId::generate()).unwrap().is_none());
    }

    #[test]
    fn replace_distinguishes_no_op_from_missing() {
        let store = SqliteStore::new(":memory:").unwrap();
        let id = store.insert("Volunteers", body(json!({"name": "Alice", "assignedDisasters": []}))).unwrap();

        let same = store
            .replace("Volunteers", &id, body(json!({"assignedDisasters": [], "name": "Alice"})))
            .unwrap();
        assert_eq!(same, ReplaceOutcome { matched: 1, modified: 0 });

        let changed = store.replace("Volunteers", &id, body(json!({"name": "Alicia"}))).unwrap();
        assert_eq!(changed, ReplaceOutcome { matched: 1, modified: 1 });

        let missing = store.replace("Volunteers", &DocumentId::generate(), Document::new()).unwrap();
        assert_eq!(missing, ReplaceOutcome::default());
    }

    #[test]
    fn delete_and_collections() {
        let store = SqliteStore::new(":memory:").unwrap();
        assert!(store.find("Disasters", &Filter::All).unwrap().is_empty());
        let id = store.insert("Beneficiaries", body(json!({"name": "Jane"}))).unwrap();
        assert_eq!(store.collections().unwrap(), vec!["Beneficiaries".to_string()]);

        assert_eq!(store.delete("Beneficiaries", &id).unwrap().deleted, 1);
        assert_eq!(store.delete("Beneficiaries", &id).unwrap().deleted, 0);
        assert!(store.collections().unwrap().is_empty());
    }

    #[test]
    fn data_survives_reopening_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relief.db");
        let path = path.to_str().unwrap();

        let id = {
            let store = SqliteStore::new(path).unwrap();
            store.insert("Disasters", body(json!({"name": "Hurricane Alpha"}))).unwrap()
        };

        let reopened = SqliteStore::new(path).unwrap();
        let found = reopened.find_one("Disasters", &id).unwrap().unwrap();
        assert_eq!(found.body["name"], json!("Hurricane Alpha"));
    }

    #[test]
    fn unsafe_collection_is_rejected_before_sql() {
        let store = SqliteStore::new(":memory:").unwrap();
        assert!(matches!(
            store.find("x\"; DROP TABLE y; --", &Filter::All),
            Err(StorageError::InvalidCollection(_))
        ));
    }
}
