use std::sync::Arc;

use relief_core::{DocumentStore, StorageError};
use relief_memory::InMemoryStore;
use relief_postgres::PostgresStore;
use relief_sqlite::SqliteStore;

use crate::config::{StorageBackend, StorageConfig};

/// Opens the configured backend. Blocking; call before the async runtime
/// starts.
pub fn open(config: &StorageConfig) -> Result<Arc<dyn DocumentStore>, StorageError> {
    let store: Arc<dyn DocumentStore> = match config.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; records are lost on exit");
            Arc::new(InMemoryStore::new())
        }
        StorageBackend::Sqlite => {
            let path = config.sqlite_path();
            tracing::info!(path = %path, "Using SQLite storage");
            Arc::new(SqliteStore::new(&path)?)
        }
        StorageBackend::Postgres => {
            tracing::info!(database = %config.database_name, "Using PostgreSQL storage");
            Arc::new(PostgresStore::new(&config.postgres_url())?)
        }
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_embedded_backends() {
        let memory = open(&StorageConfig::default()).unwrap();
        assert!(memory.collections().unwrap().is_empty());

        let sqlite = open(&StorageConfig {
            backend: StorageBackend::Sqlite,
            connection_string: Some(":memory:".to_string()),
            ..StorageConfig::default()
        })
        .unwrap();
        assert!(sqlite.collections().unwrap().is_empty());
    }
}
