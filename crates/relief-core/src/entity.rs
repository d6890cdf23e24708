use serde::{de::DeserializeOwned, ser::Error as _, Serialize};
use serde_json::Value;

use crate::{
    document::{Document, StoredDocument},
    storage::StorageError,
};

const ID_FIELD: &str = "id";

/// A record kind kept in its own collection.
///
/// The identifier lives outside the stored body: `to_document` strips it and
/// `from_stored` puts the store's id back.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name in the store.
    const COLLECTION: &'static str;
    /// Path segment under `/api`.
    const ROUTE: &'static str;

    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: Option<String>);

    fn to_document(&self) -> Result<Document, StorageError> {
        match serde_json::to_value(self)? {
            Value::Object(mut body) => {
                body.remove(ID_FIELD);
                Ok(body)
            }
            _ => Err(StorageError::Serialization(serde_json::Error::custom(format!(
                "{} record did not serialize to an object",
                Self::COLLECTION
            )))),
        }
    }

    fn from_stored(stored: StoredDocument) -> Result<Self, StorageError> {
        let StoredDocument { id, mut body } = stored;
        body.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        Ok(serde_json::from_value(Value::Object(body))?)
    }
}
