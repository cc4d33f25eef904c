//! Document store collaborator.
//!
//! The platform's database is a schemaless document store billed per read.
//! Services talk to it only through [`DocumentStore`]; records come back as
//! [`Document`]s and are decoded into typed models.

mod memory;
mod query;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::MemoryDocumentStore;
pub use query::{Direction, Filter, Query};

/// Field holding a document's id once decoded.
pub const ID_FIELD: &str = "id";

// == Store Error ==
/// Failures reported by the document store.
///
/// `Clone` so that one failed fetch can be handed to every coalesced waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Network, quota or backend failure; callers may retry
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    /// Update or delete of a missing document
    #[error("Document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// Stored data does not match the expected shape
    #[error("Failed to decode document: {0}")]
    Decode(String),

    /// Rejected write
    #[error("Invalid document: {0}")]
    Invalid(String),
}

// == Document ==
/// One stored record: an id plus a JSON object body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Deserializes the body, with the id injected as `"id"`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut body = self.data.clone();
        body.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(body))
            .map_err(|e| StoreError::Decode(format!("{}: {}", self.id, e)))
    }
}

/// Serializes a model or write payload into a document body.
///
/// Any `"id"` field is dropped; ids live beside the body.
pub fn to_body<T: Serialize>(value: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(mut body)) => {
            body.remove(ID_FIELD);
            Ok(body)
        }
        Ok(other) => Err(StoreError::Invalid(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(StoreError::Invalid(e.to_string())),
    }
}

/// Decodes every document, failing on the first malformed one.
pub fn decode_all<T: DeserializeOwned>(documents: &[Document]) -> Result<Vec<T>, StoreError> {
    documents.iter().map(Document::decode).collect()
}

// == Document Store ==
/// Asynchronous CRUD and query access to document collections.
///
/// Every call may fail transiently; callers propagate errors and never cache them.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Runs a filtered, ordered, limited query.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Fetches one document by id.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Inserts a document under a freshly generated id.
    async fn create(
        &self,
        collection: &str,
        body: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    /// Merges `patch` into an existing document and returns the result.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    /// Deletes a document. Returns whether it existed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Note {
        id: String,
        text: String,
    }

    #[test]
    fn test_decode_injects_id() {
        let body = json!({ "text": "hello" }).as_object().unwrap().clone();
        let doc = Document::new("n1", body);

        let note: Note = doc.decode().unwrap();
        assert_eq!(
            note,
            Note {
                id: "n1".to_string(),
                text: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_decode_reports_shape_errors() {
        let body = json!({ "text": 5 }).as_object().unwrap().clone();
        let doc = Document::new("n1", body);

        let err = doc.decode::<Note>().unwrap_err();
        assert!(matches!(err, StoreError::Decode(msg) if msg.starts_with("n1")));
    }

    #[test]
    fn test_to_body_drops_id() {
        let note = Note {
            id: "n1".to_string(),
            text: "hi".to_string(),
        };
        let body = to_body(&note).unwrap();
        assert!(!body.contains_key("id"));
        assert_eq!(body["text"], "hi");
    }

    #[test]
    fn test_to_body_rejects_scalars() {
        assert!(matches!(to_body(&5), Err(StoreError::Invalid(_))));
    }
}
