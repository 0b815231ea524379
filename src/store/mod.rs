//! Remote document store boundary.
//!
//! The HR backend keeps its records in a hosted document database. This
//! module describes the slice of that database the crate relies on:
//!
//! - [`Document`] — an id plus a JSON object of fields.
//! - [`DocumentStore`] — fetch-all, fetch-by-id, equality query, create,
//!   update, and delete on named collections.
//! - [`StoreError`] — the outcomes a store may report besides success.
//! - [`MemoryStore`] — an in-process implementation for tests, demos, and
//!   offline development.
//!
//! Store methods return boxed `Send` futures so the trait stays object safe
//! and a store can be shared as `Arc<dyn DocumentStore>` across Tokio tasks.

use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

mod memory;

pub use memory::{CallCounts, MemoryStore};

/// Errors reported by a [`DocumentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {id:?} not found in {collection:?}")]
    NotFound { collection: String, id: String },

    #[error("permission denied on {collection:?}")]
    PermissionDenied { collection: String },

    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed document: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Future returned by every [`DocumentStore`] method.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// One stored document.
///
/// The id is kept apart from the fields, the way the database reports it;
/// [`into_record`](Self::into_record) folds it back in when decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Creates a document from an id and its fields.
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decodes the document into `T`, with the document id stored under
    /// `"id"`. An `"id"` field inside the document body is overridden.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde::Deserialize;
    /// use serde_json::json;
    /// use hrstore::store::Document;
    ///
    /// #[derive(Deserialize)]
    /// struct Named { id: String, name: String }
    ///
    /// let fields = json!({ "name": "Asha" }).as_object().cloned().unwrap();
    /// let named: Named = Document::new("e1", fields).into_record().unwrap();
    /// assert_eq!(named.id, "e1");
    /// assert_eq!(named.name, "Asha");
    /// ```
    pub fn into_record<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        let mut fields = self.fields;
        fields.insert("id".to_owned(), Value::String(self.id));
        serde_json::from_value(Value::Object(fields))
    }
}

/// The operations the crate needs from a remote document database.
///
/// Implementations report a missing document from
/// [`fetch_by_id`](Self::fetch_by_id) as `Ok(None)`; deciding whether that is
/// an error is left to the caller. [`update`](Self::update) on a missing
/// document is [`StoreError::NotFound`]. [`delete`](Self::delete) of a missing
/// document succeeds.
pub trait DocumentStore: Send + Sync {
    /// Returns every document of `collection`, in store order.
    fn fetch_all<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, Vec<Document>>;

    /// Returns document `id` of `collection`, if present.
    fn fetch_by_id<'a>(&'a self, collection: &'a str, id: &'a str)
    -> StoreFuture<'a, Option<Document>>;

    /// Returns the documents of `collection` whose `field` equals `value`.
    fn fetch_where<'a>(
        &'a self,
        collection: &'a str,
        field: &'a str,
        value: &'a Value,
    ) -> StoreFuture<'a, Vec<Document>>;

    /// Adds a document with a store-assigned id and returns that id.
    fn create<'a>(&'a self, collection: &'a str, fields: Map<String, Value>)
    -> StoreFuture<'a, String>;

    /// Merges `fields` into document `id`.
    fn update<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        fields: Map<String, Value>,
    ) -> StoreFuture<'a, ()>;

    /// Removes document `id`.
    fn delete<'a>(&'a self, collection: &'a str, id: &'a str) -> StoreFuture<'a, ()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: String,
        name: String,
    }

    #[test]
    fn into_record_injects_id() {
        let doc = Document::new("e7", fields(json!({ "name": "Ravi" })));
        let row: Row = doc.into_record().unwrap();
        assert_eq!(
            row,
            Row {
                id: "e7".into(),
                name: "Ravi".into()
            }
        );
    }

    #[test]
    fn into_record_document_id_wins() {
        let doc = Document::new("real", fields(json!({ "id": "stale", "name": "Ravi" })));
        let row: Row = doc.into_record().unwrap();
        assert_eq!(row.id, "real");
    }

    #[test]
    fn into_record_reports_shape_errors() {
        let doc = Document::new("e1", fields(json!({ "name": 42 })));
        assert!(doc.into_record::<Row>().is_err());
    }

    #[test]
    fn not_found_message_names_collection_and_id() {
        let err = StoreError::NotFound {
            collection: "employees".into(),
            id: "e9".into(),
        };
        assert_eq!(err.to_string(), r#"document "e9" not found in "employees""#);
    }
}
