//! Typed, cache-aware access to one collection.
//!
//! A [`Repository`] pairs every write with the cache invalidation it requires,
//! so callers cannot forget one:
//!
//! | Operation | Store call    | Then invalidates             |
//! |-----------|---------------|------------------------------|
//! | `create`  | `create`      | collection snapshot          |
//! | `update`  | `update`      | collection snapshot + record |
//! | `delete`  | `delete`      | collection snapshot + record |
//!
//! Invalidation runs only after the store reports success. A failed write
//! leaves the cache as it was.
//!
//! Reads go through the shared [`ScopedReadCache`], except
//! [`list_where`](Repository::list_where) which always queries the store.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::cache::ScopedReadCache;
use crate::model::Record;
use crate::store::{Document, DocumentStore, StoreError};

/// Errors produced by repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{collection} record {id:?} not found")]
    NotFound { collection: &'static str, id: String },

    #[error("failed to decode {collection} record {id:?}: {source}")]
    Decode {
        collection: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {collection} record: {source}")]
    Encode {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{collection} record must serialize to a JSON object")]
    NotAnObject { collection: &'static str },
}

impl RepositoryError {
    /// Returns `true` if the record does not exist, whether the repository
    /// or the store reported it.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Store(StoreError::NotFound { .. })
        )
    }
}

/// Cache-aware access to the collection of `T`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use hrstore::cache::ScopedReadCache;
/// use hrstore::config::CacheConfig;
/// use hrstore::model::Employee;
/// use hrstore::repository::Repository;
/// use hrstore::store::MemoryStore;
///
/// # #[tokio::main]
/// # async fn main() {
/// let cache = Arc::new(ScopedReadCache::from_config(&CacheConfig::default()));
/// cache.set_scope("9876543210");
/// let employees: Repository<Employee> = Repository::new(Arc::new(MemoryStore::new()), cache);
///
/// let asha = employees.create(&json!({ "name": "Asha" })).await.unwrap();
/// let listed = employees.list().await.unwrap();
/// assert_eq!(listed, vec![asha]);
/// # }
/// ```
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    cache: Arc<ScopedReadCache<Document>>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            _record: PhantomData,
        }
    }
}

impl<T: Record> Repository<T> {
    /// Creates a repository over `store`, caching reads in `cache`.
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<ScopedReadCache<Document>>) -> Self {
        Self {
            store,
            cache,
            _record: PhantomData,
        }
    }

    /// Returns every record in the collection.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Store`] if the fetch fails, [`RepositoryError::Decode`]
    /// if a document does not match `T`.
    pub async fn list(&self) -> Result<Vec<T>, RepositoryError> {
        let docs = self
            .cache
            .get_collection(T::COLLECTION, || self.store.fetch_all(T::COLLECTION))
            .await?;
        docs.into_iter().map(decode::<T>).collect()
    }

    /// Returns record `id`.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::NotFound`] if the store has no such document, plus
    /// the errors of [`list`](Self::list).
    pub async fn get(&self, id: &str) -> Result<T, RepositoryError> {
        let doc = self
            .cache
            .get_record(T::COLLECTION, id, || self.fetch_document(id))
            .await?;
        decode::<T>(doc)
    }

    /// Returns the records whose `field` equals `value`. Never cached.
    pub async fn list_where(
        &self,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<T>, RepositoryError> {
        let value = value.into();
        let docs = self.store.fetch_where(T::COLLECTION, field, &value).await?;
        docs.into_iter().map(decode::<T>).collect()
    }

    /// Stores a new record built from `new` and returns it with its id.
    ///
    /// `new` may be a `T`, a partial struct, or a `serde_json::Value`; it must
    /// serialize to a JSON object.
    pub async fn create<N: Serialize>(&self, new: &N) -> Result<T, RepositoryError> {
        let fields = encode::<T, _>(new)?;
        let id = self.store.create(T::COLLECTION, fields.clone()).await?;
        self.cache.invalidate_collection(T::COLLECTION);
        debug!(collection = T::COLLECTION, id = %id, "record created");
        decode::<T>(Document::new(id, fields))
    }

    /// Merges `patch` into record `id`.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Store`] wrapping [`StoreError::NotFound`] if the
    /// record does not exist.
    pub async fn update<P: Serialize>(&self, id: &str, patch: &P) -> Result<(), RepositoryError> {
        let fields = encode::<T, _>(patch)?;
        self.store.update(T::COLLECTION, id, fields).await?;
        self.cache.invalidate_collection(T::COLLECTION);
        self.cache.invalidate_record(T::COLLECTION, id);
        debug!(collection = T::COLLECTION, id, "record updated");
        Ok(())
    }

    /// Writes `record` back under its own id.
    pub async fn save(&self, record: &T) -> Result<(), RepositoryError> {
        self.update(record.id(), record).await
    }

    /// Removes record `id`.
    pub async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        self.store.delete(T::COLLECTION, id).await?;
        self.cache.invalidate_collection(T::COLLECTION);
        self.cache.invalidate_record(T::COLLECTION, id);
        debug!(collection = T::COLLECTION, id, "record deleted");
        Ok(())
    }

    async fn fetch_document(&self, id: &str) -> Result<Document, RepositoryError> {
        self.store
            .fetch_by_id(T::COLLECTION, id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound {
                collection: T::COLLECTION,
                id: id.to_owned(),
            })
    }
}

fn decode<T: Record>(doc: Document) -> Result<T, RepositoryError> {
    let id = doc.id.clone();
    doc.into_record().map_err(|source| RepositoryError::Decode {
        collection: T::COLLECTION,
        id,
        source,
    })
}

fn encode<T: Record, N: Serialize>(value: &N) -> Result<Map<String, Value>, RepositoryError> {
    let encoded = serde_json::to_value(value).map_err(|source| RepositoryError::Encode {
        collection: T::COLLECTION,
        source,
    })?;
    match encoded {
        Value::Object(mut fields) => {
            // The id is the document key, never a stored field.
            fields.remove("id");
            Ok(fields)
        }
        _ => Err(RepositoryError::NotAnObject {
            collection: T::COLLECTION,
        }),
    }
}
