//! In-process [`DocumentStore`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use super::{Document, DocumentStore, StoreError, StoreFuture};

/// Number of calls made to each [`MemoryStore`] operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub fetch_all: u64,
    pub fetch_by_id: u64,
    pub fetch_where: u64,
    pub create: u64,
    pub update: u64,
    pub delete: u64,
}

#[derive(Default)]
struct Counters {
    fetch_all: AtomicU64,
    fetch_by_id: AtomicU64,
    fetch_where: AtomicU64,
    create: AtomicU64,
    update: AtomicU64,
    delete: AtomicU64,
}

/// A document store held entirely in memory.
///
/// Collections keep insertion order. Generated ids are sequential
/// (`doc-1`, `doc-2`, ...). Every call is counted, which lets tests assert how
/// often the cache actually reached the store, and the store can be switched
/// offline to exercise error paths.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use hrstore::store::{DocumentStore, MemoryStore};
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryStore::new();
/// let fields = json!({ "name": "Asha" }).as_object().cloned().unwrap();
/// let id = store.create("employees", fields).await.unwrap();
///
/// let doc = store.fetch_by_id("employees", &id).await.unwrap().unwrap();
/// assert_eq!(doc.fields["name"], "Asha");
/// assert_eq!(store.calls().create, 1);
/// # }
/// ```
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    next_id: AtomicU64,
    offline: AtomicBool,
    counters: Counters,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a document with a caller-chosen id.
    pub async fn seed(&self, collection: &str, id: &str, fields: Map<String, Value>) {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_owned()).or_default();
        match docs.iter_mut().find(|doc| doc.id == id) {
            Some(doc) => doc.fields = fields,
            None => docs.push(Document::new(id, fields)),
        }
    }

    /// Makes every subsequent call fail with [`StoreError::Unavailable`]
    /// while `offline` is `true`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns how many times each operation has been called.
    pub fn calls(&self) -> CallCounts {
        let c = &self.counters;
        CallCounts {
            fetch_all: c.fetch_all.load(Ordering::SeqCst),
            fetch_by_id: c.fetch_by_id.load(Ordering::SeqCst),
            fetch_where: c.fetch_where.load(Ordering::SeqCst),
            create: c.create.load(Ordering::SeqCst),
            update: c.update.load(Ordering::SeqCst),
            delete: c.delete.load(Ordering::SeqCst),
        }
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_owned()));
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn fetch_all<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, Vec<Document>> {
        Box::pin(async move {
            self.counters.fetch_all.fetch_add(1, Ordering::SeqCst);
            self.check_online()?;
            let collections = self.collections.read().await;
            let docs = collections.get(collection).cloned().unwrap_or_default();
            debug!(collection, count = docs.len(), "memory store fetch_all");
            Ok(docs)
        })
    }

    fn fetch_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> StoreFuture<'a, Option<Document>> {
        Box::pin(async move {
            self.counters.fetch_by_id.fetch_add(1, Ordering::SeqCst);
            self.check_online()?;
            let collections = self.collections.read().await;
            Ok(collections
                .get(collection)
                .and_then(|docs| docs.iter().find(|doc| doc.id == id))
                .cloned())
        })
    }

    fn fetch_where<'a>(
        &'a self,
        collection: &'a str,
        field: &'a str,
        value: &'a Value,
    ) -> StoreFuture<'a, Vec<Document>> {
        Box::pin(async move {
            self.counters.fetch_where.fetch_add(1, Ordering::SeqCst);
            self.check_online()?;
            let collections = self.collections.read().await;
            Ok(collections
                .get(collection)
                .map(|docs| {
                    docs.iter()
                        .filter(|doc| doc.fields.get(field) == Some(value))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        })
    }

    fn create<'a>(
        &'a self,
        collection: &'a str,
        fields: Map<String, Value>,
    ) -> StoreFuture<'a, String> {
        Box::pin(async move {
            self.counters.create.fetch_add(1, Ordering::SeqCst);
            self.check_online()?;
            let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            let mut collections = self.collections.write().await;
            collections
                .entry(collection.to_owned())
                .or_default()
                .push(Document::new(id.clone(), fields));
            debug!(collection, id = %id, "memory store create");
            Ok(id)
        })
    }

    fn update<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        fields: Map<String, Value>,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.counters.update.fetch_add(1, Ordering::SeqCst);
            self.check_online()?;
            let mut collections = self.collections.write().await;
            let doc = collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_owned(),
                    id: id.to_owned(),
                })?;
            doc.fields.extend(fields);
            Ok(())
        })
    }

    fn delete<'a>(&'a self, collection: &'a str, id: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.counters.delete.fetch_add(1, Ordering::SeqCst);
            self.check_online()?;
            let mut collections = self.collections.write().await;
            if let Some(docs) = collections.get_mut(collection) {
                docs.retain(|doc| doc.id != id);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_in_order() {
        let store = MemoryStore::new();
        let a = store.create("employees", fields(json!({ "name": "A" }))).await.unwrap();
        let b = store.create("employees", fields(json!({ "name": "B" }))).await.unwrap();
        assert_eq!(a, "doc-1");
        assert_eq!(b, "doc-2");

        let all = store.fetch_all("employees").await.unwrap();
        let ids: Vec<_> = all.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["doc-1", "doc-2"]);
    }

    #[tokio::test]
    async fn fetch_all_of_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(store.fetch_all("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_by_id_missing_is_none() {
        let store = MemoryStore::new();
        store.seed("employees", "e1", fields(json!({}))).await;
        assert!(store.fetch_by_id("employees", "e2").await.unwrap().is_none());
        assert!(store.fetch_by_id("employees", "e1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = MemoryStore::new();
        store
            .seed("employees", "e1", fields(json!({ "name": "A", "department": "Ops" })))
            .await;
        store
            .update("employees", "e1", fields(json!({ "department": "HR" })))
            .await
            .unwrap();

        let doc = store.fetch_by_id("employees", "e1").await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], "A");
        assert_eq!(doc.fields["department"], "HR");
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update("employees", "ghost", Map::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id, .. } if id == "ghost"));
    }

    #[tokio::test]
    async fn delete_missing_succeeds() {
        let store = MemoryStore::new();
        store.delete("employees", "ghost").await.unwrap();
    }

    #[tokio::test]
    async fn fetch_where_filters_by_equality() {
        let store = MemoryStore::new();
        store.seed("employments", "j1", fields(json!({ "employeeId": "e1" }))).await;
        store.seed("employments", "j2", fields(json!({ "employeeId": "e2" }))).await;
        store.seed("employments", "j3", fields(json!({ "employeeId": "e1" }))).await;

        let target = json!("e1");
        let found = store.fetch_where("employments", "employeeId", &target).await.unwrap();
        let ids: Vec<_> = found.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["j1", "j3"]);
    }

    #[tokio::test]
    async fn seed_replaces_existing_document() {
        let store = MemoryStore::new();
        store.seed("employees", "e1", fields(json!({ "name": "Old" }))).await;
        store.seed("employees", "e1", fields(json!({ "name": "New" }))).await;

        let all = store.fetch_all("employees").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].fields["name"], "New");
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.fetch_all("employees").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.create("employees", Map::new()).await.is_err());

        store.set_offline(false);
        assert!(store.fetch_all("employees").await.is_ok());
    }

    #[tokio::test]
    async fn calls_are_counted() {
        let store = MemoryStore::new();
        store.fetch_all("employees").await.unwrap();
        store.fetch_all("employees").await.unwrap();
        store.fetch_by_id("employees", "x").await.unwrap();
        store.delete("employees", "x").await.unwrap();

        let calls = store.calls();
        assert_eq!(calls.fetch_all, 2);
        assert_eq!(calls.fetch_by_id, 1);
        assert_eq!(calls.delete, 1);
        assert_eq!(calls.create, 0);
    }
}
