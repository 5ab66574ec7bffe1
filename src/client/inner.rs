use super::{CreateObject, DocumentStore, ListedObject, ObjectStore, StoredObject};
use crate::error::Result;
use crate::types::{AssetId, RecordId};

use futures::future::BoxFuture;

/// Object-safe `ObjectStore`.
pub(crate) trait BoxedObjectStore: Send + Sync + 'static {
    /// Create an object.
    fn send_create(&self, req: CreateObject) -> BoxFuture<'_, Result<StoredObject>>;

    /// Delete an object.
    fn send_delete<'a>(&'a self, id: &'a AssetId) -> BoxFuture<'a, Result<()>>;

    /// List objects.
    fn send_list(&self, limit: usize) -> BoxFuture<'_, Result<Vec<ListedObject>>>;
}

/// Implements `BoxedObjectStore` for the public `ObjectStore`.
pub(super) struct ObjectStoreInner<T>(T);

impl<T: ObjectStore> ObjectStoreInner<T> {
    pub(super) fn new(inner: T) -> Self {
        Self(inner)
    }
}

impl<T: ObjectStore + 'static> BoxedObjectStore for ObjectStoreInner<T> {
    fn send_create(&self, req: CreateObject) -> BoxFuture<'_, Result<StoredObject>> {
        Box::pin(self.0.create(req))
    }

    fn send_delete<'a>(&'a self, id: &'a AssetId) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.0.delete(id))
    }

    fn send_list(&self, limit: usize) -> BoxFuture<'_, Result<Vec<ListedObject>>> {
        Box::pin(self.0.list(limit))
    }
}

/// Object-safe `DocumentStore`.
pub(crate) trait BoxedDocumentStore: Send + Sync + 'static {
    /// Insert a document.
    fn send_insert<'a>(
        &'a self,
        collection: &'a str,
        document: serde_json::Value,
    ) -> BoxFuture<'a, Result<RecordId>>;
}

/// Implements `BoxedDocumentStore` for the public `DocumentStore`.
pub(super) struct DocumentStoreInner<T>(T);

impl<T: DocumentStore> DocumentStoreInner<T> {
    pub(super) fn new(inner: T) -> Self {
        Self(inner)
    }
}

impl<T: DocumentStore + 'static> BoxedDocumentStore for DocumentStoreInner<T> {
    fn send_insert<'a>(
        &'a self,
        collection: &'a str,
        document: serde_json::Value,
    ) -> BoxFuture<'a, Result<RecordId>> {
        Box::pin(self.0.insert(collection, document))
    }
}
