//! This module contains `ObjectStore` and `DocumentStore`, the two
//! collaborators an upload needs, and the shared handles over them.
use self::inner::{BoxedDocumentStore, BoxedObjectStore, DocumentStoreInner, ObjectStoreInner};
use crate::error::Result;
use crate::types::{AssetId, RecordId};

use bytes::Bytes;
use futures::future::Future;
use serde::Serialize;
use std::fmt::{self, Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;

mod inner;

mod deadline;
pub use deadline::Deadline;

mod hashmap;
pub use hashmap::{HashMapDocumentStore, HashMapObjectStore, StoredDocument, StoredObjectData};

mod sdk;
pub use sdk::SdkClient;

#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
mod sqlite;
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub use sqlite::SqliteDocumentStore;

/// `ObjectStore` represents the two operations the upload needs from the
/// storage provider.
pub trait ObjectStore: Send + Sync {
    /// Store a new object, returning the identifier the store assigned to it.
    fn create(&self, req: CreateObject) -> impl Future<Output = Result<StoredObject>> + Send;

    /// Remove an object previously returned by `create`.
    fn delete(&self, id: &AssetId) -> impl Future<Output = Result<()>> + Send;

    /// List at most `limit` of the stored objects, oldest first where the
    /// store can tell.
    fn list(&self, limit: usize) -> impl Future<Output = Result<Vec<ListedObject>>> + Send;
}

impl<D, T> ObjectStore for T
where
    D: ObjectStore,
    T: Deref<Target = D> + Send + Sync,
{
    async fn create(&self, req: CreateObject) -> Result<StoredObject> {
        self.deref().create(req).await
    }

    async fn delete(&self, id: &AssetId) -> Result<()> {
        self.deref().delete(id).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<ListedObject>> {
        self.deref().list(limit).await
    }
}

/// `DocumentStore` is a single write of a JSON document to a collection.
pub trait DocumentStore: Send + Sync {
    /// Insert `document` in `collection`, returning the ID of the new record.
    fn insert(
        &self,
        collection: &str,
        document: serde_json::Value,
    ) -> impl Future<Output = Result<RecordId>> + Send;
}

impl<D, T> DocumentStore for T
where
    D: DocumentStore,
    T: Deref<Target = D> + Send + Sync,
{
    async fn insert(&self, collection: &str, document: serde_json::Value) -> Result<RecordId> {
        self.deref().insert(collection, document).await
    }
}

/// Request object for creating a new object.
#[derive(Debug, Clone)]
pub struct CreateObject {
    /// The name of the object, usually the client's filename.
    pub name: String,
    /// The media type the object is served with.
    pub media_type: String,
    /// The object content.
    pub payload: Bytes,
}

impl CreateObject {
    /// Create a new `CreateObject` from the minimum required.
    pub fn new<N, M>(name: N, media_type: M, payload: Bytes) -> Self
    where
        N: Into<String>,
        M: Into<String>,
    {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            payload,
        }
    }

    /// Size in bytes of the payload.
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// The value for a successful `create`.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// The identifier assigned by the store.
    pub id: AssetId,
}

impl StoredObject {
    pub fn new<T: Into<AssetId>>(id: T) -> Self {
        Self { id: id.into() }
    }
}

/// One entry of a [`list`](ObjectStore::list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedObject {
    pub id: AssetId,
    /// The name the object was created with.
    pub name: String,
}

impl ListedObject {
    pub fn new<I, N>(id: I, name: N) -> Self
    where
        I: Into<AssetId>,
        N: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// `ObjectStoreClient` holds a type that can implement the interface of
/// [`ObjectStore`].
///
/// It is cheap to clone and is meant to be shared by every request.
#[derive(Clone)]
pub struct ObjectStoreClient {
    pub(crate) inner: Arc<dyn BoxedObjectStore + Send + Sync>,
}

impl ObjectStoreClient {
    pub fn new<S>(store: S) -> Self
    where
        S: ObjectStore + Send + Sync + 'static,
    {
        let inner = ObjectStoreInner::new(store);
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl ObjectStore for ObjectStoreClient {
    async fn create(&self, req: CreateObject) -> Result<StoredObject> {
        self.inner.send_create(req).await
    }

    async fn delete(&self, id: &AssetId) -> Result<()> {
        self.inner.send_delete(id).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<ListedObject>> {
        self.inner.send_list(limit).await
    }
}

impl Debug for ObjectStoreClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreClient")
            .field("inner", &"ObjectStore")
            .finish()
    }
}

/// `DocumentStoreClient` holds a type that can implement the interface of
/// [`DocumentStore`].
#[derive(Clone)]
pub struct DocumentStoreClient {
    pub(crate) inner: Arc<dyn BoxedDocumentStore + Send + Sync>,
}

impl DocumentStoreClient {
    pub fn new<S>(store: S) -> Self
    where
        S: DocumentStore + Send + Sync + 'static,
    {
        let inner = DocumentStoreInner::new(store);
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl DocumentStore for DocumentStoreClient {
    async fn insert(&self, collection: &str, document: serde_json::Value) -> Result<RecordId> {
        self.inner.send_insert(collection, document).await
    }
}

impl Debug for DocumentStoreClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStoreClient")
            .field("inner", &"DocumentStore")
            .finish()
    }
}
