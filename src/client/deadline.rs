use super::{CreateObject, DocumentStore, ListedObject, ObjectStore, StoredObject};
use crate::error::{ErrorRepr, Result};
use crate::types::{AssetId, RecordId};

use futures::future::Future;
use std::time::Duration;

/// Wraps a store so that every call fails once `limit` has elapsed.
///
/// A call that times out is dropped, so the store never reports it as done.
/// Whether the operation took effect on the remote side is unknown.
#[derive(Debug, Clone, Copy)]
pub struct Deadline<S> {
    inner: S,
    limit: Duration,
}

impl<S> Deadline<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    async fn within<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.limit, fut).await {
            Ok(res) => res,
            Err(_) => {
                debug!(op, after = ?self.limit, "store call timed out");
                Err(ErrorRepr::Timeout {
                    op,
                    after: self.limit,
                }
                .into())
            }
        }
    }
}

impl<S: ObjectStore> ObjectStore for Deadline<S> {
    async fn create(&self, req: CreateObject) -> Result<StoredObject> {
        self.within("create", self.inner.create(req)).await
    }

    async fn delete(&self, id: &AssetId) -> Result<()> {
        self.within("delete", self.inner.delete(id)).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<ListedObject>> {
        self.within("list", self.inner.list(limit)).await
    }
}

impl<S: DocumentStore> DocumentStore for Deadline<S> {
    async fn insert(&self, collection: &str, document: serde_json::Value) -> Result<RecordId> {
        self.within("insert", self.inner.insert(collection, document))
            .await
    }
}
