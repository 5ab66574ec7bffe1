use score_upload::client::{
    CreateObject, DocumentStore, HashMapDocumentStore, HashMapObjectStore, ListedObject,
    ObjectStore, StoredObject,
};
use score_upload::error::{Error, ErrorKind, Result};
use score_upload::types::{AssetId, RecordId};

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An in-memory object store that fails, stalls or delays chosen files.
///
/// Files are chosen by the name they are created with.
#[derive(Debug, Default)]
pub struct FlakyObjectStore {
    pub inner: Arc<HashMapObjectStore>,
    fail: HashSet<String>,
    stall: HashSet<String>,
    delay: HashMap<String, Duration>,
    fail_deletes: bool,
    creates: AtomicUsize,
    delete_attempts: Mutex<Vec<AssetId>>,
}

impl FlakyObjectStore {
    pub fn fail_on(mut self, filename: &str) -> Self {
        self.fail.insert(filename.to_string());
        self
    }

    pub fn stall_on(mut self, filename: &str) -> Self {
        self.stall.insert(filename.to_string());
        self
    }

    pub fn delay(mut self, filename: &str, by: Duration) -> Self {
        self.delay.insert(filename.to_string(), by);
        self
    }

    pub fn fail_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    /// Number of `create` calls made, successful or not.
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Every ID a delete was attempted for.
    pub fn delete_attempts(&self) -> Vec<AssetId> {
        self.delete_attempts.lock().unwrap().clone()
    }
}

impl ObjectStore for FlakyObjectStore {
    async fn create(&self, req: CreateObject) -> Result<StoredObject> {
        self.creates.fetch_add(1, Ordering::SeqCst);

        if let Some(by) = self.delay.get(&req.name) {
            tokio::time::sleep(*by).await;
        }
        if self.stall.contains(&req.name) {
            futures::future::pending::<()>().await;
        }
        if self.fail.contains(&req.name) {
            let msg = format!("bucket rejected {}", req.name);
            return Err(Error::from_kind(ErrorKind::Store, msg));
        }

        self.inner.create(req).await
    }

    async fn delete(&self, id: &AssetId) -> Result<()> {
        self.delete_attempts.lock().unwrap().push(id.clone());
        if self.fail_deletes {
            return Err(Error::from_kind(ErrorKind::Store, "delete denied"));
        }
        self.inner.delete(id).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<ListedObject>> {
        self.inner.list(limit).await
    }
}

/// An in-memory document store that can be made to fail or stall every
/// insert.
#[derive(Debug, Default)]
pub struct FlakyDocumentStore {
    pub inner: Arc<HashMapDocumentStore>,
    fail: bool,
    stall: bool,
    inserts: AtomicUsize,
}

impl FlakyDocumentStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn stalling() -> Self {
        Self {
            stall: true,
            ..Self::default()
        }
    }

    /// Number of `insert` calls made, successful or not.
    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

impl DocumentStore for FlakyDocumentStore {
    async fn insert(&self, collection: &str, document: serde_json::Value) -> Result<RecordId> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.stall {
            futures::future::pending::<()>().await;
        }
        if self.fail {
            return Err(Error::from_kind(ErrorKind::Store, "database is locked"));
        }
        self.inner.insert(collection, document).await
    }
}
