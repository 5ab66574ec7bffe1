use super::{CreateObject, DocumentStore, ListedObject, ObjectStore, StoredObject};
use crate::error::{ErrorKind, Error, Result};
use crate::types::{AssetId, RecordId};

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

/// An object as it was written to a [`HashMapObjectStore`].
#[derive(Debug, Clone)]
pub struct StoredObjectData {
    pub name: String,
    pub media_type: String,
    pub payload: Bytes,
}

/// For testing, an object store that keeps objects in a hash map keyed by a
/// fresh UUID.
///
/// Every delete is recorded, including deletes of unknown IDs, so tests can
/// check which compensations were attempted.
#[derive(Debug, Default)]
pub struct HashMapObjectStore {
    objects: RwLock<HashMap<AssetId, StoredObjectData>>,
    deletes: RwLock<Vec<AssetId>>,
}

impl HashMapObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the object stored under `id`, if any.
    pub fn get(&self, id: &AssetId) -> Option<StoredObjectData> {
        let lock = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        lock.get(id).cloned()
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        let lock = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        lock.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every ID a delete was requested for, in order.
    pub fn deleted(&self) -> Vec<AssetId> {
        let lock = self.deletes.read().unwrap_or_else(PoisonError::into_inner);
        lock.clone()
    }

    pub fn clone_inner(&self) -> HashMap<AssetId, StoredObjectData> {
        let lock = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        lock.clone()
    }
}

impl ObjectStore for HashMapObjectStore {
    async fn create(&self, req: CreateObject) -> Result<StoredObject> {
        let id = AssetId::from(Uuid::now_v7().to_string());
        let data = StoredObjectData {
            name: req.name,
            media_type: req.media_type,
            payload: req.payload,
        };

        let mut lock = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        lock.insert(id.clone(), data);

        Ok(StoredObject::new(id))
    }

    async fn delete(&self, id: &AssetId) -> Result<()> {
        {
            let mut deletes = self.deletes.write().unwrap_or_else(PoisonError::into_inner);
            deletes.push(id.clone());
        }

        let mut lock = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        match lock.remove(id) {
            Some(_) => Ok(()),
            None => Err(Error::from_kind(
                ErrorKind::Store,
                format!("no object with id {id}"),
            )),
        }
    }

    async fn list(&self, limit: usize) -> Result<Vec<ListedObject>> {
        let lock = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        // IDs are UUIDv7, so ordering by ID is ordering by creation.
        let mut objects: Vec<ListedObject> = lock
            .iter()
            .map(|(id, data)| ListedObject::new(id.clone(), data.name.clone()))
            .collect();
        objects.sort_by(|a, b| a.id.cmp(&b.id));
        objects.truncate(limit);
        Ok(objects)
    }
}

/// A document as it was written to a [`HashMapDocumentStore`].
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: RecordId,
    pub collection: String,
    pub document: serde_json::Value,
}

/// For testing, a document store that appends documents to a vector.
#[derive(Debug, Default)]
pub struct HashMapDocumentStore {
    documents: RwLock<Vec<StoredDocument>>,
}

impl HashMapDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every document inserted so far.
    pub fn documents(&self) -> Vec<StoredDocument> {
        let lock = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        lock.clone()
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        let lock = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        lock.iter().filter(|d| d.collection == collection).count()
    }

    /// Returns the document with ID `id`, if any.
    pub fn get(&self, id: &RecordId) -> Option<StoredDocument> {
        let lock = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        lock.iter().find(|d| &d.id == id).cloned()
    }
}

impl DocumentStore for HashMapDocumentStore {
    async fn insert(&self, collection: &str, document: serde_json::Value) -> Result<RecordId> {
        let id = RecordId::from(Uuid::now_v7().to_string());
        let mut lock = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        lock.push(StoredDocument {
            id: id.clone(),
            collection: collection.to_string(),
            document,
        });
        Ok(id)
    }
}
