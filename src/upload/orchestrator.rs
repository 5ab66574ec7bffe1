use super::asset::{self, AssetRef};
use super::record::{self, Role};
use super::state::{Phase, Progress};
use crate::client::{
    Deadline, DocumentStore, DocumentStoreClient, ListedObject, ObjectStore, ObjectStoreClient,
};
use crate::error::{Error, ErrorRepr, Result};
use crate::multipart::{FileAttachment, RawBody};
use crate::types::{AssetId, RecordId, RequestId};

use futures::stream::{FuturesUnordered, StreamExt as _};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Collection records are written to unless configured otherwise.
pub const DEFAULT_COLLECTION: &str = "sheet_music";

/// Limits on each call to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Limit on one `create`.
    ///
    /// Defaults to 30 seconds.
    pub upload: Duration,
    /// Limit on the record `insert`.
    ///
    /// Defaults to 30 seconds.
    pub persist: Duration,
    /// Limit on one `delete`, whether compensating or requested directly,
    /// and on one `list`.
    ///
    /// Defaults to 10 seconds.
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            upload: Duration::from_secs(30),
            persist: Duration::from_secs(30),
            delete: Duration::from_secs(10),
        }
    }
}

/// The result of a request that reached `Done`.
#[derive(Debug, Clone)]
pub struct Completed {
    pub request_id: RequestId,
    /// The record that was written.
    pub record_id: RecordId,
    /// The files the record references.
    pub assets: Vec<AssetRef>,
}

/// `OrchestratorBuilder` configures an [`UploadOrchestrator`].
#[derive(Debug)]
pub struct OrchestratorBuilder {
    objects: ObjectStoreClient,
    documents: DocumentStoreClient,
    collection: String,
    timeouts: Timeouts,
}

impl OrchestratorBuilder {
    pub fn new<O, D>(objects: O, documents: D) -> Self
    where
        O: ObjectStore + 'static,
        D: DocumentStore + 'static,
    {
        Self {
            objects: ObjectStoreClient::new(objects),
            documents: DocumentStoreClient::new(documents),
            collection: DEFAULT_COLLECTION.to_string(),
            timeouts: Timeouts::default(),
        }
    }

    /// Set the collection records are written to.
    pub fn collection<T: Into<String>>(self, collection: T) -> Self {
        Self {
            collection: collection.into(),
            ..self
        }
    }

    /// Set all of the store call limits.
    pub fn timeouts(self, timeouts: Timeouts) -> Self {
        Self { timeouts, ..self }
    }

    /// Set the limit on one upload.
    pub fn upload_timeout(mut self, limit: Duration) -> Self {
        self.timeouts.upload = limit;
        self
    }

    /// Set the limit on writing the record.
    pub fn persist_timeout(mut self, limit: Duration) -> Self {
        self.timeouts.persist = limit;
        self
    }

    /// Set the limit on one delete.
    pub fn delete_timeout(mut self, limit: Duration) -> Self {
        self.timeouts.delete = limit;
        self
    }

    pub fn build(self) -> UploadOrchestrator {
        UploadOrchestrator {
            objects: self.objects,
            documents: self.documents,
            collection: Arc::from(self.collection),
            timeouts: self.timeouts,
        }
    }
}

/// `UploadOrchestrator` runs one upload request from its raw body to a
/// persisted record.
///
/// It is the only place that knows how to undo a request: when an upload or
/// the record write fails, every file that was confirmed stored is deleted
/// again before the failure is returned. Requests share nothing but the store
/// clients, so one orchestrator serves any number of requests concurrently.
#[derive(Debug, Clone)]
pub struct UploadOrchestrator {
    objects: ObjectStoreClient,
    documents: DocumentStoreClient,
    collection: Arc<str>,
    timeouts: Timeouts,
}

impl UploadOrchestrator {
    /// Returns a builder over the two stores.
    pub fn builder<O, D>(objects: O, documents: D) -> OrchestratorBuilder
    where
        O: ObjectStore + 'static,
        D: DocumentStore + 'static,
    {
        OrchestratorBuilder::new(objects, documents)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Decode `body`, store each file the record has a [`Role`] for
    /// concurrently, then write one record referencing them. Files under
    /// other field names are ignored.
    ///
    /// On error nothing of the request is left behind, except files whose
    /// removal itself failed; those are logged. The error's
    /// [`phase`](Error::phase) is the phase that failed.
    pub async fn run(&self, body: RawBody) -> Result<Completed> {
        let request_id = RequestId::new();
        let mut progress = Progress::new(request_id);

        let form = match body.decode() {
            Ok(form) => form,
            Err(e) => {
                debug!(request = %request_id, error = %e, "rejecting body");
                progress.advance(Phase::Failed);
                return Err(e);
            }
        };
        let (fields, mut files) = form.into_parts();
        // Only files the record has a role for are stored.
        files.retain(|name, _| {
            let known = Role::from_field(name).is_some();
            if !known {
                warn!(request = %request_id, field = %name, "ignoring file without a role");
            }
            known
        });

        progress.advance(Phase::Uploading);
        let assets = match self.upload_all(request_id, files, &mut progress).await {
            Ok(assets) => assets,
            Err((assets, e)) => {
                self.compensate(request_id, &assets).await;
                progress.advance(Phase::Failed);
                debug_assert_eq!(e.phase(), Some(Phase::Uploading));
                return Err(e);
            }
        };

        progress.advance(Phase::Persisting);
        let documents = Deadline::new(&self.documents, self.timeouts.persist);
        match record::persist(&fields, &assets, &documents, &self.collection).await {
            Ok(record_id) => {
                progress.advance(Phase::Done);
                info!(
                    request = %request_id,
                    record = %record_id,
                    assets = assets.len(),
                    "upload complete"
                );
                Ok(Completed {
                    request_id,
                    record_id,
                    assets,
                })
            }
            Err(e) => {
                warn!(
                    request = %request_id,
                    phase = %progress.phase(),
                    error = %e,
                    "persisting record failed"
                );
                progress.advance(Phase::Compensating);
                self.compensate(request_id, &assets).await;
                progress.advance(Phase::Failed);
                Err(e)
            }
        }
    }

    /// Like [`run`](Self::run), but on its own task, so that the request
    /// finishes (and compensates) even if the caller stops waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn run_detached(&self, body: RawBody) -> Result<Completed> {
        let this = self.clone();
        let handle = tokio::spawn(async move { this.run(body).await });
        handle.await.map_err(Error::from_dyn)?
    }

    /// Store a single file without writing a record.
    pub async fn upload_file(&self, file: FileAttachment) -> Result<AssetRef> {
        let store = Deadline::new(&self.objects, self.timeouts.upload);
        asset::upload(file, &store).await
    }

    /// Delete a stored file by ID.
    pub async fn delete_asset(&self, id: &AssetId) -> Result<()> {
        let store = Deadline::new(&self.objects, self.timeouts.delete);
        store
            .delete(id)
            .await
            .map_err(ErrorRepr::from_store_err("delete"))?;
        debug!(%id, "deleted asset");
        Ok(())
    }

    /// List at most `limit` stored files.
    pub async fn list_assets(&self, limit: usize) -> Result<Vec<ListedObject>> {
        let store = Deadline::new(&self.objects, self.timeouts.delete);
        let objects = store
            .list(limit)
            .await
            .map_err(ErrorRepr::from_store_err("list"))?;
        trace!(count = objects.len(), limit, "listed assets");
        Ok(objects)
    }

    /// Upload every file concurrently and wait for all of them to resolve.
    ///
    /// The first failure moves the request to `Compensating`, but uploads
    /// already in flight are still awaited, so that everything that ends up
    /// stored is known and can be removed. On error, returns the assets that
    /// were stored along with the first failure.
    async fn upload_all(
        &self,
        request_id: RequestId,
        files: HashMap<String, FileAttachment>,
        progress: &mut Progress,
    ) -> std::result::Result<Vec<AssetRef>, (Vec<AssetRef>, Error)> {
        let store = Deadline::new(&self.objects, self.timeouts.upload);

        let mut pending = FuturesUnordered::new();
        for file in files.into_values() {
            pending.push(asset::upload(file, &store));
        }

        let mut assets = Vec::with_capacity(pending.len());
        let mut failure: Option<Error> = None;
        while let Some(res) = pending.next().await {
            match res {
                Ok(asset) => assets.push(asset),
                Err(e) if failure.is_none() => {
                    warn!(
                        request = %request_id,
                        in_flight = pending.len(),
                        error = %e,
                        "upload failed"
                    );
                    progress.advance(Phase::Compensating);
                    failure = Some(e);
                }
                Err(e) => {
                    warn!(request = %request_id, error = %e, "another upload failed");
                }
            }
        }

        match failure {
            None => Ok(assets),
            Some(e) => Err((assets, e)),
        }
    }

    /// Best-effort delete of every asset in `assets`.
    ///
    /// Failures are logged and otherwise ignored: the error the request ends
    /// with is always the one that caused compensation.
    async fn compensate(&self, request_id: RequestId, assets: &[AssetRef]) {
        if assets.is_empty() {
            return;
        }

        let store = Deadline::new(&self.objects, self.timeouts.delete);
        let store = &store;

        let mut deletes = FuturesUnordered::new();
        for asset in assets {
            deletes.push(async move {
                let res = store
                    .delete(&asset.id)
                    .await
                    .map_err(ErrorRepr::from_delete_err(&asset.id));
                (asset, res)
            });
        }

        let mut orphaned = 0usize;
        while let Some((asset, res)) = deletes.next().await {
            match res {
                Ok(()) => trace!(request = %request_id, id = %asset.id, "removed asset"),
                Err(e) => {
                    orphaned += 1;
                    let e = Error::from(e);
                    warn!(
                        request = %request_id,
                        id = %asset.id,
                        field = %asset.field_name,
                        error = %e,
                        "could not remove asset"
                    );
                }
            }
        }

        if orphaned > 0 {
            warn!(request = %request_id, orphaned, "compensation left assets behind");
        } else {
            debug!(request = %request_id, removed = assets.len(), "compensation complete");
        }
    }
}
