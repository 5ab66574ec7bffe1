#![allow(dead_code)]

pub mod form;
pub use self::form::{AUDIO_BYTES, BOUNDARY, FormBuilder, PDF_BYTES, score_form};

pub mod store;
pub use self::store::{FlakyDocumentStore, FlakyObjectStore};

use score_upload::UploadOrchestrator;
use score_upload::client::{HashMapDocumentStore, HashMapObjectStore};
use std::sync::{Arc, LazyLock};
use tracing_subscriber::EnvFilter;

pub static TRACER: LazyLock<()> = LazyLock::new(|| {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
});

/// An orchestrator over in-memory stores, with handles to inspect them.
#[derive(Debug)]
pub struct TestStores {
    pub objects: Arc<FlakyObjectStore>,
    pub documents: Arc<FlakyDocumentStore>,
}

impl TestStores {
    pub fn new() -> Self {
        Self::from_stores(FlakyObjectStore::default(), FlakyDocumentStore::default())
    }

    pub fn from_stores(objects: FlakyObjectStore, documents: FlakyDocumentStore) -> Self {
        Self {
            objects: Arc::new(objects),
            documents: Arc::new(documents),
        }
    }

    pub fn orchestrator(&self) -> UploadOrchestrator {
        UploadOrchestrator::builder(self.objects.clone(), self.documents.clone()).build()
    }

    pub fn stored_objects(&self) -> &HashMapObjectStore {
        &self.objects.inner
    }

    pub fn stored_documents(&self) -> &HashMapDocumentStore {
        &self.documents.inner
    }
}
