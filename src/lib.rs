#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Description
//!
//! Accepts `multipart/form-data` submissions of sheet music, stores the
//! attached files in an object store, and writes one metadata record per
//! submission to a document store.
//!
//! A submission either succeeds completely, with a record referencing every
//! file it carried, or fails with no record and with the files that were
//! already stored removed again.
//!
//! # Examples
//!
//! ```rust
//! use bytes::Bytes;
//! use score_upload::client::{HashMapDocumentStore, HashMapObjectStore};
//! use score_upload::multipart::RawBody;
//! use score_upload::UploadOrchestrator;
//! use std::sync::Arc;
//!
//! # async fn f() -> score_upload::error::Result<()> {
//! let objects = Arc::new(HashMapObjectStore::new());
//! let documents = Arc::new(HashMapDocumentStore::new());
//!
//! let orchestrator = UploadOrchestrator::builder(objects.clone(), documents.clone())
//!     .collection("sheet_music")
//!     .build();
//!
//! let body = Bytes::from_static(
//!     b"--b\r\n\
//!       Content-Disposition: form-data; name=\"title\"\r\n\r\n\
//!       Nocturne in E-flat\r\n\
//!       --b\r\n\
//!       Content-Disposition: form-data; name=\"filePDF\"; filename=\"nocturne.pdf\"\r\n\
//!       Content-Type: application/pdf\r\n\r\n\
//!       %PDF-1.7\r\n\
//!       --b--\r\n",
//! );
//! let done = orchestrator.run(RawBody::new(body, "b")).await?;
//!
//! assert_eq!(objects.len(), 1);
//! assert_eq!(documents.count("sheet_music"), 1);
//! println!("created record {}", done.record_id);
//! #     Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! * `tracing`: log through [`tracing`](https://docs.rs/tracing).
//! * `sqlite`: a [`DocumentStore`] over a SQLite database.
//! * `server`: the HTTP service and the `score-upload` binary.
#[doc(hidden)]
pub extern crate aws_config;
#[doc(hidden)]
pub extern crate aws_sdk_s3 as aws_sdk;

#[macro_use]
mod trace;

pub mod client;
#[doc(inline)]
pub use client::{DocumentStore, DocumentStoreClient, ObjectStore, ObjectStoreClient, SdkClient};

pub mod error;
pub mod multipart;
pub mod types;

pub mod upload;
#[doc(inline)]
pub use upload::{Completed, OrchestratorBuilder, Phase, UploadOrchestrator};

#[cfg(feature = "server")]
#[cfg_attr(docsrs, doc(cfg(feature = "server")))]
pub mod config;

#[cfg(feature = "server")]
#[cfg_attr(docsrs, doc(cfg(feature = "server")))]
pub mod http;
