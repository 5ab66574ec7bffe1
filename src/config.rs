//! Command line and environment configuration of the service.
use crate::error::{ErrorRepr, Result};
use crate::types::KeyPrefix;
use crate::upload::{DEFAULT_COLLECTION, Timeouts};

use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Accepts sheet music submissions and stores their files and metadata.
#[derive(Parser, Debug, Clone)]
#[command(name = "score-upload")]
#[command(version)]
pub struct Config {
    /// Address to listen on
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED), env = "SCORE_UPLOAD_HOST")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8888, env = "SCORE_UPLOAD_PORT")]
    pub port: u16,

    /// Bucket that uploaded files are stored in
    #[arg(short, long, env = "SCORE_UPLOAD_BUCKET")]
    pub bucket: String,

    /// Prefix for the keys of uploaded files
    #[arg(long, default_value = "scores/", env = "SCORE_UPLOAD_KEY_PREFIX")]
    pub key_prefix: String,

    /// Custom S3 endpoint, e.g. for MinIO or LocalStack
    #[arg(long, env = "SCORE_UPLOAD_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// SQLite database that records are written to
    #[arg(short, long, default_value = "score-upload.db", env = "SCORE_UPLOAD_DATABASE")]
    pub database: PathBuf,

    /// Collection that records are written to
    #[arg(long, default_value = DEFAULT_COLLECTION, env = "SCORE_UPLOAD_COLLECTION")]
    pub collection: String,

    /// Value of `Access-Control-Allow-Origin` on every response
    #[arg(long, default_value = "*", env = "SCORE_UPLOAD_ALLOW_ORIGIN")]
    pub allow_origin: String,

    /// Seconds to wait for one file upload
    #[arg(long, default_value_t = 30, env = "SCORE_UPLOAD_UPLOAD_TIMEOUT")]
    pub upload_timeout_secs: u64,

    /// Seconds to wait for the record write
    #[arg(long, default_value_t = 30, env = "SCORE_UPLOAD_PERSIST_TIMEOUT")]
    pub persist_timeout_secs: u64,

    /// Seconds to wait for one file delete or listing
    #[arg(long, default_value_t = 10, env = "SCORE_UPLOAD_DELETE_TIMEOUT")]
    pub delete_timeout_secs: u64,

    /// Largest request body accepted, in MiB
    #[arg(long, default_value_t = 64, env = "SCORE_UPLOAD_MAX_BODY_MIB")]
    pub max_body_mib: usize,
}

impl Config {
    /// Check the values that clap cannot.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(ErrorRepr::Missing("Config", "bucket").into());
        }
        if self.collection.trim().is_empty() {
            return Err(ErrorRepr::Missing("Config", "collection").into());
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn key_prefix(&self) -> KeyPrefix {
        KeyPrefix::from(self.key_prefix.clone())
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            upload: Duration::from_secs(self.upload_timeout_secs),
            persist: Duration::from_secs(self.persist_timeout_secs),
            delete: Duration::from_secs(self.delete_timeout_secs),
        }
    }

    /// Request body limit in bytes.
    pub fn body_limit(&self) -> usize {
        self.max_body_mib.saturating_mul(1024 * 1024)
    }
}
