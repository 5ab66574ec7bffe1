use super::{CreateObject, ListedObject, ObjectStore, StoredObject};
use crate::error::{Error, ErrorRepr, Result};
use crate::types::{AssetId, KeyPrefix};

use aws_config::{ConfigLoader, SdkConfig};
use aws_sdk_s3 as s3;
use aws_sdk_s3::primitives::ByteStream;

/// S3 [`Client`] type from the AWS SDK, writing to one bucket.
///
/// Objects are written to `{prefix}{uuid}/{filename}` and the object key is
/// the identifier handed back to the caller.
///
/// [`Client`]: aws_sdk_s3::Client
#[derive(Debug, Clone)]
pub struct SdkClient {
    client: s3::Client,
    bucket: String,
    prefix: KeyPrefix,
}

impl SdkClient {
    /// Create a new `SdkClient` from an existing SDK `Client`.
    pub fn new<T: Into<String>>(client: s3::Client, bucket: T) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: KeyPrefix::default(),
        }
    }

    /// Create a new `SdkClient` from an [`SdkConfig`].
    ///
    /// [`SdkConfig`]: aws_config::SdkConfig
    pub fn from_sdk_config<T: Into<String>>(config: &SdkConfig, bucket: T) -> Self {
        let client = s3::Client::new(config);
        Self::new(client, bucket)
    }

    /// Load the configuration from `loader` and create a client with it.
    pub async fn from_config<T: Into<String>>(loader: ConfigLoader, bucket: T) -> Self {
        let config = loader.load().await;
        Self::from_sdk_config(&config, bucket)
    }

    /// Set the prefix that new object keys are created under.
    pub fn with_prefix<T: Into<KeyPrefix>>(self, prefix: T) -> Self {
        Self {
            prefix: prefix.into(),
            ..self
        }
    }

    /// Get a reference to the SDK client.
    pub fn get_ref(&self) -> &s3::Client {
        &self.client
    }

    fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(ErrorRepr::Missing("SdkClient", "bucket").into());
        }
        Ok(())
    }
}

impl ObjectStore for SdkClient {
    async fn create(&self, req: CreateObject) -> Result<StoredObject> {
        self.validate()?;
        let key = self.prefix.unique_key(&req.name);
        trace!(bucket = %self.bucket, %key, bytes = req.size(), "putting object");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(req.media_type)
            .content_length(req.payload.len() as i64)
            .body(ByteStream::from(req.payload))
            .send()
            .await
            .map_err(Error::from_dyn)?;

        Ok(StoredObject::new(key))
    }

    async fn delete(&self, id: &AssetId) -> Result<()> {
        self.validate()?;
        if id.is_empty() {
            return Err(ErrorRepr::Missing("delete", "asset id").into());
        }
        trace!(bucket = %self.bucket, key = %id, "deleting object");

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&**id)
            .send()
            .await
            .map_err(Error::from_dyn)?;

        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<ListedObject>> {
        self.validate()?;
        trace!(bucket = %self.bucket, prefix = %self.prefix, limit, "listing objects");

        let max_keys = i32::try_from(limit).unwrap_or(i32::MAX);
        let mut req = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(max_keys);
        if !self.prefix.is_empty() {
            req = req.prefix(&*self.prefix);
        }
        let out = req.send().await.map_err(Error::from_dyn)?;

        let objects = out
            .contents()
            .iter()
            .filter_map(|obj| obj.key())
            .map(|key| ListedObject::new(key.to_string(), object_name(key)))
            .collect();
        Ok(objects)
    }
}

/// The filename part of a `{prefix}{uuid}/{filename}` key.
fn object_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
