//! Identifiers handed out by the stores, and naming of stored objects.
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;
use uuid::Uuid;

/// ID assigned by the object store to an uploaded asset.
///
/// The value is opaque to this crate: for S3 it is the object key, for the
/// in-memory store a UUID.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Cow<'static, str>);

impl AssetId {
    pub fn new<T: Into<Cow<'static, str>>>(id: T) -> Self {
        Self(id.into())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for AssetId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Display for AssetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for AssetId {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for AssetId {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// ID assigned by the document store to a persisted record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Cow<'static, str>);

impl RecordId {
    pub fn new<T: Into<Cow<'static, str>>>(id: T) -> Self {
        Self(id.into())
    }
}

impl Deref for RecordId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Correlates the log lines of one orchestration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A prefix for the names of stored objects, e.g. a folder in the bucket.
#[derive(Debug, Clone, Default)]
pub struct KeyPrefix(Cow<'static, str>);

impl KeyPrefix {
    /// Create a new object key prefix, adding the trailing `/` if missing.
    ///
    /// An empty prefix stays empty so that keys land in the bucket root.
    pub fn new<T: Into<Cow<'static, str>>>(prefix: T) -> Self {
        let mut prefix: Cow<'static, str> = prefix.into();
        if !prefix.is_empty() && !prefix.ends_with('/') {
            *prefix.to_mut() += "/";
        }
        Self(prefix)
    }

    /// Create a unique key for an object named `filename` under this prefix.
    ///
    /// Keys have the form `{prefix}{uuid}/{filename}` so that two uploads of
    /// the same file never collide.
    pub fn unique_key(&self, filename: &str) -> String {
        let name = sanitize_filename(filename);
        format!("{}{}/{}", self.0, Uuid::now_v7(), name)
    }
}

impl Deref for KeyPrefix {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Display for KeyPrefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for KeyPrefix {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for KeyPrefix {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Keep only the last path component of a client-supplied filename and drop
/// characters that are awkward in object keys.
pub(crate) fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let name: String = base
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
        .take(255)
        .collect();
    match name.trim() {
        "" | "." | ".." => "file".to_string(),
        s => s.to_string(),
    }
}
