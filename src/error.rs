//! Errors this crate can emit.
use crate::types::AssetId;
use crate::upload::Phase;

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

/// A specialized `Result` type for this crate.
pub type Result<T, E = Error> = ::std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The value returned in this crate when an error occurs.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(pub(crate) ErrorRepr);

impl Error {
    /// The category of the error.
    pub fn kind(&self) -> ErrorKind {
        match self.0 {
            ErrorRepr::MalformedMultipart(_) | ErrorRepr::Transport(_) => {
                ErrorKind::MalformedMultipart
            }
            ErrorRepr::MalformedPart { .. } => ErrorKind::MalformedPart,
            ErrorRepr::MissingFieldName { .. } => ErrorKind::MissingFieldName,
            ErrorRepr::Upload { .. } => ErrorKind::UploadFailed,
            ErrorRepr::Persist { .. } => ErrorKind::PersistFailed,
            ErrorRepr::Compensation { .. } => ErrorKind::CompensationFailed,
            ErrorRepr::Missing(_, _) => ErrorKind::Config,
            ErrorRepr::Store { .. } | ErrorRepr::Timeout { .. } => ErrorKind::Store,
            ErrorRepr::StdDyn(_) => ErrorKind::Unknown,
            ErrorRepr::Any { kind, .. } => kind,
        }
    }

    /// The phase of an upload that this error aborted, if it came from one.
    pub fn phase(&self) -> Option<Phase> {
        match self.kind() {
            ErrorKind::MalformedMultipart
            | ErrorKind::MalformedPart
            | ErrorKind::MissingFieldName => Some(Phase::Decoding),
            ErrorKind::UploadFailed => Some(Phase::Uploading),
            ErrorKind::PersistFailed => Some(Phase::Persisting),
            ErrorKind::CompensationFailed => Some(Phase::Compensating),
            _ => None,
        }
    }

    /// Whether the error was caused by the client's input rather than by a
    /// collaborator or this service.
    pub fn is_client_error(&self) -> bool {
        matches!(self.phase(), Some(Phase::Decoding))
    }

    /// Create an error from any standard error, for use by implementations of
    /// the store traits.
    pub fn from_dyn<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let err = Box::new(e);
        Self(ErrorRepr::StdDyn(err))
    }

    /// Create an error of the given kind with a message.
    pub fn from_kind<T: Into<Cow<'static, str>>>(kind: ErrorKind, msg: T) -> Self {
        Self(ErrorRepr::Any {
            kind,
            msg: msg.into(),
        })
    }
}

impl From<ErrorRepr> for Error {
    fn from(value: ErrorRepr) -> Self {
        Self(value)
    }
}

/// The category of the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The body or its boundary could not be framed into parts.
    MalformedMultipart,
    /// A part had no blank line between headers and body, or a bad header.
    MalformedPart,
    /// A part had no `name` in its `Content-Disposition`.
    MissingFieldName,
    /// A file could not be stored in the object store.
    UploadFailed,
    /// The metadata record could not be written.
    PersistFailed,
    /// An uploaded asset could not be removed after a later failure.
    CompensationFailed,
    /// A collaborator call failed outside of an upload.
    Store,
    Config,
    Unknown,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedMultipart => write!(f, "malformed multipart"),
            Self::MalformedPart => write!(f, "malformed part"),
            Self::MissingFieldName => write!(f, "missing field name"),
            Self::UploadFailed => write!(f, "upload failed"),
            Self::PersistFailed => write!(f, "persist failed"),
            Self::CompensationFailed => write!(f, "compensation failed"),
            Self::Store => write!(f, "store"),
            Self::Config => write!(f, "config"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Internal error type that we are free to change at will.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ErrorRepr {
    #[error("malformed multipart body: {0}")]
    MalformedMultipart(&'static str),
    #[error("invalid base64 transport encoding: {0}")]
    Transport(#[from] base64::DecodeError),
    #[error("malformed part {index}: {reason}")]
    MalformedPart { index: usize, reason: &'static str },
    #[error("part {index} has no field name")]
    MissingFieldName { index: usize },
    #[error("uploading {field} ({filename}) failed: {source}")]
    Upload {
        field: String,
        filename: String,
        source: BoxError,
    },
    #[error("persisting record to {collection} failed: {source}")]
    Persist { collection: String, source: BoxError },
    #[error("deleting asset {id} failed: {source}")]
    Compensation { id: AssetId, source: BoxError },
    #[error("{op} failed: {source}")]
    Store { op: &'static str, source: BoxError },
    #[error("{0} missing required field: {1}")]
    Missing(&'static str, &'static str),
    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
    #[error("{kind} error: {msg}")]
    Any {
        kind: ErrorKind,
        msg: Cow<'static, str>,
    },
    #[error(transparent)]
    StdDyn(BoxError),
}

impl ErrorRepr {
    pub(crate) fn malformed_part(index: usize) -> impl FnOnce(&'static str) -> Self {
        move |reason| Self::MalformedPart { index, reason }
    }

    pub(crate) fn from_upload_err(field: &str, filename: &str) -> impl FnOnce(Error) -> Self {
        move |e| Self::Upload {
            field: field.to_string(),
            filename: filename.to_string(),
            source: Box::new(e),
        }
    }

    pub(crate) fn from_persist_err(collection: &str) -> impl FnOnce(Error) -> Self {
        move |e| Self::Persist {
            collection: collection.to_string(),
            source: Box::new(e),
        }
    }

    pub(crate) fn from_store_err(op: &'static str) -> impl FnOnce(Error) -> Self {
        move |e| Self::Store {
            op,
            source: Box::new(e),
        }
    }

    pub(crate) fn from_delete_err(id: &AssetId) -> impl FnOnce(Error) -> Self {
        move |e| Self::Compensation {
            id: id.clone(),
            source: Box::new(e),
        }
    }
}
