use crate::client::{CreateObject, ObjectStore};
use crate::error::{Error, ErrorKind, ErrorRepr, Result};
use crate::multipart::FileAttachment;
use crate::types::AssetId;

use serde::Serialize;

/// A file the object store has confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    /// The form field the file was attached to.
    pub field_name: String,
    /// The ID the store assigned.
    pub id: AssetId,
    pub media_type: String,
    pub filename: String,
}

/// Store one file, returning the reference the store confirmed.
///
/// Exactly one `create` is made per call and a failure is never retried. Any
/// failure, including an attachment without a filename, is `UploadFailed`.
pub async fn upload<S: ObjectStore>(attachment: FileAttachment, store: &S) -> Result<AssetRef> {
    let FileAttachment {
        field_name,
        filename,
        media_type,
        payload,
    } = attachment;

    if filename.is_empty() {
        let e = Error::from_kind(ErrorKind::UploadFailed, "attachment has no filename");
        return Err(ErrorRepr::from_upload_err(&field_name, &filename)(e).into());
    }

    trace!(field = %field_name, %filename, bytes = payload.len(), "uploading asset");
    let req = CreateObject::new(filename.clone(), media_type.clone(), payload);
    let stored = store
        .create(req)
        .await
        .and_then(|stored| {
            if stored.id.is_empty() {
                return Err(Error::from_kind(ErrorKind::Store, "store returned an empty id"));
            }
            Ok(stored)
        })
        .map_err(ErrorRepr::from_upload_err(&field_name, &filename))?;
    debug!(field = %field_name, id = %stored.id, "uploaded asset");

    Ok(AssetRef {
        field_name,
        id: stored.id,
        media_type,
        filename,
    })
}
