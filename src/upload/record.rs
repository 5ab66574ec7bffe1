use super::AssetRef;
use crate::client::DocumentStore;
use crate::error::{Error, ErrorRepr, Result};
use crate::multipart::FieldValue;
use crate::types::{AssetId, RecordId};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

/// The role a file plays in a record, decided by the form field it was
/// attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The `filePDF` field.
    Pdf,
    /// The `fileAudio` field.
    Audio,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Pdf, Role::Audio];

    /// The role of the file attached as `field_name`, if it has one.
    pub fn from_field(field_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.field_name() == field_name)
    }

    /// The form field files in this role are attached to.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Pdf => "filePDF",
            Self::Audio => "fileAudio",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// The metadata document written for one successful upload.
///
/// Every attribute is always present in the document; an absent field or
/// file is `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub title: Option<String>,
    pub tags: Option<String>,
    pub composer: Option<String>,
    pub genre: Option<String>,
    pub difficulty_level: Option<String>,
    pub description: Option<String>,
    pub pdf: Option<AssetId>,
    pub audio: Option<AssetId>,
}

impl ScoreRecord {
    /// Build the record from the text fields of a form and the files that
    /// were stored.
    ///
    /// Text fields are taken verbatim. Fields with other names are ignored,
    /// as are assets attached under a field that has no role.
    pub fn new(fields: &HashMap<String, FieldValue>, assets: &[AssetRef]) -> Self {
        let text = |name: &str| fields.get(name).map(|f| f.value.clone());
        let mut record = Self {
            title: text("title"),
            tags: text("tags"),
            composer: text("composer"),
            genre: text("genre"),
            difficulty_level: text("difficulty_level"),
            description: text("description"),
            pdf: None,
            audio: None,
        };

        for asset in assets {
            match Role::from_field(&asset.field_name) {
                Some(Role::Pdf) => record.pdf = Some(asset.id.clone()),
                Some(Role::Audio) => record.audio = Some(asset.id.clone()),
                None => {
                    trace!(field = %asset.field_name, id = %asset.id, "asset has no role");
                }
            }
        }

        record
    }

    /// The asset stored in `role`.
    pub fn asset(&self, role: Role) -> Option<&AssetId> {
        match role {
            Role::Pdf => self.pdf.as_ref(),
            Role::Audio => self.audio.as_ref(),
        }
    }
}

/// Write one record for `fields` and `assets` to `collection`.
///
/// Exactly one insert is made and a failure is never retried; any failure is
/// `PersistFailed`.
pub async fn persist<S: DocumentStore>(
    fields: &HashMap<String, FieldValue>,
    assets: &[AssetRef],
    store: &S,
    collection: &str,
) -> Result<RecordId> {
    let record = ScoreRecord::new(fields, assets);
    let document = serde_json::to_value(&record)
        .map_err(Error::from_dyn)
        .map_err(ErrorRepr::from_persist_err(collection))?;

    let id = store
        .insert(collection, document)
        .await
        .map_err(ErrorRepr::from_persist_err(collection))?;
    debug!(%collection, %id, assets = assets.len(), "persisted record");

    Ok(id)
}
