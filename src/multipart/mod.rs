//! Decoding `multipart/form-data` bodies.
//!
//! The body is only ever handled as bytes: [`boundary::split`] finds the byte
//! ranges of the parts, [`part::classify`] reads each part's headers, and file
//! payloads are slices of the original buffer. Text is only produced for
//! header blocks and for the values of plain form fields.
//!
//! Bodies that arrive base64-encoded are decoded first with
//! [`transport::decode_base64`]; [`decode`] always works on the raw bytes.
//!
//! # Example
//!
//! ```rust
//! use bytes::Bytes;
//! use score_upload::multipart;
//!
//! let body = Bytes::from_static(
//!     b"--b\r\n\
//!       Content-Disposition: form-data; name=\"title\"\r\n\r\n\
//!       Arabesque No. 1\r\n\
//!       --b\r\n\
//!       Content-Disposition: form-data; name=\"filePDF\"; filename=\"arabesque.pdf\"\r\n\
//!       Content-Type: application/pdf\r\n\r\n\
//!       %PDF-1.7\r\n\
//!       --b--\r\n",
//! );
//!
//! let form = multipart::decode(body, "b").unwrap();
//! assert_eq!(form.field("title"), Some("Arabesque No. 1"));
//! assert_eq!(form.file("filePDF").unwrap().media_type, "application/pdf");
//! ```
use crate::error::Result;

use bytes::Bytes;
use std::collections::HashMap;

pub mod boundary;
pub mod part;
pub mod transport;

pub use transport::TransportEncoding;

/// Media type of a file part that declares none.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// A plain form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub name: String,
    pub value: String,
}

/// A file attached to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    /// Name of the form field the file was attached to.
    pub field_name: String,
    /// The filename the client sent.
    pub filename: String,
    /// The part's own `Content-Type`.
    pub media_type: String,
    /// File content, a slice of the decoded body.
    pub payload: Bytes,
}

impl FileAttachment {
    /// Browsers send a file input with nothing selected as a part with an
    /// empty filename and no content.
    pub fn is_unselected(&self) -> bool {
        self.filename.is_empty() && self.payload.is_empty()
    }
}

/// One classified part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Field(FieldValue),
    File(FileAttachment),
}

/// The fields and files of one decoded body.
///
/// When a name repeats, the last part with that name wins.
#[derive(Debug, Clone, Default)]
pub struct DecodedForm {
    fields: HashMap<String, FieldValue>,
    files: HashMap<String, FileAttachment>,
}

impl DecodedForm {
    /// The value of the text field `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|f| f.value.as_str())
    }

    /// The file attached as `name`.
    pub fn file(&self, name: &str) -> Option<&FileAttachment> {
        self.files.get(name)
    }

    pub fn fields(&self) -> &HashMap<String, FieldValue> {
        &self.fields
    }

    pub fn files(&self) -> &HashMap<String, FileAttachment> {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    /// Take the fields and files out of the form.
    pub fn into_parts(self) -> (HashMap<String, FieldValue>, HashMap<String, FileAttachment>) {
        (self.fields, self.files)
    }

    fn insert(&mut self, part: Part) {
        match part {
            Part::Field(field) => {
                self.fields.insert(field.name.clone(), field);
            }
            Part::File(file) if file.is_unselected() => {
                trace!(field = %file.field_name, "skipping empty file input");
            }
            Part::File(file) => {
                self.files.insert(file.field_name.clone(), file);
            }
        }
    }
}

/// A request body as received, before any decoding.
#[derive(Debug, Clone)]
pub struct RawBody {
    pub bytes: Bytes,
    pub boundary: String,
    pub encoding: TransportEncoding,
}

impl RawBody {
    pub fn new(bytes: impl Into<Bytes>, boundary: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            boundary: boundary.into(),
            encoding: TransportEncoding::Identity,
        }
    }

    /// Read the boundary from the request's `Content-Type` header value.
    pub fn from_content_type(bytes: impl Into<Bytes>, content_type: &str) -> Result<Self> {
        let boundary = transport::boundary_from_content_type(content_type)?;
        Ok(Self::new(bytes, boundary))
    }

    /// Set the transport encoding of the body.
    pub fn with_encoding(self, encoding: TransportEncoding) -> Self {
        Self { encoding, ..self }
    }

    /// Undo the transport encoding, then decode the multipart body.
    pub fn decode(self) -> Result<DecodedForm> {
        let bytes = self.encoding.decode(self.bytes)?;
        decode(bytes, &self.boundary)
    }
}

/// Decode a `multipart/form-data` body delimited by `boundary`.
///
/// Errors keep the kind of the step that raised them: `MalformedMultipart`
/// from splitting, `MalformedPart` and `MissingFieldName` from classifying.
pub fn decode(body: Bytes, boundary: &str) -> Result<DecodedForm> {
    let ranges = boundary::split(&body, boundary)?;

    let mut form = DecodedForm::default();
    for (index, range) in ranges.into_iter().enumerate() {
        if range.is_empty() {
            continue;
        }
        let part = part::classify_at(body.slice(range), index)?;
        form.insert(part);
    }

    debug!(
        fields = form.fields.len(),
        files = form.files.len(),
        "decoded multipart body"
    );
    Ok(form)
}
