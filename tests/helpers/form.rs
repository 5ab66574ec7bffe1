use bytes::Bytes;
use score_upload::multipart::DecodedForm;

pub const BOUNDARY: &str = "----ScoreFormBoundary7MA4YWxkTrZu0gW";

/// Starts like a PDF and carries bytes that are not valid UTF-8, a bare
/// CRLF, and the boundary text without delimiter framing.
pub const PDF_BYTES: &[u8] =
    b"%PDF-1.7\n\xe2\xe3\xcf\xd3\r\n\x00\xff------ScoreFormBoundary7MA4YWxkTrZu0gW\r\n%%EOF";

pub const AUDIO_BYTES: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00\xff\xfb\x90\x64\r\n\r\n\x00";

/// Builds a `multipart/form-data` body the way a browser does.
#[derive(Debug, Clone)]
pub struct FormBuilder {
    boundary: String,
    body: Vec<u8>,
}

impl Default for FormBuilder {
    fn default() -> Self {
        Self::new(BOUNDARY)
    }
}

impl FormBuilder {
    pub fn new(boundary: &str) -> Self {
        Self {
            boundary: boundary.to_string(),
            body: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.delimiter();
        let header = format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n");
        self.body.extend_from_slice(header.as_bytes());
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn file(mut self, name: &str, filename: &str, media_type: &str, payload: &[u8]) -> Self {
        self.delimiter();
        let header = format!(
            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
             Content-Type: {media_type}\r\n\r\n"
        );
        self.body.extend_from_slice(header.as_bytes());
        self.body.extend_from_slice(payload);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Encode every field and file of `form`.
    pub fn from_form(boundary: &str, form: &DecodedForm) -> Self {
        let mut builder = Self::new(boundary);
        for field in form.fields().values() {
            builder = builder.field(&field.name, &field.value);
        }
        for file in form.files().values() {
            builder = builder.file(
                &file.field_name,
                &file.filename,
                &file.media_type,
                &file.payload,
            );
        }
        builder
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn build(mut self) -> Bytes {
        self.body.extend_from_slice(b"--");
        self.body.extend_from_slice(self.boundary.as_bytes());
        self.body.extend_from_slice(b"--\r\n");
        Bytes::from(self.body)
    }

    fn delimiter(&mut self) {
        self.body.extend_from_slice(b"--");
        self.body.extend_from_slice(self.boundary.as_bytes());
        self.body.extend_from_slice(b"\r\n");
    }
}

/// A complete submission: all six text fields and both files.
pub fn score_form() -> FormBuilder {
    FormBuilder::default()
        .field("title", "Clair de lune")
        .field("tags", "piano,impressionist")
        .field("composer", "Claude Debussy")
        .field("genre", "Classical")
        .field("difficulty_level", "advanced")
        .field("description", "Third movement of the Suite bergamasque.")
        .file("filePDF", "clair-de-lune.pdf", "application/pdf", PDF_BYTES)
        .file("fileAudio", "clair-de-lune.mp3", "audio/mpeg", AUDIO_BYTES)
}
