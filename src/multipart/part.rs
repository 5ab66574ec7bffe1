//! Classifying one raw part as a form field or a file.
use super::{DEFAULT_MEDIA_TYPE, FieldValue, FileAttachment, Part};
use crate::error::{ErrorRepr, Result};

use bytes::Bytes;
use memchr::memmem;

const HEADER_END: &[u8] = b"\r\n\r\n";

/// Classify one part (the bytes between two delimiters).
pub fn classify(raw: Bytes) -> Result<Part> {
    classify_at(raw, 0)
}

/// Classify the part at position `index` in its body, which is what errors
/// report.
pub(crate) fn classify_at(raw: Bytes, index: usize) -> Result<Part> {
    let (head, body) = split_head(&raw)
        .ok_or_else(|| ErrorRepr::malformed_part(index)("no blank line after headers"))?;

    let head = String::from_utf8_lossy(&raw[head]);
    let headers = PartHeaders::parse(&head).map_err(ErrorRepr::malformed_part(index))?;

    let name = headers
        .name
        .filter(|n| !n.is_empty())
        .ok_or(ErrorRepr::MissingFieldName { index })?;
    let payload = raw.slice(body);

    // An empty filename is only valid for an input with nothing selected.
    if headers.filename.as_deref() == Some("") && !payload.is_empty() {
        return Err(ErrorRepr::malformed_part(index)("file content without a filename").into());
    }

    let part = match headers.filename {
        Some(filename) => Part::File(FileAttachment {
            field_name: name,
            filename,
            media_type: headers
                .content_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
            payload,
        }),
        None => Part::Field(FieldValue {
            name,
            value: String::from_utf8_lossy(&payload).into_owned(),
        }),
    };

    Ok(part)
}

/// Locate the header block and body block of a part.
fn split_head(raw: &[u8]) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
    // A part with no headers at all starts with the blank line.
    if raw.starts_with(b"\r\n") {
        return Some((0..0, 2..raw.len()));
    }
    let at = memmem::find(raw, HEADER_END)?;
    Some((0..at, at + HEADER_END.len()..raw.len()))
}

/// The headers of a part that matter for classifying it.
#[derive(Debug, Default)]
struct PartHeaders {
    name: Option<String>,
    filename: Option<String>,
    content_type: Option<String>,
}

impl PartHeaders {
    fn parse(head: &str) -> Result<Self, &'static str> {
        let mut lines: Vec<(String, String)> = Vec::new();

        for line in head.split("\r\n") {
            if line.is_empty() {
                continue;
            }
            // Obsolete line folding continues the previous header's value.
            if line.starts_with([' ', '\t']) {
                let Some((_, value)) = lines.last_mut() else {
                    return Err("continuation line before any header");
                };
                value.push(' ');
                value.push_str(line.trim());
                continue;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or("header line without a colon")?;
            lines.push((name.trim().to_string(), value.trim().to_string()));
        }

        let mut headers = Self::default();
        for (name, value) in lines {
            if name.eq_ignore_ascii_case("content-disposition") {
                headers.name = disposition_param(&value, "name");
                headers.filename = disposition_param(&value, "filename");
            } else if name.eq_ignore_ascii_case("content-type") {
                headers.content_type = Some(value);
            }
        }

        Ok(headers)
    }
}

/// Find the parameter `key` in a `Content-Disposition` value like
/// `form-data; name="file"; filename="a.pdf"`.
///
/// A quoted value runs from the opening quote to the next quote. Escapes are
/// not interpreted.
fn disposition_param(value: &str, key: &str) -> Option<String> {
    // Skip the disposition type.
    let mut rest = value.split_once(';')?.1;

    loop {
        rest = rest.trim_start_matches([' ', '\t', ';']);
        if rest.is_empty() {
            return None;
        }

        let key_end = rest.find(['=', ';']).unwrap_or(rest.len());
        let this_key = rest[..key_end].trim();
        rest = &rest[key_end..];

        let param = match rest.strip_prefix('=') {
            None => None,
            Some(after) => {
                let after = after.trim_start();
                if let Some(quoted) = after.strip_prefix('"') {
                    let close = quoted.find('"').unwrap_or(quoted.len());
                    rest = quoted.get(close + 1..).unwrap_or_default();
                    Some(&quoted[..close])
                } else {
                    let end = after.find(';').unwrap_or(after.len());
                    rest = &after[end..];
                    Some(after[..end].trim())
                }
            }
        };

        if this_key.eq_ignore_ascii_case(key) {
            return param.map(str::to_string);
        }
    }
}
