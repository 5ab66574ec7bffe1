//! The layer around the multipart body: the boundary declared in the
//! `Content-Type` header and an optional base64 transport encoding.
use crate::error::{ErrorRepr, Result};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;

const FORM_DATA: &str = "multipart/form-data";

/// How the multipart bytes were wrapped for transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportEncoding {
    /// The body is the multipart bytes themselves.
    #[default]
    Identity,
    /// The body is the base64 text of the multipart bytes.
    Base64,
}

impl TransportEncoding {
    /// Undo the transport encoding.
    pub fn decode(self, body: Bytes) -> Result<Bytes> {
        match self {
            Self::Identity => Ok(body),
            Self::Base64 => decode_base64(&body),
        }
    }
}

/// Decode a base64 transport-encoded body into the raw multipart bytes.
///
/// Line breaks and other ASCII whitespace are ignored.
pub fn decode_base64(body: &[u8]) -> Result<Bytes> {
    let decoded = if body.iter().any(u8::is_ascii_whitespace) {
        let compact: Vec<u8> = body
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        STANDARD.decode(compact)
    } else {
        STANDARD.decode(body)
    };
    let decoded = decoded.map_err(ErrorRepr::from)?;
    Ok(Bytes::from(decoded))
}

/// Extract the boundary from a `multipart/form-data` content type such as
/// `multipart/form-data; boundary=----WebKitFormBoundary7MA4YWxkTrZu0gW`.
pub fn boundary_from_content_type(content_type: &str) -> Result<String> {
    let mut params = content_type.split(';');
    let essence = params.next().unwrap_or_default().trim();
    if !essence.eq_ignore_ascii_case(FORM_DATA) {
        return Err(ErrorRepr::MalformedMultipart("content type is not multipart/form-data").into());
    }

    let boundary = params
        .filter_map(|p| p.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, v)| v.trim().trim_matches('"'))
        .filter(|v| !v.is_empty())
        .ok_or(ErrorRepr::MalformedMultipart("content type has no boundary parameter"))?;

    Ok(boundary.to_string())
}
