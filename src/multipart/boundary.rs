//! Splitting a body into the byte ranges between boundary delimiters.
use crate::error::{ErrorRepr, Result};

use memchr::memmem;
use std::ops::Range;

const CRLF: &[u8] = b"\r\n";
const DASHES: &[u8] = b"--";

// https://www.rfc-editor.org/rfc/rfc2046#section-5.1.1
const MAX_BOUNDARY_LEN: usize = 70;

/// Split `body` into the byte ranges of the parts delimited by `boundary`.
///
/// A delimiter is `--{boundary}` at the start of the body or right after a
/// CRLF, followed by a CRLF, by `--` for the terminal delimiter, or by the end
/// of input. Occurrences of the same bytes without that framing belong to the
/// payload they appear in.
///
/// The CRLF that precedes each delimiter is framing, so it is not part of the
/// returned range. Anything before the first delimiter or after the terminal
/// one is dropped. A body missing the terminal delimiter ends its last part at
/// the end of input.
pub fn split(body: &[u8], boundary: &str) -> Result<Vec<Range<usize>>> {
    validate(boundary)?;

    let mut delim = Vec::with_capacity(boundary.len() + DASHES.len());
    delim.extend_from_slice(DASHES);
    delim.extend_from_slice(boundary.as_bytes());

    let mut segments = Vec::new();
    // End of the last delimiter line, i.e. where the next part starts.
    let mut start: Option<usize> = None;
    let mut terminated = false;

    for pos in memmem::find_iter(body, &delim) {
        if pos > 0 && !body[..pos].ends_with(CRLF) {
            continue;
        }
        let Some((line_end, terminal)) = delimiter_end(body, pos + delim.len()) else {
            continue;
        };

        if let Some(from) = start {
            // `pos - 2` is safe: a non-initial delimiter is preceded by CRLF.
            let to = if pos == 0 { 0 } else { pos - CRLF.len() };
            segments.push(from..to.max(from));
        }

        if terminal {
            terminated = true;
            break;
        }
        start = Some(line_end);
    }

    let Some(from) = start else {
        if terminated {
            return Err(ErrorRepr::MalformedMultipart("no parts between delimiters").into());
        }
        return Err(ErrorRepr::MalformedMultipart("boundary not found in body").into());
    };

    if !terminated {
        let rest = &body[from..];
        let to = if rest.ends_with(CRLF) {
            body.len() - CRLF.len()
        } else {
            body.len()
        };
        segments.push(from..to.max(from));
    }

    if segments.is_empty() {
        return Err(ErrorRepr::MalformedMultipart("no parts between delimiters").into());
    }

    trace!(parts = segments.len(), terminated, "split multipart body");
    Ok(segments)
}

fn validate(boundary: &str) -> Result<()> {
    if boundary.is_empty() {
        return Err(ErrorRepr::MalformedMultipart("empty boundary").into());
    }
    if boundary.len() > MAX_BOUNDARY_LEN {
        return Err(ErrorRepr::MalformedMultipart("boundary longer than 70 bytes").into());
    }
    if boundary.bytes().any(|b| b == b'\r' || b == b'\n') {
        return Err(ErrorRepr::MalformedMultipart("boundary contains a line break").into());
    }
    Ok(())
}

/// Given the offset just past `--{boundary}`, returns where the delimiter line
/// ends and whether it is the terminal delimiter, or `None` if the bytes there
/// are not delimiter framing (e.g. a longer boundary sharing this prefix).
fn delimiter_end(body: &[u8], after: usize) -> Option<(usize, bool)> {
    let rest = &body[after..];
    if rest.starts_with(DASHES) {
        return Some((body.len(), true));
    }

    // Transport padding is allowed between the boundary and the line break.
    let padding = rest
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t')
        .count();
    let rest = &rest[padding..];

    if rest.is_empty() {
        Some((body.len(), false))
    } else if rest.starts_with(CRLF) {
        Some((after + padding + CRLF.len(), false))
    } else {
        None
    }
}
