//! Raw HTTP/1.1 response parsing.
//!
//! # Design
//! The input is split on `\n`. The first line is the status line and its
//! second space-separated token is the status code. Following lines up to
//! the first bare `\r` are headers, split on their first colon. Header bytes
//! that are not UTF-8 (obs-text) are kept as U+FFFD replacements. Everything
//! after that line is the body, rebuilt by concatenating the remaining lines
//! without their `\n` separators.
//!
//! That last step is lossy: a multi-line body comes back with its line feeds
//! removed (carriage returns survive). Single-blob payloads such as JSON or
//! binary data without `\n` bytes decode intact. Chunked transfer-encoding is
//! not understood; chunk-size lines end up in the body.

use crate::error::{HttpError, Result};
use crate::http::{Headers, HttpResponse};

pub fn decode(raw: &[u8]) -> Result<HttpResponse> {
    if raw.is_empty() {
        return Err(HttpError::MalformedResponse("empty response".to_string()));
    }

    let mut lines: Vec<&[u8]> = raw.split(|&b| b == b'\n').collect();
    // A trailing delimiter terminates the last line rather than opening a new one.
    if raw.ends_with(b"\n") {
        lines.pop();
    }
    let mut lines = lines.into_iter();

    let status_line = lines
        .next()
        .ok_or_else(|| HttpError::MalformedResponse("missing status line".to_string()))?;
    let status = parse_status_line(status_line)?;

    let mut headers = Headers::new();
    for line in lines.by_ref() {
        if line == b"\r" {
            break;
        }
        let (name, value) = parse_header_line(line)?;
        headers.insert(name, value);
    }

    let body = lines.collect::<Vec<&[u8]>>().concat();

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn parse_status_line(line: &[u8]) -> Result<u16> {
    let line = String::from_utf8_lossy(line);
    line.split(' ')
        .nth(1)
        .map(|token| token.trim_end_matches('\r'))
        .and_then(|token| token.parse::<u16>().ok())
        .ok_or_else(|| HttpError::MalformedResponse(format!("bad status line {line:?}")))
}

fn parse_header_line(line: &[u8]) -> Result<(String, String)> {
    let colon = line.iter().position(|&b| b == b':').ok_or_else(|| {
        HttpError::MalformedResponse(format!(
            "header without colon {:?}",
            String::from_utf8_lossy(line)
        ))
    })?;
    let name = String::from_utf8_lossy(&line[..colon]);
    let value = String::from_utf8_lossy(&line[colon + 1..]);
    let value = value
        .trim_start_matches([' ', '\t'])
        .trim_end_matches('\r');
    Ok((name.into_owned(), value.to_string()))
}

/// Status code of a raw header block, if its status line parses.
pub(crate) fn status_code(head: &[u8]) -> Option<u16> {
    let line = head.split(|&b| b == b'\n').next()?;
    parse_status_line(line).ok()
}

/// Offset just past the `\r\n\r\n` ending the header block, if present.
pub(crate) fn header_block_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

/// `Content-Length` from a raw header block, matched case-insensitively.
pub(crate) fn content_length(head: &[u8]) -> Option<usize> {
    let head = std::str::from_utf8(head).ok()?;
    head.split("\r\n").skip(1).find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}
