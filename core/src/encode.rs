//! HTTP/1.1 request serialization.
//!
//! The header block is `Host` first (unless the caller supplied one), then
//! every header in map order. POST appends a computed `Content-Length` and
//! the raw body; GET never carries a body.

use crate::http::{Headers, HttpMethod, HttpRequest};

const CONTENT_LENGTH: &str = "Content-Length";
const HOST: &str = "Host";

pub fn encode(request: &HttpRequest) -> Vec<u8> {
    let mut out = Vec::with_capacity(256 + request.body().map_or(0, <[u8]>::len));

    out.extend_from_slice(request.method().as_str().as_bytes());
    out.push(b' ');
    out.extend_from_slice(request.path().as_bytes());
    out.extend_from_slice(b" HTTP/1.1\r\n");

    if !request.headers().contains_key(HOST) {
        write_header(&mut out, HOST, request.host());
    }

    match request.method() {
        HttpMethod::Get => {
            encode_headers(&mut out, request.headers());
            out.extend_from_slice(b"\r\n");
        }
        HttpMethod::Post => {
            let body = request.body().unwrap_or_default();
            for (key, value) in request.headers() {
                if key != CONTENT_LENGTH {
                    write_header(&mut out, key, value);
                }
            }
            write_header(&mut out, CONTENT_LENGTH, &body.len().to_string());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(body);
        }
    }

    out
}

/// Append one `"{key}: {value}\r\n"` line per header.
pub(crate) fn encode_headers(out: &mut Vec<u8>, headers: &Headers) {
    for (key, value) in headers {
        write_header(out, key, value);
    }
}

fn write_header(out: &mut Vec<u8>, key: &str, value: &str) {
    out.extend_from_slice(key.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value.as_bytes());
    out.extend_from_slice(b"\r\n");
}
