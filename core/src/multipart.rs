//! Single-file `multipart/form-data` bodies.
//!
//! Boundaries are UUID v4 strings: hex digits and hyphens only, drawn from
//! the OS random source, so concurrent builds never share a boundary.
//!
//! The filename sits in a quoted-string; `"`, CR and LF in it are
//! percent-encoded the way browsers do for form uploads.

use uuid::Uuid;

/// A generated multipart body and the `Content-Type` value announcing it.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub boundary: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

pub fn generate_boundary() -> String {
    Uuid::new_v4().to_string()
}

/// Build a body with one part named `file`.
pub fn file_part(filename: &str, data: &[u8]) -> MultipartBody {
    with_boundary(generate_boundary(), filename, data)
}

pub(crate) fn with_boundary(boundary: String, filename: &str, data: &[u8]) -> MultipartBody {
    let filename = escape_filename(filename);
    let mut body = Vec::with_capacity(data.len() + 2 * boundary.len() + 128);
    body.extend_from_slice(b"--");
    body.extend_from_slice(boundary.as_bytes());
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n--");
    body.extend_from_slice(boundary.as_bytes());
    body.extend_from_slice(b"--\r\n");

    MultipartBody {
        content_type: format!("multipart/form-data; boundary=\"{boundary}\""),
        boundary,
        body,
    }
}

fn escape_filename(filename: &str) -> String {
    let mut out = String::with_capacity(filename.len());
    for c in filename.chars() {
        match c {
            '"' => out.push_str("%22"),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            c => out.push(c),
        }
    }
    out
}
