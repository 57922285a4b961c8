//! Persist a response body to disk.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{HttpError, Result};
use crate::http::HttpResponse;

/// Write the body of `response` to `path`. An existing file at `path` is
/// never touched and yields `HttpError::FileExists`.
pub fn download_file(response: &HttpResponse, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(HttpError::FileExists(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(&response.body)?;
    file.flush()?;
    tracing::debug!(path = %path.display(), bytes = response.body.len(), "response body written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("tinyreq-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn response(body: &[u8]) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: body.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn writes_body_to_new_file() {
        let path = scratch_path("out.bin");
        download_file(&response(b"\x00payload"), &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"\x00payload");
    }

    #[test]
    fn refuses_to_overwrite() {
        let path = scratch_path("existing.txt");
        std::fs::write(&path, b"original").unwrap();
        let err = download_file(&response(b"replacement"), &path).unwrap_err();
        assert!(matches!(err, HttpError::FileExists(p) if p == path));
        assert_eq!(std::fs::read(&path).unwrap(), b"original");
    }

    #[test]
    fn missing_directory_is_io_error() {
        let path = scratch_path("sub").join("missing").join("out.txt");
        let err = download_file(&response(b"x"), &path).unwrap_err();
        assert!(matches!(err, HttpError::Io(_)));
    }
}
