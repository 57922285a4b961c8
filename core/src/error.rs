//! Error types for the HTTP client.
//!
//! # Design
//! One enum covers every stage of a request: construction (`MalformedUrl`,
//! `Resolution`, `Serialization`), transport (`Connection`, `Tls`), decoding
//! (`MalformedResponse`) and the download helper (`FileExists`, `Io`). The
//! stage that detects a failure returns it; nothing is retried and a failed
//! send never reaches the decoder.
//!
//! A call that blocks forever on a silent peer is not represented here: the
//! transport has no timeouts, so that case never produces a value at all.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    /// The URL has no `http://` / `https://` scheme, or its port is not a
    /// number in `1..=65535`.
    #[error("malformed URL: {0}")]
    MalformedUrl(String),

    /// DNS lookup for a non-literal host produced no IPv4 address.
    #[error("could not resolve host: {0}")]
    Resolution(String),

    /// TCP connect failed or the request could not be written in full.
    #[error("connection to {address}:{port} failed: {reason}")]
    Connection {
        address: String,
        port: u16,
        reason: String,
    },

    /// TLS configuration or handshake failed. Never falls back to plaintext.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The raw response was empty, had no status line, or had a header line
    /// without a colon.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A JSON payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// `download_file` refuses to overwrite an existing path.
    #[error("refusing to overwrite existing file: {}", .0.display())]
    FileExists(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HttpError {
    pub(crate) fn connection(address: impl ToString, port: u16, reason: impl ToString) -> Self {
        HttpError::Connection {
            address: address.to_string(),
            port,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HttpError>;
