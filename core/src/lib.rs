//! Minimal blocking HTTP/1.1 client.
//!
//! # Overview
//! Turns a URL plus optional headers and body into a literal HTTP/1.1
//! request, sends it over plain TCP or TLS, and parses the raw reply into an
//! `HttpResponse`. Supports GET, JSON POST and single-file multipart POST.
//!
//! # Design
//! - `HttpClient` is stateless apart from its config and resolver. Every
//!   send opens and closes its own connection; nothing is pooled or cached.
//! - Building (`build_*`) and sending (`send`) are separate so callers can
//!   adjust headers or the certificate policy in between.
//! - Encoding, transport and decoding are independent modules that can be
//!   used on their own.
//! - Known limits, kept on purpose: no chunked transfer-encoding, no
//!   timeouts, the default read framing stops at the first short read, and
//!   the decoder drops line feeds from the body.

pub mod client;
pub mod config;
pub mod decode;
pub mod download;
pub mod encode;
pub mod error;
pub mod http;
pub mod multipart;
pub mod resolve;
pub mod transport;
pub mod url;

pub use client::HttpClient;
pub use config::{ClientConfig, ReadFraming};
pub use decode::decode;
pub use download::download_file;
pub use encode::encode;
pub use error::HttpError;
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse, TlsVerification};
pub use resolve::{is_ip_address, Resolve, SystemResolver};
pub use transport::{Endpoint, PlainTransport, TlsTransport, Transport};
pub use url::{parse_url, ParsedUrl};
