//! HTTP request and response values.
//!
//! # Design
//! Requests and responses are plain owned data. A request is assembled by
//! the `HttpClient::build_*` helpers, which parse the URL and resolve the
//! host once, so every `HttpRequest` carries a usable IPv4 address and a
//! non-empty path. Callers may adjust headers and the certificate policy
//! before dispatch; the transport only ever borrows the request.
//!
//! Headers live in a `BTreeMap`: one value per case-sensitive name, last
//! write wins, iterated in name order. Repeated headers such as multiple
//! `Set-Cookie` lines collapse to the last one.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::url::ParsedUrl;

pub type Headers = BTreeMap<String, String>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Server certificate policy for `https` requests.
///
/// `InsecureSkipVerify` accepts any certificate and exists for talking to
/// self-signed test endpoints. It must be selected explicitly per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TlsVerification {
    #[default]
    Verify,
    InsecureSkipVerify,
}

/// An HTTP/1.1 request ready to be encoded and sent.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    url: String,
    host: String,
    resolved_address: Ipv4Addr,
    port: u16,
    path: String,
    method: HttpMethod,
    headers: Headers,
    use_tls: bool,
    tls_verification: TlsVerification,
    body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub(crate) fn new(
        url: &str,
        parsed: ParsedUrl,
        resolved_address: Ipv4Addr,
        method: HttpMethod,
        body: Option<Vec<u8>>,
    ) -> Self {
        Self {
            url: url.to_string(),
            host: parsed.host,
            resolved_address,
            port: parsed.port,
            path: parsed.path,
            method,
            headers: Headers::new(),
            use_tls: parsed.use_tls,
            tls_verification: TlsVerification::Verify,
            body,
        }
    }

    /// The URL this request was built from.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn resolved_address(&self) -> Ipv4Addr {
        self.resolved_address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    pub fn tls_verification(&self) -> TlsVerification {
        self.tls_verification
    }

    /// Body bytes; `None` for GET.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Add a header, replacing any previous value under the same name.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn set_tls_verification(&mut self, policy: TlsVerification) {
        if policy == TlsVerification::InsecureSkipVerify {
            tracing::warn!(url = %self.url, "certificate verification disabled for request");
        }
        self.tls_verification = policy;
    }
}

/// A decoded HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Body as UTF-8, replacing invalid sequences.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
