//! Request construction and dispatch.
//!
//! # Design
//! `HttpClient` holds only configuration and a resolver; it keeps no state
//! between calls. The `build_*` helpers parse the URL, resolve the host once
//! and set the default headers, returning an `HttpRequest` the caller may
//! still adjust. `send` then encodes the request, runs it over a fresh
//! connection and decodes the raw reply. Building and sending are separate
//! steps so the I/O boundary stays explicit.

use std::sync::Arc;

use serde::Serialize;

use crate::config::ClientConfig;
use crate::decode::decode;
use crate::encode::encode;
use crate::error::{HttpError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart;
use crate::resolve::{Resolve, SystemResolver};
use crate::transport::{self, Endpoint};
use crate::url::parse_url;

const APPLICATION_JSON: &str = "application/json";

#[derive(Clone)]
pub struct HttpClient {
    config: ClientConfig,
    resolver: Arc<dyn Resolve>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            resolver: Arc::new(SystemResolver),
        }
    }

    /// Replace the system resolver.
    pub fn with_resolver(mut self, resolver: impl Resolve + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// GET request; adds `Accept: application/json` when `accept_json`.
    pub fn build_get(&self, url: &str, accept_json: bool) -> Result<HttpRequest> {
        let mut request = self.build(url, HttpMethod::Get, None)?;
        if accept_json {
            request.set_header("Accept", APPLICATION_JSON);
        }
        Ok(request)
    }

    /// POST with a pre-serialized JSON body.
    pub fn build_json_post(&self, url: &str, json: &str) -> Result<HttpRequest> {
        let mut request = self.build(url, HttpMethod::Post, Some(json.as_bytes().to_vec()))?;
        request.set_header("Content-Type", APPLICATION_JSON);
        request.set_header("Accept", APPLICATION_JSON);
        Ok(request)
    }

    /// POST with `value` serialized as JSON.
    pub fn build_json_post_value<T: Serialize>(&self, url: &str, value: &T) -> Result<HttpRequest> {
        let json = serde_json::to_string(value).map_err(|e| HttpError::Serialization(e.to_string()))?;
        self.build_json_post(url, &json)
    }

    /// POST carrying `data` as a single `multipart/form-data` file part.
    pub fn build_multipart_post(&self, url: &str, filename: &str, data: &[u8]) -> Result<HttpRequest> {
        let part = multipart::file_part(filename, data);
        let mut request = self.build(url, HttpMethod::Post, Some(part.body))?;
        request.set_header("Content-Type", part.content_type);
        Ok(request)
    }

    fn build(&self, url: &str, method: HttpMethod, body: Option<Vec<u8>>) -> Result<HttpRequest> {
        let parsed = parse_url(url)?;
        let address = self.resolver.resolve(&parsed.host)?;
        let mut request = HttpRequest::new(url, parsed, address, method, body);
        request.set_header("User-Agent", self.config.user_agent.clone());
        Ok(request)
    }

    /// Encode, transmit and decode. A transport failure is returned as-is and
    /// nothing is decoded.
    pub fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let payload = encode(request);
        let endpoint = Endpoint {
            address: request.resolved_address(),
            port: request.port(),
            server_name: request.host(),
        };
        tracing::debug!(
            method = request.method().as_str(),
            url = request.url(),
            tls = request.use_tls(),
            "sending request"
        );
        let raw = transport::send(
            &endpoint,
            &payload,
            request.use_tls(),
            request.tls_verification(),
            self.config.read_framing,
        )?;
        let response = decode(&raw)?;
        tracing::debug!(status = response.status, body_bytes = response.body.len(), "response decoded");
        Ok(response)
    }

    /// Build and send a GET in one step.
    pub fn get(&self, url: &str) -> Result<HttpResponse> {
        self.send(&self.build_get(url, false)?)
    }

    /// Build and send a JSON POST in one step.
    pub fn post_json(&self, url: &str, json: &str) -> Result<HttpResponse> {
        self.send(&self.build_json_post(url, json)?)
    }
}
