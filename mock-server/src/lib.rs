//! Local HTTP/1.1 peer for exercising the client over real sockets.
//!
//! Routes cover each request shape the client produces: plain GET, JSON
//! GET/POST, single-file multipart upload, arbitrary status codes, and
//! bodies sized to probe read framing.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

/// What `/upload` extracted from a multipart body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub boundary: String,
    pub filename: String,
    pub content: String,
}

#[derive(Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Deserialize)]
pub struct SizeQuery {
    pub bytes: usize,
}

pub type Uploads = Arc<RwLock<HashMap<String, String>>>;

pub fn app() -> Router {
    let uploads: Uploads = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/hello", get(hello))
        .route("/json", get(json))
        .route("/lines", get(lines))
        .route("/sized", get(sized))
        .route("/headers", get(echo_headers))
        .route("/status/{code}", get(status))
        .route("/echo", post(echo))
        .route("/upload", post(upload))
        .route("/uploads/{filename}", get(get_upload))
        .with_state(uploads)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn hello() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "hello")
}

async fn json() -> Json<Message> {
    Json(Message {
        message: "ok".to_string(),
    })
}

async fn lines() -> &'static str {
    "first\nsecond\nthird"
}

async fn sized(Query(query): Query<SizeQuery>) -> String {
    "a".repeat(query.bytes)
}

/// Received headers, keyed by their lowercase names.
async fn echo_headers(headers: HeaderMap) -> Json<BTreeMap<String, String>> {
    Json(
        headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
    )
}

async fn status(Path(code): Path<u16>) -> Result<StatusCode, StatusCode> {
    StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)
}

async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    ([(header::CONTENT_TYPE, content_type)], body)
}

async fn upload(
    State(uploads): State<Uploads>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadReceipt>), StatusCode> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::BAD_REQUEST)?;
    let body = std::str::from_utf8(&body).map_err(|_| StatusCode::BAD_REQUEST)?;
    let receipt = parse_file_part(content_type, body).ok_or(StatusCode::BAD_REQUEST)?;
    uploads
        .write()
        .await
        .insert(receipt.filename.clone(), receipt.content.clone());
    tracing::debug!(filename = %receipt.filename, "stored upload");
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn get_upload(
    State(uploads): State<Uploads>,
    Path(filename): Path<String>,
) -> Result<String, StatusCode> {
    uploads
        .read()
        .await
        .get(&filename)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)
}

/// Extract the single `file` part from a `multipart/form-data` body whose
/// boundary is given quoted or bare in `content_type`.
pub fn parse_file_part(content_type: &str, body: &str) -> Option<UploadReceipt> {
    let boundary = content_type
        .strip_prefix("multipart/form-data; boundary=")?
        .trim_matches('"');
    let opening = format!("--{boundary}\r\n");
    let closing = format!("\r\n--{boundary}--\r\n");

    let part = body.strip_prefix(&opening)?.strip_suffix(&closing)?;
    let (part_headers, content) = part.split_once("\r\n\r\n")?;
    let disposition = part_headers
        .lines()
        .find(|line| line.starts_with("Content-Disposition: form-data;"))?;
    if !disposition.contains("name=\"file\"") {
        return None;
    }
    let filename = disposition
        .split("filename=\"")
        .nth(1)?
        .split('"')
        .next()?;

    Some(UploadReceipt {
        boundary: boundary.to_string(),
        filename: filename.to_string(),
        content: content.to_string(),
    })
}
