//! End-to-end requests over real sockets.
//!
//! # Design
//! Canned single-shot TCP peers check the exact bytes on the wire and the
//! default short-read framing. The axum mock server checks interoperability
//! with a real HTTP/1.1 stack; those tests use `ContentLength` framing since
//! the server keeps connections alive and may split its writes.

mod common;

use std::collections::BTreeMap;
use std::io::{Read, Write};

use common::{canned_server, closed_port, init_test_logging, start_mock_server};
use tinyreq_core::{
    download_file, ClientConfig, HttpClient, HttpError, HttpMethod, ReadFraming, TlsVerification,
};

fn framed_client() -> HttpClient {
    HttpClient::new(ClientConfig {
        read_framing: ReadFraming::ContentLength,
        ..ClientConfig::default()
    })
}

// ---------------------------------------------------------------------------
// Canned peers
// ---------------------------------------------------------------------------

#[test]
fn get_round_trip_with_short_read() {
    init_test_logging();
    let (addr, requests) =
        canned_server(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhello".to_vec());

    let client = HttpClient::default();
    let mut request = client.build_get(&format!("http://{addr}/greeting"), false).unwrap();
    request.set_header("User-Agent", "tinyreq-test");
    let response = client.send(&request).unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert_eq!(response.body, b"hello");

    let wire = String::from_utf8(requests.recv().unwrap()).unwrap();
    assert_eq!(
        wire,
        "GET /greeting HTTP/1.1\r\nHost: 127.0.0.1\r\nUser-Agent: tinyreq-test\r\n\r\n"
    );
}

#[test]
fn json_post_sends_content_length_and_body() {
    init_test_logging();
    let (addr, requests) = canned_server(
        b"HTTP/1.1 201 Created\r\nContent-Type: application/json\r\n\r\n{\"id\":7}".to_vec(),
    );

    let client = HttpClient::default();
    let response = client
        .post_json(&format!("http://{addr}/items"), r#"{"name":"bolt"}"#)
        .unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.body_text(), r#"{"id":7}"#);

    let wire = String::from_utf8(requests.recv().unwrap()).unwrap();
    assert!(wire.starts_with("POST /items HTTP/1.1\r\nHost: 127.0.0.1\r\n"));
    assert!(wire.contains("Accept: application/json\r\n"));
    assert!(wire.contains("Content-Type: application/json\r\n"));
    assert!(wire.ends_with("Content-Length: 15\r\n\r\n{\"name\":\"bolt\"}"));
}

#[test]
fn malformed_reply_is_reported() {
    let (addr, _requests) = canned_server(b"garbage".to_vec());
    let err = HttpClient::default().get(&format!("http://{addr}/")).unwrap_err();
    assert!(matches!(err, HttpError::MalformedResponse(_)));
}

#[test]
fn peer_closing_without_reply_is_malformed_response() {
    let (addr, _requests) = canned_server(Vec::new());
    let err = HttpClient::default().get(&format!("http://{addr}/")).unwrap_err();
    assert!(matches!(err, HttpError::MalformedResponse(_)));
}

#[test]
fn connect_failure_is_not_decoded() {
    let port = closed_port();
    let err = HttpClient::default()
        .get(&format!("http://127.0.0.1:{port}/"))
        .unwrap_err();
    assert!(matches!(err, HttpError::Connection { .. }));
}

#[test]
fn tls_to_plaintext_peer_fails_without_fallback() {
    // Answers the ClientHello with plaintext HTTP instead of a ServerHello.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut hello = [0u8; 512];
        let _ = stream.read(&mut hello);
        let _ = stream.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n");
    });

    let client = HttpClient::default();
    let mut request = client
        .build_get(&format!("https://127.0.0.1:{}/", addr.port()), false)
        .unwrap();
    request.set_tls_verification(TlsVerification::InsecureSkipVerify);
    let err = client.send(&request).unwrap_err();
    assert!(matches!(err, HttpError::Tls(_)));
}

#[test]
fn downloaded_body_lands_on_disk() {
    let (addr, _requests) = canned_server(b"HTTP/1.1 200 OK\r\n\r\nfile-contents".to_vec());
    let response = HttpClient::default().get(&format!("http://{addr}/file")).unwrap();

    let dir = std::env::temp_dir().join(format!("tinyreq-it-{}", addr.port()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("download.txt");
    let _ = std::fs::remove_file(&path);

    download_file(&response, &path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"file-contents");

    let err = download_file(&response, &path).unwrap_err();
    assert!(matches!(err, HttpError::FileExists(_)));
}

// ---------------------------------------------------------------------------
// Mock server
// ---------------------------------------------------------------------------

#[test]
fn mock_server_round_trips() {
    init_test_logging();
    let addr = start_mock_server();
    let base = format!("http://{addr}");
    let client = framed_client();

    // Plain text.
    let response = client.get(&format!("{base}/hello")).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"hello");
    assert_eq!(response.header("content-type"), Some("text/plain"));

    // JSON with Accept header.
    let request = client.build_get(&format!("{base}/json"), true).unwrap();
    let response = client.send(&request).unwrap();
    let message: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(message["message"], "ok");

    // Headers as seen by the server.
    let mut request = client.build_get(&format!("{base}/headers"), false).unwrap();
    request.set_header("X-Trace", "abc");
    let response = client.send(&request).unwrap();
    let seen: BTreeMap<String, String> = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(seen.get("x-trace").map(String::as_str), Some("abc"));
    assert_eq!(seen.get("host").map(String::as_str), Some("127.0.0.1"));
    assert!(seen.contains_key("user-agent"));

    // Status codes pass through untouched.
    let response = client.get(&format!("{base}/status/404")).unwrap();
    assert_eq!(response.status, 404);

    // Multi-line bodies lose their line feeds.
    let response = client.get(&format!("{base}/lines")).unwrap();
    assert_eq!(response.body, b"firstsecondthird");
}

#[test]
fn mock_server_json_echo() {
    let addr = start_mock_server();
    let client = framed_client();
    let request = client
        .build_json_post_value(
            &format!("http://{addr}/echo"),
            &serde_json::json!({ "title": "Buy milk", "done": false }),
        )
        .unwrap();
    assert_eq!(request.method(), HttpMethod::Post);

    let response = client.send(&request).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("application/json"));
    let echoed: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(echoed["title"], "Buy milk");
    assert_eq!(echoed["done"], false);
}

#[test]
fn mock_server_accepts_multipart_upload() {
    let addr = start_mock_server();
    let client = framed_client();

    let request = client
        .build_multipart_post(&format!("http://{addr}/upload"), "a.txt", b"hello")
        .unwrap();
    let response = client.send(&request).unwrap();
    assert_eq!(response.status, 201);
    let receipt: mock_server::UploadReceipt = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(receipt.filename, "a.txt");
    assert_eq!(receipt.content, "hello");
    assert!(request
        .header("Content-Type")
        .unwrap()
        .contains(&format!("boundary=\"{}\"", receipt.boundary)));

    let response = client.get(&format!("http://{addr}/uploads/a.txt")).unwrap();
    assert_eq!(response.body, b"hello");
}

#[test]
fn content_length_framing_ends_bodiless_responses() {
    let addr = start_mock_server();
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(framed_client().get(&format!("http://{addr}/status/204")));
    });

    // The server keeps the connection open, so reading to EOF would block.
    let response = rx
        .recv_timeout(std::time::Duration::from_secs(10))
        .expect("204 response should not wait for the connection to close")
        .unwrap();
    assert_eq!(response.status, 204);
    assert!(response.body.is_empty());
}

#[test]
fn content_length_framing_reads_large_bodies() {
    let addr = start_mock_server();
    let client = framed_client();
    let response = client.get(&format!("http://{addr}/sized?bytes=10000")).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body.len(), 10000);
    assert!(response.body.iter().all(|&b| b == b'a'));
}

#[test]
fn request_is_reusable_across_sends() {
    let addr = start_mock_server();
    let client = framed_client();
    let request = client.build_get(&format!("http://{addr}/hello"), false).unwrap();
    for _ in 0..3 {
        let response = client.send(&request).unwrap();
        assert_eq!(response.body, b"hello");
    }
}
