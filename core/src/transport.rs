//! Blocking request/response exchange over TCP or TLS-over-TCP.
//!
//! # Design
//! Each `send` opens its own connection, writes the whole payload, reads
//! until the configured framing says the response is complete, and closes
//! the connection. The socket is owned by the call and dropped on every exit
//! path. There are no timeouts: a peer that neither answers nor closes
//! blocks the call indefinitely.
//!
//! Read errors end the read loop and whatever arrived so far is returned;
//! the decoder decides whether that is a response.

use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, Shutdown, SocketAddrV4, TcpStream};
use std::sync::{Arc, OnceLock};

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, RootCertStore, SignatureScheme, StreamOwned};

use crate::config::ReadFraming;
use crate::decode::{content_length, header_block_end, status_code};
use crate::error::{HttpError, Result};
use crate::http::TlsVerification;

/// Size of each read from the socket.
pub const READ_BUFFER_SIZE: usize = 4096;

/// Where a payload goes.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint<'a> {
    pub address: Ipv4Addr,
    pub port: u16,
    /// Name presented for SNI and checked against the server certificate.
    pub server_name: &'a str,
}

impl Endpoint<'_> {
    fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.address, self.port)
    }

    fn connect(&self) -> Result<TcpStream> {
        tracing::debug!(address = %self.address, port = self.port, "connecting");
        TcpStream::connect(self.socket_addr())
            .map_err(|e| HttpError::connection(self.address, self.port, e))
    }
}

/// One request/response exchange over a fresh connection.
pub trait Transport {
    fn send(&self, endpoint: &Endpoint<'_>, payload: &[u8]) -> Result<Vec<u8>>;
}

/// Send `payload` over plaintext TCP or TLS and return the raw response.
pub fn send(
    endpoint: &Endpoint<'_>,
    payload: &[u8],
    use_tls: bool,
    verification: TlsVerification,
    framing: ReadFraming,
) -> Result<Vec<u8>> {
    if use_tls {
        TlsTransport::new(verification, framing).send(endpoint, payload)
    } else {
        PlainTransport::new(framing).send(endpoint, payload)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTransport {
    framing: ReadFraming,
}

impl PlainTransport {
    pub fn new(framing: ReadFraming) -> Self {
        Self { framing }
    }
}

impl Transport for PlainTransport {
    fn send(&self, endpoint: &Endpoint<'_>, payload: &[u8]) -> Result<Vec<u8>> {
        let mut stream = endpoint.connect()?;
        write_payload(&mut stream, endpoint, payload)?;
        let response = read_response(&mut stream, self.framing);
        let _ = stream.shutdown(Shutdown::Both);
        Ok(response)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TlsTransport {
    verification: TlsVerification,
    framing: ReadFraming,
}

impl TlsTransport {
    pub fn new(verification: TlsVerification, framing: ReadFraming) -> Self {
        Self {
            verification,
            framing,
        }
    }
}

impl Transport for TlsTransport {
    fn send(&self, endpoint: &Endpoint<'_>, payload: &[u8]) -> Result<Vec<u8>> {
        let config = client_config(self.verification)?;
        let server_name = ServerName::try_from(endpoint.server_name.to_string()).map_err(|e| {
            HttpError::Tls(format!("invalid server name {:?}: {e}", endpoint.server_name))
        })?;
        let conn = ClientConnection::new(config, server_name)
            .map_err(|e| HttpError::Tls(e.to_string()))?;

        let tcp = endpoint.connect()?;
        let mut tls = StreamOwned::new(conn, tcp);
        while tls.conn.is_handshaking() {
            tls.conn.complete_io(&mut tls.sock).map_err(|e| {
                HttpError::Tls(format!("handshake with {} failed: {e}", endpoint.socket_addr()))
            })?;
        }
        tracing::debug!(
            server_name = endpoint.server_name,
            version = ?tls.conn.protocol_version(),
            "TLS handshake complete"
        );

        write_payload(&mut tls, endpoint, payload)?;
        let response = read_response(&mut tls, self.framing);

        tls.conn.send_close_notify();
        let _ = tls.conn.complete_io(&mut tls.sock);
        let _ = tls.sock.shutdown(Shutdown::Both);
        Ok(response)
    }
}

fn write_payload<W: Write>(stream: &mut W, endpoint: &Endpoint<'_>, payload: &[u8]) -> Result<()> {
    stream
        .write_all(payload)
        .and_then(|()| stream.flush())
        .map_err(|e| HttpError::connection(endpoint.address, endpoint.port, format!("write failed: {e}")))?;
    tracing::debug!(bytes = payload.len(), "request written");
    Ok(())
}

pub(crate) fn read_response<R: Read>(stream: &mut R, framing: ReadFraming) -> Vec<u8> {
    let response = match framing {
        ReadFraming::ShortRead => read_until_short_read(stream),
        ReadFraming::ContentLength => read_content_length(stream),
    };
    tracing::debug!(?framing, bytes = response.len(), "response read");
    response
}

/// Stop at the first read that does not fill the buffer.
fn read_until_short_read<R: Read>(stream: &mut R) -> Vec<u8> {
    let mut response = Vec::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        match stream.read(&mut buf) {
            Ok(n) => {
                tracing::trace!(bytes = n, "read chunk");
                response.extend_from_slice(&buf[..n]);
                if n < READ_BUFFER_SIZE {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(error = %e, "read failed, returning partial response");
                break;
            }
        }
    }
    response
}

/// Read the header block, then `Content-Length` body bytes or until EOF.
/// 1xx, 204 and 304 responses end at the header block.
fn read_content_length<R: Read>(stream: &mut R) -> Vec<u8> {
    let mut response = Vec::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let mut head_seen = false;
    let mut expected_total: Option<usize> = None;
    loop {
        if expected_total.is_some_and(|total| response.len() >= total) {
            break;
        }
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                tracing::trace!(bytes = n, "read chunk");
                response.extend_from_slice(&buf[..n]);
                if !head_seen {
                    if let Some(end) = header_block_end(&response) {
                        head_seen = true;
                        let head = &response[..end];
                        expected_total = if status_code(head).is_some_and(has_no_body) {
                            Some(end)
                        } else {
                            content_length(head).map(|len| end + len)
                        };
                        if expected_total.is_none() {
                            tracing::debug!("no Content-Length, reading until close");
                        }
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(error = %e, "read failed, returning partial response");
                break;
            }
        }
    }
    response
}

fn has_no_body(status: u16) -> bool {
    (100..200).contains(&status) || status == 204 || status == 304
}

static VERIFYING_CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();
static INSECURE_CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();

fn client_config(verification: TlsVerification) -> Result<Arc<ClientConfig>> {
    let cell = match verification {
        TlsVerification::Verify => &VERIFYING_CONFIG,
        TlsVerification::InsecureSkipVerify => &INSECURE_CONFIG,
    };
    if let Some(config) = cell.get() {
        return Ok(config.clone());
    }
    let config = Arc::new(build_client_config(verification).map_err(|e| HttpError::Tls(e.to_string()))?);
    Ok(cell.get_or_init(|| config).clone())
}

fn build_client_config(verification: TlsVerification) -> std::result::Result<ClientConfig, rustls::Error> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?;

    let config = match verification {
        TlsVerification::Verify => {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            builder.with_root_certificates(roots).with_no_client_auth()
        }
        TlsVerification::InsecureSkipVerify => {
            tracing::warn!("building TLS config that accepts any server certificate");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
                .with_no_client_auth()
        }
    };
    Ok(config)
}

/// Accepts every certificate chain; handshake signatures are still checked.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}
