//! Decomposition of `http(s)://host[:port][/path]` into connection parameters.
//!
//! Host syntax is not validated here; an unusable host surfaces later as a
//! resolution failure.

use crate::error::{HttpError, Result};

const HTTP_SCHEME: &str = "http://";
const HTTPS_SCHEME: &str = "https://";

/// Connection parameters extracted from a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub use_tls: bool,
    pub host: String,
    pub port: u16,
    /// Always starts with `/`.
    pub path: String,
}

pub fn parse_url(url: &str) -> Result<ParsedUrl> {
    let (rest, use_tls, default_port) = if let Some(rest) = url.strip_prefix(HTTPS_SCHEME) {
        (rest, true, 443)
    } else if let Some(rest) = url.strip_prefix(HTTP_SCHEME) {
        (rest, false, 80)
    } else {
        return Err(HttpError::MalformedUrl(format!(
            "unsupported scheme in {url:?}"
        )));
    };

    let slash = rest.find('/');
    let (authority, path) = match slash {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };

    // Only a colon inside the authority denotes a port; `/a:b` is path data.
    let (host, port) = match authority.find(':') {
        Some(colon) => (&authority[..colon], parse_port(&authority[colon + 1..], url)?),
        None => (authority, default_port),
    };

    Ok(ParsedUrl {
        use_tls,
        host: host.to_string(),
        port,
        path: path.to_string(),
    })
}

fn parse_port(token: &str, url: &str) -> Result<u16> {
    match token.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(HttpError::MalformedUrl(format!(
            "invalid port {token:?} in {url:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_with_path_uses_port_80() {
        let parsed = parse_url("http://example.com/index.html").unwrap();
        assert_eq!(
            parsed,
            ParsedUrl {
                use_tls: false,
                host: "example.com".to_string(),
                port: 80,
                path: "/index.html".to_string(),
            }
        );
    }

    #[test]
    fn https_with_port_and_no_path() {
        let parsed = parse_url("https://example.com:8443").unwrap();
        assert!(parsed.use_tls);
        assert_eq!(parsed.host, "example.com");
        assert_eq!(parsed.port, 8443);
        assert_eq!(parsed.path, "/");
    }

    #[test]
    fn https_defaults_to_443() {
        let parsed = parse_url("https://example.com/api/v1?q=1").unwrap();
        assert_eq!(parsed.port, 443);
        assert_eq!(parsed.path, "/api/v1?q=1");
    }

    #[test]
    fn bare_host_gets_root_path() {
        let parsed = parse_url("http://example.com").unwrap();
        assert_eq!(parsed.host, "example.com");
        assert_eq!(parsed.path, "/");
    }

    #[test]
    fn port_with_path() {
        let parsed = parse_url("http://10.0.0.1:8080/status").unwrap();
        assert_eq!(parsed.host, "10.0.0.1");
        assert_eq!(parsed.port, 8080);
        assert_eq!(parsed.path, "/status");
    }

    #[test]
    fn colon_after_slash_is_part_of_path() {
        let parsed = parse_url("http://example.com/a:b").unwrap();
        assert_eq!(parsed.host, "example.com");
        assert_eq!(parsed.port, 80);
        assert_eq!(parsed.path, "/a:b");
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let err = parse_url("ftp://example.com/").unwrap_err();
        assert!(matches!(err, HttpError::MalformedUrl(_)));
        let err = parse_url("example.com").unwrap_err();
        assert!(matches!(err, HttpError::MalformedUrl(_)));
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let err = parse_url("http://example.com:http/").unwrap_err();
        assert!(matches!(err, HttpError::MalformedUrl(_)));
    }

    #[test]
    fn empty_and_out_of_range_ports_are_rejected() {
        assert!(parse_url("http://example.com:/").is_err());
        assert!(parse_url("http://example.com:0/").is_err());
        assert!(parse_url("http://example.com:70000/").is_err());
    }
}
