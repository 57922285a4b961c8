//! Client configuration.
//!
//! Loaded from JSON through serde or from `TINYREQ_*` environment variables.
//! Missing fields fall back to the defaults.

use serde::Deserialize;

/// User agent sent unless the caller overrides it per request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0.3538.102 Safari/537.36";

/// How the transport decides that a response has been fully received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadFraming {
    /// Stop at the first read that returns fewer bytes than the read buffer.
    ///
    /// Approximate: a response whose final segment exactly fills the buffer
    /// makes the next read block until the peer closes or sends more.
    #[default]
    ShortRead,
    /// Read the header block, then exactly `Content-Length` body bytes. With
    /// no `Content-Length`, read until the peer closes the connection.
    ContentLength,
}

impl std::str::FromStr for ReadFraming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short-read" => Ok(ReadFraming::ShortRead),
            "content-length" => Ok(ReadFraming::ContentLength),
            other => Err(format!("unknown read framing: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub read_framing: ReadFraming,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            read_framing: ReadFraming::default(),
        }
    }
}

impl ClientConfig {
    /// Build a config from `TINYREQ_USER_AGENT` and `TINYREQ_READ_FRAMING`.
    ///
    /// An unrecognized framing value is logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(user_agent) = lookup("TINYREQ_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(framing) = lookup("TINYREQ_READ_FRAMING") {
            match framing.parse() {
                Ok(framing) => config.read_framing = framing,
                Err(e) => tracing::warn!("ignoring TINYREQ_READ_FRAMING: {e}"),
            }
        }
        config
    }
}
