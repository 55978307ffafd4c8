use serde::Deserialize;
use thiserror::Error;

/// Structured error payload returned by the server on non-2xx responses.
///
/// Every field is optional: the list endpoint includes `path`, the mutation
/// endpoints do not, and a proxy in between may answer with plain text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub path: Option<String>,
}

impl ErrorBody {
    /// Parse a response body, keeping non-JSON text as the message.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        serde_json::from_str(trimmed).unwrap_or_else(|_| Self {
            message: Some(trimmed.to_string()),
            ..Self::default()
        })
    }
}

/// Errors produced by a [`StudentApi`](super::StudentApi) call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("Server responded with status {status}")]
    Status { status: u16, body: ErrorBody },

    /// A 2xx response whose body could not be decoded.
    #[error("Malformed response from {url}: {reason}")]
    Parse { url: String, reason: String },
}

impl ApiError {
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network { .. } | Self::Parse { .. } => None,
        }
    }

    pub const fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::Status { body, .. } => Some(body),
            Self::Network { .. } | Self::Parse { .. } => None,
        }
    }
}
