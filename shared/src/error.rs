use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The single failure taxonomy for remote calls.
///
/// The variants only carry detail for logs; callers treat every one of them
/// the same way (revert, report, never propagate).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NetworkError {
    #[error("transport failure: {message}")]
    Transport { message: String },

    #[error("server responded with status {code}")]
    Status { code: u16 },

    #[error("malformed payload: {message}")]
    Payload { message: String },
}

impl NetworkError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn payload(message: impl Into<String>) -> Self {
        Self::Payload {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "NETWORK_TRANSPORT",
            Self::Status { .. } => "NETWORK_STATUS",
            Self::Payload { .. } => "NETWORK_PAYLOAD",
        }
    }

    /// Status code when the server answered at all.
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { code } => Some(*code),
            _ => None,
        }
    }
}

/// Shell-reported failures. An HTTP error the shell already classified keeps
/// its status; everything else never reached the server.
impl From<crux_http::Error> for NetworkError {
    fn from(e: crux_http::Error) -> Self {
        match e {
            crux_http::Error::Http(http) => Self::Status {
                code: u16::from(http.code),
            },
            other => Self::transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(e: serde_json::Error) -> Self {
        Self::payload(e.to_string())
    }
}

pub type NetworkResult<T> = Result<T, NetworkError>;

/// Rejections of an optimistic toggle before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToggleError {
    #[error("item {0} is not in the list")]
    ItemNotFound(String),

    #[error("item {id} does not support {field}")]
    Unsupported { id: String, field: &'static str },

    #[error("list has been disposed")]
    Disposed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("tweet content cannot be empty")]
    EmptyContent,

    #[error("invalid image URL: {0}")]
    InvalidImageUrl(String),

    #[error("a tweet is already being posted")]
    AlreadySubmitting,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileUpdateError {
    #[error("name is required")]
    NameRequired,

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("invalid website: {0}")]
    InvalidWebsite(String),

    #[error("a profile update is already being saved")]
    AlreadySaving,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(String),

    #[error("invalid API base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid credential key {0:?}")]
    InvalidCredentialKey(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("credential storage failed: {0}")]
    Storage(String),

    #[error("profile fetch failed: {0}")]
    Profile(#[from] NetworkError),

    #[error("no active session")]
    NotAuthenticated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_codes() {
        assert_eq!(NetworkError::transport("x").code(), "NETWORK_TRANSPORT");
        assert_eq!(NetworkError::Status { code: 500 }.code(), "NETWORK_STATUS");
        assert_eq!(NetworkError::payload("x").code(), "NETWORK_PAYLOAD");
    }

    #[test]
    fn test_network_error_http_status() {
        assert_eq!(NetworkError::Status { code: 404 }.http_status(), Some(404));
        assert_eq!(NetworkError::transport("offline").http_status(), None);
    }

    #[test]
    fn test_network_error_serde_tagged() {
        let json = serde_json::to_string(&NetworkError::Status { code: 503 }).unwrap();
        assert_eq!(json, r#"{"kind":"status","code":503}"#);
        let back: NetworkError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NetworkError::Status { code: 503 });
    }

    #[test]
    fn test_shell_http_errors() {
        let timeout = NetworkError::from(crux_http::Error::Timeout);
        assert!(matches!(timeout, NetworkError::Transport { .. }));
        assert_eq!(timeout.code(), "NETWORK_TRANSPORT");

        let io = NetworkError::from(crux_http::Error::Io("connection reset".into()));
        assert_eq!(io, NetworkError::transport("IO error: connection reset"));

        let refused = NetworkError::from(crux_http::Error::from(
            crux_http::http::Error::from_str(crux_http::http::StatusCode::Unauthorized, "unauthorized"),
        ));
        assert_eq!(refused.http_status(), Some(401));
    }

    #[test]
    fn test_json_error_is_payload() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(NetworkError::from(err), NetworkError::Payload { .. }));
    }
}
