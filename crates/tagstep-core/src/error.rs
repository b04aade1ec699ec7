use std::fmt;
use thiserror::Error;

/// Why a remote call failed at the transport or HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCause {
    /// The service answered with a non-2xx status.
    Status(u16),
    /// The request never produced a response (connect, timeout, TLS, ...).
    Transport(String),
}

impl fmt::Display for RemoteCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteCause::Status(code) => write!(f, "HTTP {code}"),
            RemoteCause::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TagstepError {
    #[error("list '{0}' not found in account lists")]
    ListNotFound(String),

    #[error("remote service error ({cause}) for {url}")]
    RemoteService { cause: RemoteCause, url: String },

    #[error("malformed response from {url}: {source}")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid stage map: {0}")]
    InvalidStageMap(String),

    #[error("an advancement run is already in progress for list '{0}'")]
    ListBusy(String),

    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TagstepError {
    /// Only transport and HTTP status failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, TagstepError::RemoteService { .. })
    }

    pub(crate) fn remote(cause: RemoteCause, url: impl Into<String>) -> Self {
        TagstepError::RemoteService {
            cause,
            url: url.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TagstepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_errors_are_transient() {
        let err = TagstepError::remote(RemoteCause::Status(503), "https://x/lists");
        assert!(err.is_transient());
        assert_eq!(
            err.to_string(),
            "remote service error (HTTP 503) for https://x/lists"
        );
    }

    #[test]
    fn malformed_and_not_found_are_not_transient() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let malformed = TagstepError::MalformedResponse {
            url: "https://x/lists".into(),
            source,
        };
        assert!(!malformed.is_transient());
        assert!(!TagstepError::ListNotFound("airt".into()).is_transient());
    }

    #[test]
    fn list_not_found_message_names_the_list() {
        let err = TagstepError::ListNotFound("airt".into());
        assert_eq!(err.to_string(), "list 'airt' not found in account lists");
    }
}
