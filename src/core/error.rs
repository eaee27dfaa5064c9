use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConductorError {
    #[error("{provider} timed out after {timeout_ms} ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("{provider} returned HTTP {status}: {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("{provider} sent a malformed response: {reason}")]
    MalformedResponse { provider: String, reason: String },

    #[error("No provider available: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl ConductorError {
    /// Failures that count toward opening a circuit; request errors do not.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            ConductorError::Timeout { .. }
                | ConductorError::Http { .. }
                | ConductorError::Transport(_)
                | ConductorError::MalformedResponse { .. }
                | ConductorError::Unavailable(_)
        )
    }
}

impl From<reqwest::Error> for ConductorError {
    fn from(e: reqwest::Error) -> Self {
        ConductorError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConductorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_failure_classification() {
        let timeout = ConductorError::Timeout {
            provider: "ollama".into(),
            timeout_ms: 500,
        };
        assert!(timeout.is_provider_failure());
        assert!(ConductorError::Transport("refused".into()).is_provider_failure());
        assert!(!ConductorError::Config("bad".into()).is_provider_failure());
    }

    #[test]
    fn test_error_messages() {
        let err = ConductorError::Http {
            provider: "remote".into(),
            status: 503,
            body: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "remote returned HTTP 503: overloaded");
    }
}
