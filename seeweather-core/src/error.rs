use reqwest::StatusCode;
use thiserror::Error;

/// Failure modes of a single weather fetch.
///
/// `Transport` and `Status` are both network-level failures; `Decode` means
/// the provider answered but the payload did not match the expected shape.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to reach the weather provider: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("weather provider returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("could not decode weather payload: {0}")]
    Decode(#[source] serde_json::Error),
}

impl FetchError {
    /// True for transport failures and non-success HTTP statuses.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Status { .. })
    }
}

/// Why no coordinate could be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    Denied,

    #[error("no position fix available")]
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_count_as_network() {
        let err = FetchError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: "{\"message\":\"Invalid API key\"}".to_string(),
        };
        assert!(err.is_network());
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn decode_errors_are_not_network() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        assert!(!FetchError::Decode(json_err).is_network());
    }
}
