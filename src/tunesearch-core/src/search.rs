use crate::models::SearchResponse;
use async_trait::async_trait;
use thiserror::Error;

/// Failures of a single search call, as surfaced to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    /// The request never produced a usable response (connect/DNS/reset/timeout
    /// or an unparseable body).
    #[error("network error: {message}")]
    Transport { message: String },
}

pub type NetworkResult<T> = Result<T, NetworkError>;

/// Remote catalog search.
///
/// Implementations issue exactly one outbound request per call and never
/// retry. `term` arrives trimmed and non-empty; blank queries are filtered out
/// by the caller.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Stable identifier used in logs (e.g. "itunes").
    fn id(&self) -> &str;

    async fn search(&self, term: &str) -> NetworkResult<SearchResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_failure_kind() {
        let http = NetworkError::Http {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert_eq!(http.to_string(), "HTTP 503: Service Unavailable");

        let transport = NetworkError::Transport {
            message: "connection reset".into(),
        };
        assert_eq!(transport.to_string(), "network error: connection reset");
    }
}
