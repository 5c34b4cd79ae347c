use thiserror::Error;

/// Failures reported by [`ChatSession`](crate::ChatSession) and
/// [`ArticleComparator`](crate::ArticleComparator).
///
/// None of these are retried internally. A failed exchange leaves the
/// conversation history exactly as it was before the call.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Bad local input. Never reaches the network.
    #[error("validation error: {0}")]
    Validation(String),

    /// Transport failure, timeout, or a non-2xx status from the service.
    /// `status` is `None` when no HTTP response was received at all.
    #[error("{}", network_message(.status, .reason))]
    Network { status: Option<u16>, reason: String },

    /// The service replied, but the body was not usable JSON.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The client could not be built from the supplied configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

fn network_message(status: &Option<u16>, reason: &str) -> String {
    match status {
        Some(code) => format!("HTTP error {code}: {reason}"),
        None => format!("network error: {reason}"),
    }
}

impl ChatError {
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        ChatError::Network {
            status: err.status().map(|s| s.as_u16()),
            reason,
        }
    }

    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        ChatError::Network {
            status: Some(status.as_u16()),
            reason: status.canonical_reason().unwrap_or("unknown").to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ChatError::Validation(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ChatError::Network { .. })
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, ChatError::Protocol(_))
    }
}
