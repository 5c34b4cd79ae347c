use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ChatError;

/// Why a comparison did not produce text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport failure, timeout, or non-2xx status.
    Network,
    /// Body was not JSON, or JSON of an unrecognized shape.
    Protocol,
    /// The service answered with an explicit `error` field.
    Service,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonResult {
    Success { text: String },
    Failure { kind: FailureKind, message: String },
}

impl ComparisonResult {
    fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        ComparisonResult::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ComparisonResult::Success { .. })
    }
}

/// Two article identifiers that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRequest {
    pub first_id: String,
    pub second_id: String,
}

/// Why a pair of article ids was rejected before anything was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidPair {
    #[error("both article numbers are required")]
    MissingId,
    #[error("the two articles must be different")]
    SameId,
}

impl ComparisonRequest {
    /// Trim both ids and reject empty or identical pairs (case-sensitive).
    pub fn parse(first_id: &str, second_id: &str) -> Result<Self, InvalidPair> {
        let first_id = first_id.trim();
        let second_id = second_id.trim();

        if first_id.is_empty() || second_id.is_empty() {
            return Err(InvalidPair::MissingId);
        }
        if first_id == second_id {
            return Err(InvalidPair::SameId);
        }

        Ok(Self {
            first_id: first_id.to_string(),
            second_id: second_id.to_string(),
        })
    }

    /// [`parse`](Self::parse), reported as a [`ChatError::Validation`].
    pub fn new(first_id: &str, second_id: &str) -> Result<Self, ChatError> {
        Self::parse(first_id, second_id).map_err(|e| ChatError::Validation(e.to_string()))
    }
}

/// Classify a parsed comparison reply.
pub fn interpret_reply(body: &Value) -> ComparisonResult {
    if let Some(text) = body.get("comparacion").and_then(Value::as_str) {
        return ComparisonResult::Success {
            text: text.to_string(),
        };
    }
    if let Some(message) = body.get("error").and_then(Value::as_str) {
        return ComparisonResult::failure(FailureKind::Service, message);
    }
    ComparisonResult::failure(FailureKind::Protocol, "unexpected response shape")
}

/// Submits two-article comparisons. Stateless, cheap to clone.
#[derive(Clone)]
pub struct ArticleComparator {
    client: Client,
    endpoint: String,
}

impl ArticleComparator {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ChatError> {
        reqwest::Url::parse(endpoint).map_err(|e| {
            ChatError::Config(format!("invalid comparison endpoint '{endpoint}': {e}"))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ChatError> {
        Self::new(&config.compare_url, config.timeout())
    }

    /// Compare two articles.
    ///
    /// Only local validation produces an `Err`; every remote outcome is folded
    /// into [`ComparisonResult`].
    pub async fn compare(
        &self,
        first_id: &str,
        second_id: &str,
    ) -> Result<ComparisonResult, ChatError> {
        let request = ComparisonRequest::new(first_id, second_id)?;
        Ok(self.send(&request).await)
    }

    async fn send(&self, request: &ComparisonRequest) -> ComparisonResult {
        debug!(
            art1 = %request.first_id,
            art2 = %request.second_id,
            "requesting comparison"
        );

        let response = match self
            .client
            .get(&self.endpoint)
            .query(&[
                ("art1", request.first_id.as_str()),
                ("art2", request.second_id.as_str()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "comparison request failed");
                return ComparisonResult::failure(
                    FailureKind::Network,
                    ChatError::from_transport(e).to_string(),
                );
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "comparison service returned an error status");
            return ComparisonResult::failure(
                FailureKind::Network,
                ChatError::from_status(status).to_string(),
            );
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return ComparisonResult::failure(
                    FailureKind::Network,
                    ChatError::from_transport(e).to_string(),
                )
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(body) => {
                let result = interpret_reply(&body);
                if !result.is_success() {
                    warn!(?result, "comparison did not succeed");
                }
                result
            }
            Err(e) => ComparisonResult::failure(
                FailureKind::Protocol,
                format!("reply is not valid JSON: {e}"),
            ),
        }
    }
}
