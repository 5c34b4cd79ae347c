use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ChatError;
use crate::state::{ChatTurn, ConversationHistory};

/// Answer fields probed on the service reply, in order of preference.
pub const ANSWER_FIELDS: [&str; 3] = ["respuesta", "response", "message"];

/// Returned when the reply parses but carries none of [`ANSWER_FIELDS`].
pub const ANSWER_PLACEHOLDER: &str = "Respuesta recibida del sistema RAG";

/// Body of `POST <chat-endpoint>`.
///
/// `historial` is the window as it stood *before* this question.
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeRequest {
    pub pregunta: String,
    pub historial: Vec<ChatTurn>,
}

impl ExchangeRequest {
    pub fn new(question: &str, history: &ConversationHistory) -> Self {
        Self {
            pregunta: question.to_string(),
            historial: history.to_vec(),
        }
    }
}

/// Pick the answer text out of a reply body.
///
/// Empty strings and non-string values count as absent, so the probe moves on
/// to the next candidate field.
pub fn extract_answer(body: &Value) -> String {
    ANSWER_FIELDS
        .iter()
        .filter_map(|field| body.get(field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .unwrap_or(ANSWER_PLACEHOLDER)
        .to_string()
}

/// Owns the conversation window and performs the ask/answer exchange.
///
/// `ask` takes `&mut self`, so one session can never have two exchanges in
/// flight. Front-ends that spawn the exchange move the session into the task
/// and take it back when the task resolves.
pub struct ChatSession {
    client: Client,
    endpoint: String,
    history: ConversationHistory,
}

impl ChatSession {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ChatError> {
        reqwest::Url::parse(endpoint)
            .map_err(|e| ChatError::Config(format!("invalid chat endpoint '{endpoint}': {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            history: ConversationHistory::new(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ChatError> {
        Self::new(&config.chat_url, config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `question` with the current history window and return the answer.
    ///
    /// History is only updated after an answer has been extracted. Any error
    /// leaves it untouched.
    pub async fn ask(&mut self, question: &str) -> Result<String, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::Validation("question is empty".to_string()));
        }

        let request = ExchangeRequest::new(question, &self.history);
        debug!(
            endpoint = %self.endpoint,
            history_len = request.historial.len(),
            "sending question"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "chat request failed");
                ChatError::from_transport(e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "chat service returned an error status");
            return Err(ChatError::from_status(status));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(ChatError::from_transport)?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(error = %e, "chat reply is not JSON");
            ChatError::Protocol(format!("reply is not valid JSON: {e}"))
        })?;

        let answer = extract_answer(&body);
        self.history.push_exchange(question, &answer);
        info!(history_len = self.history.len(), "exchange recorded");

        Ok(answer)
    }

    pub fn reset(&mut self) {
        self.history.clear();
        debug!("conversation history cleared");
    }

    /// Owned copy of the window; callers never see the live history.
    pub fn history_snapshot(&self) -> Vec<ChatTurn> {
        self.history.to_vec()
    }
}
