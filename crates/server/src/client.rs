//! Client for the assistant's HTTP API, used by chat front ends.

use civic_knowledge::Source;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const UNREACHABLE_MESSAGE: &str =
    "Sorry, I couldn't connect to the information service. Please try again later.";

pub const UNEXPECTED_MESSAGE: &str =
    "Sorry, I received an unexpected response from the information service.";

/// How a question turned out, from the chat user's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    Answer { answer: String, sources: Vec<Source> },

    /// The service replied, but not with an answer
    Unexpected,

    /// Connection failure, error status or undecodable body
    Unreachable(String),
}

impl ChatReply {
    /// Text shown to the user.
    pub fn message(&self) -> &str {
        match self {
            ChatReply::Answer { answer, .. } => answer,
            ChatReply::Unexpected => UNEXPECTED_MESSAGE,
            ChatReply::Unreachable(_) => UNREACHABLE_MESSAGE,
        }
    }

    pub fn sources(&self) -> &[Source] {
        match self {
            ChatReply::Answer { sources, .. } => sources,
            _ => &[],
        }
    }
}

#[derive(Debug, Deserialize)]
struct SourceBody {
    #[serde(default = "not_available")]
    title: String,
    #[serde(default = "not_available")]
    category: String,
}

fn not_available() -> String {
    "N/A".to_string()
}

pub struct AssistantClient {
    http: reqwest::Client,
    query_url: String,
}

impl AssistantClient {
    /// `base_url` is the service root, e.g. `http://localhost:8000`.
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            query_url: format!("{}/query", base_url.trim_end_matches('/')),
        }
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            http,
            query_url: format!("{}/query", base_url.trim_end_matches('/')),
        }
    }

    /// Send one question. Never fails: every outcome is a [`ChatReply`].
    pub async fn ask(&self, question: &str) -> ChatReply {
        let response = match self
            .http
            .post(&self.query_url)
            .json(&serde_json::json!({ "text": question }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Assistant API unreachable: {}", e);
                return ChatReply::Unreachable(e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!("Assistant API error ({}): {}", status, detail);
            return ChatReply::Unreachable(format!("{}: {}", status, detail));
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Could not decode assistant response: {}", e);
                return ChatReply::Unreachable(e.to_string());
            }
        };

        classify(body)
    }
}

fn classify(body: Value) -> ChatReply {
    let Some(answer) = body.get("answer").and_then(Value::as_str) else {
        return ChatReply::Unexpected;
    };

    let sources = body
        .get("sources")
        .and_then(|s| serde_json::from_value::<Vec<SourceBody>>(s.clone()).ok())
        .unwrap_or_default()
        .into_iter()
        .map(|s| Source {
            title: s.title,
            category: s.category,
        })
        .collect();

    ChatReply::Answer {
        answer: answer.to_string(),
        sources,
    }
}
