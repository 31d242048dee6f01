//! Assistant service clients.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;

use fenestra_engine::Selections;

use crate::error::{AiError, AiResult};
use crate::reply::AiReply;

/// Turns free text plus the current selections into an assistant reply.
///
/// `ask` never fails: any transport or decoding problem is logged and
/// answered with [`AiReply::fallback`], so callers handle a single shape.
#[async_trait::async_trait]
pub trait AssistantClient: Send + Sync {
    async fn ask(&self, prompt: &str, selections: &Selections) -> AiReply;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AskRequest<'a> {
    prompt: &'a str,
    product_choice: &'a Selections,
}

/// Client for the assistant's HTTP endpoint (`POST {prompt, productChoice}`).
#[derive(Debug, Clone)]
pub struct HttpAssistantClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAssistantClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> AiResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn try_ask(&self, prompt: &str, selections: &Selections) -> AiResult<AiReply> {
        if prompt.trim().is_empty() {
            return Err(AiError::InvalidInput("empty prompt".to_string()));
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            prompt_len = prompt.len(),
            "sending assistant request"
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&AskRequest {
                prompt,
                product_choice: selections,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body: body.chars().take(100).collect(),
            });
        }

        let body = resp.text().await?;
        let reply: AiReply = serde_json::from_str(&body)?;
        tracing::info!(
            status = ?reply.status,
            has_data = reply.data.is_some(),
            "assistant reply received"
        );
        Ok(reply)
    }
}

#[async_trait::async_trait]
impl AssistantClient for HttpAssistantClient {
    async fn ask(&self, prompt: &str, selections: &Selections) -> AiReply {
        match self.try_ask(prompt, selections).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(endpoint = %self.endpoint, error = %err, "assistant request failed");
                AiReply::fallback()
            }
        }
    }
}

/// Replays queued replies in order; answers the fallback once exhausted.
///
/// For tests and offline runs.
#[derive(Debug, Default)]
pub struct ScriptedAssistantClient {
    replies: Mutex<VecDeque<AiReply>>,
    prompts: Mutex<Vec<(String, Selections)>>,
}

impl ScriptedAssistantClient {
    pub fn new(replies: impl IntoIterator<Item = AiReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, reply: AiReply) {
        lock(&self.replies).push_back(reply);
    }

    /// Every `(prompt, selections)` pair asked so far.
    pub fn prompts(&self) -> Vec<(String, Selections)> {
        lock(&self.prompts).clone()
    }
}

#[async_trait::async_trait]
impl AssistantClient for ScriptedAssistantClient {
    async fn ask(&self, prompt: &str, selections: &Selections) -> AiReply {
        lock(&self.prompts).push((prompt.to_string(), *selections));
        lock(&self.replies).pop_front().unwrap_or_else(AiReply::fallback)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
