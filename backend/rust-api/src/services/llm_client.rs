use anyhow::{anyhow, Context, Result};
use reqwest::Client;

use crate::metrics::{LLM_REQUESTS_TOTAL, LLM_REQUEST_DURATION_SECONDS};
use crate::models::ChatMessage;

/// Sampling knobs for one chat-completion call. Explanations run cooler and
/// longer than follow-up chat turns.
#[derive(Debug, Clone, Copy)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Thin client for the provider's OpenAI-compatible chat-completion
/// endpoint. Constructed once per process and injected through `AppState`;
/// calls are plain blocking-within-the-request HTTP with no retry or
/// explicit timeout, callers degrade to fallback text on failure.
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        Self {
            http: Client::new(),
            api_url,
            api_key,
            model,
        }
    }

    /// Sends the message sequence and returns the assistant's reply text.
    pub async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        options: SamplingOptions,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_url.trim_end_matches('/'));

        let payload = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        });

        tracing::debug!(
            "Calling LLM chat completion: model={}, messages={}",
            self.model,
            messages.len()
        );

        let start = std::time::Instant::now();
        let result = self.send(&url, &payload).await;
        LLM_REQUEST_DURATION_SECONDS.observe(start.elapsed().as_secs_f64());

        let outcome = if result.is_ok() { "success" } else { "error" };
        LLM_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();

        result
    }

    async fn send(&self, url: &str, payload: &serde_json::Value) -> Result<String> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .context("Failed to call LLM provider")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("LLM provider returned {}: {}", status, error_text));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse LLM provider response")?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("LLM response missing message content"))?
            .to_string();

        Ok(content)
    }
}
