use super::{JudgeError, TextJudge};
use crate::model::{Completion, JudgeRequest};
use async_trait::async_trait;
use serde_json::json;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions judge for OpenAI and API-compatible gateways.
pub struct OpenAiJudge {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub json_mode: bool,
    client: reqwest::Client,
}

impl OpenAiJudge {
    pub fn new(model: String, api_key: String, max_tokens: u32) -> Self {
        Self {
            model,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens,
            json_mode: false,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Ask the endpoint for `response_format: json_object`.
    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn max_tokens_for(&self, request: &JudgeRequest) -> u32 {
        request
            .max_tokens
            .map_or(self.max_tokens, |hint| hint.max(self.max_tokens))
    }
}

#[async_trait]
impl TextJudge for OpenAiJudge {
    async fn complete(&self, request: &JudgeRequest) -> Result<Completion, JudgeError> {
        let url = self.endpoint();
        crate::providers::network::check_outbound(&url)?;

        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "temperature": request.temperature,
            "max_tokens": self.max_tokens_for(request),
        });
        if self.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(JudgeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = resp.json().await?;

        // choices[0].message.content
        let text = json
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JudgeError::MalformedResponse("missing choices[0].message.content".into()))?
            .to_string();

        let mut meta = json!({});
        if let Some(usage) = json.get("usage") {
            meta["usage"] = json!({
                "input_tokens": usage.get("prompt_tokens").and_then(|v| v.as_u64()),
                "output_tokens": usage.get("completion_tokens").and_then(|v| v.as_u64()),
            });
        }

        Ok(Completion {
            text,
            provider: "openai".to_string(),
            model: json
                .get("model")
                .and_then(|v| v.as_str())
                .unwrap_or(&self.model)
                .to_string(),
            meta,
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
