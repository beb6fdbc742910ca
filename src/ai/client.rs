use reqwest::Client;

use crate::config::OpenAiConfig;

use super::{
    classifier::ClassificationError,
    inference::{build_request, reply_text, ChatCompletionResponse},
};

/// OpenAI-compatible chat-completions client used as the judgment service.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(http: Client, config: OpenAiConfig) -> Self {
        Self { http, config }
    }

    pub(super) async fn complete(
        &self,
        system: String,
        user: String,
    ) -> Result<String, ClassificationError> {
        let request = build_request(&self.config.model, system, user);
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let completion: ChatCompletionResponse = response.json().await?;
        reply_text(completion)
    }
}
