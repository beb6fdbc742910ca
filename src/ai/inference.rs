use serde::{Deserialize, Serialize};

use crate::{diff::ChangeSet, domain::Target};

use super::classifier::ClassificationError;

pub const AFFIRMATIVE_TOKEN: &str = "yes";

pub fn importance_prompt(target: &Target, preferences: &str) -> String {
    format!(
        "Determine if the following changes on {target} are important enough to warrant a report. \
         User profile: {preferences}. Respond with a single word: 'Yes' or 'No'."
    )
}

pub fn summary_prompt(target: &Target, preferences: &str) -> String {
    format!(
        "Analyze content changes for {target}. User profile: {preferences}. \
         Focus on factual changes, ignore formatting. Use concise bullet points."
    )
}

pub fn change_payload(changes: &ChangeSet) -> String {
    format!(
        "Removed content:\n{}\n\nAdded content:\n{}",
        changes.removed.join("\n"),
        changes.added.join("\n")
    )
}

/// Free-text verdict: important iff the reply mentions the affirmative token.
pub fn is_affirmative(reply: &str) -> bool {
    reply.trim().to_lowercase().contains(AFFIRMATIVE_TOKEN)
}

pub fn build_request(model: &str, system: String, user: String) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".into(),
                content: system,
            },
            ChatMessage {
                role: "user".into(),
                content: user,
            },
        ],
    }
}

pub fn reply_text(completion: ChatCompletionResponse) -> Result<String, ClassificationError> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or(ClassificationError::MalformedReply("no choices"))?;

    choice
        .message
        .and_then(|msg| msg.content)
        .ok_or(ClassificationError::MalformedReply("missing message content"))
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChatCompletionMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionMessage {
    pub content: Option<String>,
}
