use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::{diff::ChangeSet, domain::Target};

use super::{
    client::OpenAiClient,
    inference::{change_payload, importance_prompt, is_affirmative, summary_prompt},
};

/// Failure talking to the judgment service. Fatal for a monitoring session.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("classification service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("classification service returned a malformed reply: {0}")]
    MalformedReply(&'static str),
    #[error("classification service returned an empty summary")]
    EmptySummary,
}

/// Judges and summarizes content changes against a preference profile.
#[async_trait]
pub trait ChangeClassifier: Send + Sync {
    async fn is_important(
        &self,
        target: &Target,
        old_content: &str,
        new_content: &str,
        preferences: &str,
    ) -> Result<bool, ClassificationError>;

    async fn summarize(
        &self,
        target: &Target,
        old_content: &str,
        new_content: &str,
        preferences: &str,
    ) -> Result<String, ClassificationError>;
}

#[async_trait]
impl ChangeClassifier for OpenAiClient {
    async fn is_important(
        &self,
        target: &Target,
        old_content: &str,
        new_content: &str,
        preferences: &str,
    ) -> Result<bool, ClassificationError> {
        let changes = ChangeSet::between(old_content, new_content);
        let reply = self
            .complete(
                importance_prompt(target, preferences),
                change_payload(&changes),
            )
            .await?;
        let answer = reply.trim().to_lowercase();
        info!(target: "classifier", url = %target, answer = %answer, "importance check answered");
        Ok(is_affirmative(&answer))
    }

    async fn summarize(
        &self,
        target: &Target,
        old_content: &str,
        new_content: &str,
        preferences: &str,
    ) -> Result<String, ClassificationError> {
        let changes = ChangeSet::between(old_content, new_content);
        let summary = self
            .complete(summary_prompt(target, preferences), change_payload(&changes))
            .await?;
        if summary.trim().is_empty() {
            return Err(ClassificationError::EmptySummary);
        }
        Ok(summary)
    }
}
