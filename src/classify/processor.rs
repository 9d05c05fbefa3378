//! Batch classifier. Runs each email through the LLM, one at a time.
//!
//! One email's failure never aborts the batch. A failed email gets a
//! `BatchError` and a degraded `General` result, so every email with an id
//! ends up with exactly one result row, in input order.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::prompt::{PromptFields, build_classification_prompt};
use super::types::{BatchError, BatchOutcome, ClassificationResult, EmailInput};
use super::validate::{Verdict, parse_classification};
use crate::config::ClassifierConfig;
use crate::error::ClassifyError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Id recorded for emails submitted without one.
const UNKNOWN_ID: &str = "unknown";

/// Classifies batches of emails against a single provider.
pub struct BatchClassifier {
    llm: Arc<dyn LlmProvider>,
    config: ClassifierConfig,
}

impl BatchClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, config: ClassifierConfig) -> Self {
        Self { llm, config }
    }

    /// Classify every email in order.
    ///
    /// Emails are processed strictly sequentially with the configured pause
    /// after each one, including the last.
    pub async fn classify_batch(&self, emails: Vec<EmailInput>) -> BatchOutcome {
        let total = emails.len();
        info!(total, model = self.llm.model_name(), "Classifying email batch");

        let mut results = Vec::with_capacity(total);
        let mut errors = Vec::new();

        for email in &emails {
            match email.id() {
                None => {
                    warn!("Skipping email without an id");
                    errors.push(BatchError {
                        id: UNKNOWN_ID.to_string(),
                        error: ClassifyError::MissingId.to_string(),
                    });
                }
                Some(id) => match self.classify_one(email).await {
                    Ok(verdict) => {
                        debug!(
                            id,
                            category = %verdict.category,
                            confidence = verdict.confidence,
                            "Email classified"
                        );
                        results.push(ClassificationResult {
                            id: id.to_string(),
                            category: verdict.category,
                            confidence: verdict.confidence,
                            reasoning: verdict.reasoning,
                        });
                    }
                    Err(e) => {
                        warn!(id, error = %e, "Classification failed, defaulting to General");
                        errors.push(BatchError {
                            id: id.to_string(),
                            error: failure_message(&e),
                        });
                        results.push(ClassificationResult::degraded(id));
                    }
                },
            }

            tokio::time::sleep(self.config.inter_item_delay).await;
        }

        let outcome = BatchOutcome::new(total, results, errors);
        info!(
            total = outcome.summary.total,
            successful = outcome.summary.successful,
            failed = outcome.summary.failed,
            "Batch classification complete"
        );
        outcome
    }

    /// Prompt the model for one email and validate what comes back.
    async fn classify_one(&self, email: &EmailInput) -> Result<Verdict, ClassifyError> {
        let prompt = build_classification_prompt(&PromptFields::from_email(email));

        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let response = self.llm.complete(request).await?;
        if response.content.trim().is_empty() {
            return Err(ClassifyError::EmptyResponse);
        }

        parse_classification(&response.content).inspect_err(|e| {
            debug!(raw_response = %response.content, error = ?e, "Unusable classification response");
        })
    }
}

fn failure_message(err: &ClassifyError) -> String {
    let message = err.to_string();
    if message.is_empty() {
        "Classification failed".to_string()
    } else {
        message
    }
}
