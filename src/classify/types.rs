//! Shared types for email classification.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::MAX_BATCH_SIZE;
use crate::error::ApiError;

// ── Category ────────────────────────────────────────────────────────

/// The closed set of labels a result may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Important,
    Promotions,
    Social,
    Marketing,
    Spam,
    General,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Important,
        Self::Promotions,
        Self::Social,
        Self::Marketing,
        Self::Spam,
        Self::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Important => "Important",
            Self::Promotions => "Promotions",
            Self::Social => "Social",
            Self::Marketing => "Marketing",
            Self::Spam => "Spam",
            Self::General => "General",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Input ───────────────────────────────────────────────────────────

/// One email submitted for classification.
///
/// Every field is optional; empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

impl EmailInput {
    /// Build from an arbitrary JSON element without failing.
    ///
    /// Strings are kept, numbers are stringified, everything else is
    /// dropped. A non-object element yields an input with no fields.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let field = |key: &str| -> Option<String> {
            match obj.get(key)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };
        Self {
            id: field("id"),
            subject: field("subject"),
            from: field("from"),
            body: field("body"),
            snippet: field("snippet"),
        }
    }

    /// The id, unless absent or empty.
    pub fn id(&self) -> Option<&str> {
        non_empty(&self.id)
    }

    pub fn subject_or_default(&self) -> &str {
        non_empty(&self.subject).unwrap_or("No subject")
    }

    pub fn from_or_default(&self) -> &str {
        non_empty(&self.from).unwrap_or("Unknown")
    }

    pub fn body_or_default(&self) -> &str {
        non_empty(&self.body).unwrap_or("")
    }

    pub fn snippet_or_default(&self) -> &str {
        non_empty(&self.snippet).unwrap_or("")
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// A validated `POST /api/classify` body.
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub emails: Vec<EmailInput>,
    pub openai_key: String,
}

impl ClassifyRequest {
    /// Validate the raw request body. Checks run in a fixed order and the
    /// first failure wins.
    pub fn from_json(body: &Value) -> Result<Self, ApiError> {
        let emails = match body.get("emails").and_then(Value::as_array) {
            Some(list) if !list.is_empty() => list,
            _ => {
                return Err(ApiError::InvalidRequest(
                    "Valid emails array is required".to_string(),
                ));
            }
        };

        let openai_key = match body.get("openaiKey").and_then(Value::as_str) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => {
                return Err(ApiError::InvalidRequest(
                    "OpenAI API key is required".to_string(),
                ));
            }
        };

        if emails.len() > MAX_BATCH_SIZE {
            return Err(ApiError::InvalidRequest(format!(
                "Maximum {MAX_BATCH_SIZE} emails can be classified at once"
            )));
        }

        Ok(Self {
            emails: emails.iter().map(EmailInput::from_value).collect(),
            openai_key,
        })
    }
}

// ── Output ──────────────────────────────────────────────────────────

/// One classification row, real or degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub id: String,
    pub category: Category,
    pub confidence: f64,
    pub reasoning: String,
}

impl ClassificationResult {
    /// Reasoning attached to the degraded default.
    pub const FALLBACK_REASONING: &'static str = "Classification failed - defaulted to General";

    /// The placeholder recorded for an email whose classification failed.
    pub fn degraded(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: Category::General,
            confidence: 0.0,
            reasoning: Self::FALLBACK_REASONING.to_string(),
        }
    }
}

/// An email that could not be classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchError {
    pub id: String,
    pub error: String,
}

/// Counts reported alongside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Everything a batch produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub classifications: Vec<ClassificationResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BatchError>,
    pub summary: BatchSummary,
}

impl BatchOutcome {
    /// Assemble an outcome, deriving the summary from the accumulated rows.
    ///
    /// `successful` counts rows with positive confidence, so degraded
    /// defaults never count.
    pub fn new(
        total: usize,
        classifications: Vec<ClassificationResult>,
        errors: Vec<BatchError>,
    ) -> Self {
        let successful = classifications
            .iter()
            .filter(|r| r.confidence > 0.0)
            .count();
        let summary = BatchSummary {
            total,
            successful,
            failed: errors.len(),
        };
        Self {
            classifications,
            errors,
            summary,
        }
    }
}
