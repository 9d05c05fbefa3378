//! Email classification.
//!
//! A batch flows through:
//! 1. `ClassifyRequest::from_json()`: batch-level validation, no LLM calls
//! 2. `build_classification_prompt()`: one prompt per email
//! 3. `BatchClassifier`: sequential LLM calls with a pause between emails
//! 4. `parse_classification()`: JSON extraction + schema validation
//!
//! Per-email failures are folded into the outcome, never raised.

pub mod processor;
pub mod prompt;
pub mod types;
pub mod validate;

pub use processor::BatchClassifier;
pub use prompt::{PromptFields, build_classification_prompt};
pub use types::{
    BatchError, BatchOutcome, BatchSummary, Category, ClassificationResult, ClassifyRequest,
    EmailInput,
};
pub use validate::{Verdict, extract_json_object, parse_classification, validate_classification};
