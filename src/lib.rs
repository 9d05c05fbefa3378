//! Mail classifier: labels emails into six fixed categories via an LLM.

pub mod classify;
pub mod config;
pub mod error;
pub mod llm;
pub mod server;
