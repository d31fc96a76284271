//! Runtime error types for the truthgate pipeline.
//!
//! Fallible internal steps return `TruthgateResult<T>`. The public pipeline
//! entry points never surface these errors to callers; they are converted
//! into degraded responses at the orchestration boundary.

use thiserror::Error;

/// The unified error type for the truthgate crates.
#[derive(Debug, Error)]
pub enum TruthgateError {
    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The source catalog could not be loaded or references unknown parts.
    #[error("source catalog error: {reason}")]
    CatalogError { reason: String },

    /// An extractor could not interpret a fetched payload.
    #[error("extraction failed in '{extractor}': {reason}")]
    ExtractionError { extractor: String, reason: String },

    /// The stage-2 fallback classifier failed.
    #[error("classifier error: {reason}")]
    ClassifierError { reason: String },

    /// The response-generation collaborator failed to produce text.
    #[error("response generation failed: {reason}")]
    GenerationError { reason: String },

    /// A value could not be converted to or from its cached JSON form.
    #[error("serialization error: {reason}")]
    SerializationError { reason: String },

    /// An HTTP client could not be constructed or used.
    #[error("fetch error: {reason}")]
    FetchError { reason: String },
}

impl From<serde_json::Error> for TruthgateError {
    fn from(e: serde_json::Error) -> Self {
        TruthgateError::SerializationError {
            reason: e.to_string(),
        }
    }
}

/// Convenience alias used throughout the truthgate crates.
pub type TruthgateResult<T> = Result<T, TruthgateError>;
