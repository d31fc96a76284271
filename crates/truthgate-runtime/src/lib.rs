//! # truthgate-runtime
//!
//! The truth-classification → freshness-aware lookup → doctrine-enforcement
//! pipeline, assembled.
//!
//! ```rust,ignore
//! let pipeline = TruthPipeline::new(load_config_file(path)?)?;
//! let lookup = pipeline.lookup("What is the current price of Bitcoin?", &LookupOptions::default()).await;
//! let final_response = pipeline
//!     .respond(query, &LookupOptions::default(), &OperatingMode::standard(), &generator)
//!     .await;
//! ```

pub mod pipeline;
pub mod response;

pub use pipeline::{PipelineBuilder, TruthPipeline};
pub use response::{FinalResponse, LookupOptions, LookupOutcome, PipelineResponse};
