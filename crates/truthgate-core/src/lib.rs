//! # truthgate-core
//!
//! The seams of the truthgate pipeline.
//!
//! This crate provides:
//! - The six core traits (`Clock`, `Credentials`, `Fetcher`, `CacheStore`,
//!   `FallbackClassifier`, `ResponseGenerator`)
//! - Standard clocks (`SystemClock`, `ManualClock`) and credential providers
//!   (`EnvCredentials`, `StaticCredentials`)
//! - TOML configuration loading
//!
//! ## Usage
//!
//! ```rust,ignore
//! use truthgate_core::{config::load_config_file, clock::SystemClock};
//! ```

pub mod clock;
pub mod config;
pub mod credentials;
pub mod traits;

pub use clock::{ManualClock, SystemClock};
pub use credentials::{EnvCredentials, StaticCredentials};
