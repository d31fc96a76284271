//! # truthgate-lookup
//!
//! Bounded external verification.
//!
//! - [`LookupExecutor`]: sequential, budgeted fetch → parse → extract over
//!   the selected sources, with the cache consulted first
//! - [`ReqwestFetcher`]: the production [`Fetcher`](truthgate_core::traits::Fetcher)
//! - [`DegradationHandler`]: the designed response when nothing usable came back
//! - [`clean_search_query`]: conversational query → search string

pub mod degrade;
pub mod executor;
pub mod fetch;
pub mod query;

pub use degrade::{verification_path_for, DegradationHandler};
pub use executor::{LookupExecutor, LookupRequest};
pub use fetch::ReqwestFetcher;
pub use query::clean_search_query;
