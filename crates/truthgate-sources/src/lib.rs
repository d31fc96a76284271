//! # truthgate-sources
//!
//! Where verified data comes from.
//!
//! - [`SourceCatalog`]: the declarative, TOML-defined list of external
//!   sources (see `catalog/sources.toml`)
//! - [`domain`]: ordered query-domain matchers
//! - [`SourceSelector`]: picks usable sources for a query
//! - [`ExtractorRegistry`]: named `(payload, query) -> text` extractors
//! - [`resolve_url`]: turns a source's URL rule into a request URL
//!
//! ```rust,ignore
//! let catalog = Arc::new(SourceCatalog::builtin()?);
//! let selector = SourceSelector::new(catalog, Arc::new(EnvCredentials));
//! let selection = selector.select_sources_for_query(query, TruthType::Volatile, &stakes);
//! ```

pub mod catalog;
pub mod domain;
pub mod extract;
pub mod extractors;
pub mod selector;
pub mod url;

pub use catalog::SourceCatalog;
pub use domain::{detect_domain, is_price_query, DomainMatch};
pub use extract::{ExtractContext, Extractor, ExtractorRegistry};
pub use selector::{SourceSelection, SourceSelector};
pub use url::{resolve_url, UrlContext};
