//! TOML configuration loading.
//!
//! `load_config_str` and `load_config_file` map every parse or I/O failure to
//! `TruthgateError::ConfigError`. Missing sections and fields fall back to
//! their defaults. `validate_config` runs on every loaded document and again
//! when a pipeline is built from a config assembled in code.

use std::path::Path;

use tracing::debug;

use truthgate_contracts::{
    config::{DegradationConfig, TruthgateConfig},
    error::{TruthgateError, TruthgateResult},
};

/// Parse `s` as a TOML configuration document.
pub fn load_config_str(s: &str) -> TruthgateResult<TruthgateConfig> {
    let config: TruthgateConfig = toml::from_str(s).map_err(|e| TruthgateError::ConfigError {
        reason: format!("failed to parse config TOML: {}", e),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Read the file at `path` and parse it as a TOML configuration document.
pub fn load_config_file(path: &Path) -> TruthgateResult<TruthgateConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| TruthgateError::ConfigError {
        reason: format!("failed to read config file '{}': {}", path.display(), e),
    })?;
    debug!(path = %path.display(), "loaded truthgate config");
    load_config_str(&contents)
}

/// Reject settings the pipeline cannot honour.
pub fn validate_config(config: &TruthgateConfig) -> TruthgateResult<()> {
    if config.lookup.max_sources == 0 {
        return Err(TruthgateError::ConfigError {
            reason: "lookup.max_sources must be at least 1".to_string(),
        });
    }
    if config.lookup.per_source_timeout_ms == 0 {
        return Err(TruthgateError::ConfigError {
            reason: "lookup.per_source_timeout_ms must be positive".to_string(),
        });
    }
    if config.lookup.max_body_bytes == 0 {
        return Err(TruthgateError::ConfigError {
            reason: "lookup.max_body_bytes must be positive".to_string(),
        });
    }
    let threshold = config.doctrine.low_confidence_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(TruthgateError::ConfigError {
            reason: format!("doctrine.low_confidence_threshold {threshold} is outside [0, 1]"),
        });
    }
    let volatile_ttl = config.cache.volatile_ttl_secs;
    let ceiling = config.doctrine.volatile_max_ttl_secs;
    if volatile_ttl > ceiling {
        return Err(TruthgateError::ConfigError {
            reason: format!(
                "cache.volatile_ttl_secs {volatile_ttl} exceeds doctrine.volatile_max_ttl_secs {ceiling}"
            ),
        });
    }
    let words = config.degradation.max_response_words;
    if words < DegradationConfig::MIN_RESPONSE_WORDS {
        return Err(TruthgateError::ConfigError {
            reason: format!(
                "degradation.max_response_words {words} is below the minimum of {}",
                DegradationConfig::MIN_RESPONSE_WORDS
            ),
        });
    }
    Ok(())
}
