//! Tunables for the coordination layer.
//!
//! Everything deadline-driven (debounce, optimistic expiry, cache TTL) and
//! every cap lives here so the embedding application can override them from
//! its own configuration file. All fields have serde defaults; a partial
//! config deserializes cleanly.

use serde::{Deserialize, Serialize};

use crate::controller::DEFAULT_CACHE_TTL_MS;
use crate::history::DEFAULT_MAX_HISTORY;
use crate::optimistic::{DEFAULT_FAILURE_LINGER_MS, DEFAULT_TIMEOUT_MS};

/// Default quiet period before a search keystroke becomes a query.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default page size for list fetches.
pub const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub debounce_ms: u64,
    pub optimistic_timeout_ms: u64,
    pub failure_linger_ms: u64,
    pub cache_ttl_ms: u64,
    pub max_history: usize,
    pub page_size: usize,
    pub logging: LoggingConfig,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            optimistic_timeout_ms: DEFAULT_TIMEOUT_MS,
            failure_linger_ms: DEFAULT_FAILURE_LINGER_MS,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            max_history: DEFAULT_MAX_HISTORY,
            page_size: DEFAULT_PAGE_SIZE,
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 0 = errors only, 1 = info, 2+ = debug. The `OPSDECK_LOG` env var
    /// overrides this wholesale.
    pub verbosity: u8,
    pub stderr: bool,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbosity: 1,
            stderr: true,
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: StateConfig = serde_json::from_str(r#"{"debounce_ms": 150}"#).unwrap();
        assert_eq!(cfg.debounce_ms, 150);
        assert_eq!(cfg.optimistic_timeout_ms, 30_000);
        assert_eq!(cfg.cache_ttl_ms, 300_000);
        assert_eq!(cfg.max_history, 50);
        assert_eq!(cfg.page_size, 25);
        assert!(cfg.logging.stderr);
    }

    #[test]
    fn logging_format_uses_snake_case() {
        let cfg: LoggingConfig = serde_json::from_str(r#"{"format": "pretty"}"#).unwrap();
        assert_eq!(cfg.format, LogFormat::Pretty);
    }
}
