//! Configuration management with environment variable support.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SERENITY_SCRIBE_OUTPUT_DIR` | Root directory reports are written under | `target/site/serenity` |
//! | `SERENITY_SCRIBE_STRICT` | Fail on malformed event sequences | `false` |
//! | `SERENITY_SCRIBE_PRETTY` | Pretty-print report files | `false` |
//!
//! Log verbosity is controlled separately through `RUST_LOG`. The binary
//! reads the same variables through clap's `env` arguments; library callers
//! use [`get`] with `SerenityReporter::from_config`.
//!
//! # Example
//!
//! ```bash
//! export SERENITY_SCRIBE_OUTPUT_DIR="build/serenity"
//! export SERENITY_SCRIBE_STRICT=true
//! ```

use std::env;
use std::sync::OnceLock;

// ============================================================================
// Default Values
// ============================================================================

/// Default report output directory
pub const DEFAULT_OUTPUT_DIR: &str = "target/site/serenity";

/// Default for strict well-formedness checking
pub const DEFAULT_STRICT: bool = false;

/// Default for pretty-printed report files
pub const DEFAULT_PRETTY: bool = false;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the output directory
pub const ENV_OUTPUT_DIR: &str = "SERENITY_SCRIBE_OUTPUT_DIR";

/// Environment variable for strict mode
pub const ENV_STRICT: &str = "SERENITY_SCRIBE_STRICT";

/// Environment variable for pretty output
pub const ENV_PRETTY: &str = "SERENITY_SCRIBE_PRETTY";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Event folding settings
    pub report: ReportSettings,
    /// Report writer settings
    pub output: OutputSettings,
}

/// Event folding settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    /// Reject malformed event sequences instead of skipping offending events
    pub strict: bool,
}

/// Report writer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    /// Root directory for report files
    pub dir: String,
    /// Pretty-print JSON
    pub pretty: bool,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            report: ReportSettings {
                strict: env_flag(ENV_STRICT).unwrap_or(DEFAULT_STRICT),
            },
            output: OutputSettings {
                dir: env::var(ENV_OUTPUT_DIR).unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string()),
                pretty: env_flag(ENV_PRETTY).unwrap_or(DEFAULT_PRETTY),
            },
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            report: ReportSettings {
                strict: DEFAULT_STRICT,
            },
            output: OutputSettings {
                dir: DEFAULT_OUTPUT_DIR.to_string(),
                pretty: DEFAULT_PRETTY,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|s| parse_flag(&s))
}

/// Parse a boolean flag: "1"/"true"/"yes"/"on" and their negatives
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag(" YES "), Some(true));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.output.dir, DEFAULT_OUTPUT_DIR);
        assert!(!config.report.strict);
        assert!(!config.output.pretty);
    }
}
