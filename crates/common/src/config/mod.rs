//! Configuration management for Citree
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use crate::errors::{AppError, Result};
use config::{Config, ConfigError, Environment, File};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Tree build configuration
    #[serde(default)]
    pub tree: TreeConfig,

    /// Remote record source configuration
    #[serde(default)]
    pub source: SourceConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Snapshot configuration
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Export configuration
    #[serde(default)]
    pub export: ExportConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TreeConfig {
    /// DOI of the paper to start from
    pub seed: Option<String>,

    /// Number of citation generations to expand
    #[serde(default = "default_generations")]
    pub generations: u32,

    /// Name stem for snapshot, CSV and HTML files
    #[serde(default = "default_output_stem")]
    pub output_stem: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Semantic Scholar Graph API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key sent as `x-api-key`
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,

    /// Maximum attempts for transient failures
    #[serde(default = "default_source_retries")]
    pub max_retries: u32,
}

/// How the external call budget is enforced
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitStrategy {
    /// Spend `max_calls`, then sleep a whole window and reset
    Window,
    /// Spread `max_calls` evenly over the window (GCRA)
    Smooth,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_strategy")]
    pub strategy: RateLimitStrategy,

    /// Calls allowed per window
    #[serde(default = "default_max_calls")]
    pub max_calls: u32,

    /// Window (cooldown) length in seconds
    #[serde(default = "default_window")]
    pub window_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Directory receiving `{stem}_generation_{g}.json`
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_enabled")]
    pub csv: bool,

    #[serde(default = "default_enabled")]
    pub html: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logging: bool,

    /// Prometheus listener port (0 to disable)
    #[serde(default)]
    pub metrics_port: u16,
}

/// Upper bound on lookup attempts per paper
pub const MAX_SOURCE_ATTEMPTS: u32 = 10;

// Default value functions
fn default_generations() -> u32 { crate::DEFAULT_GENERATIONS }
fn default_output_stem() -> String { "filename".to_string() }
fn default_base_url() -> String { "https://api.semanticscholar.org/graph/v1".to_string() }
fn default_source_timeout() -> u64 { 350 }
fn default_source_retries() -> u32 { 3 }
fn default_strategy() -> RateLimitStrategy { RateLimitStrategy::Window }
fn default_max_calls() -> u32 { crate::DEFAULT_MAX_CALLS }
fn default_window() -> u64 { 300 }
fn default_enabled() -> bool { true }
fn default_dir() -> PathBuf { PathBuf::from(".") }
fn default_log_level() -> String { "info".to_string() }

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            seed: None,
            generations: default_generations(),
            output_stem: default_output_stem(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_source_timeout(),
            max_retries: default_source_retries(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            max_calls: default_max_calls(),
            window_secs: default_window(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            dir: default_dir(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            csv: default_enabled(),
            html: default_enabled(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
            metrics_port: 0,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., APP__TREE__GENERATIONS=3
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> std::result::Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Check the values a build depends on
    pub fn validate(&self) -> Result<()> {
        if let Some(seed) = &self.tree.seed {
            validate_identifier(seed)?;
        }
        if self.source.max_retries > MAX_SOURCE_ATTEMPTS {
            return Err(AppError::Validation {
                message: format!("source.max_retries must be at most {}", MAX_SOURCE_ATTEMPTS),
                field: Some("source.max_retries".to_string()),
            });
        }
        if self.rate_limit.max_calls == 0 {
            return Err(AppError::Validation {
                message: "rate_limit.max_calls must be at least 1".to_string(),
                field: Some("rate_limit.max_calls".to_string()),
            });
        }
        if self.rate_limit.window_secs == 0 {
            return Err(AppError::Validation {
                message: "rate_limit.window_secs must be at least 1".to_string(),
                field: Some("rate_limit.window_secs".to_string()),
            });
        }
        if self.tree.output_stem.trim().is_empty() {
            return Err(AppError::Validation {
                message: "tree.output_stem must not be empty".to_string(),
                field: Some("tree.output_stem".to_string()),
            });
        }
        Ok(())
    }

    /// Seed identifier, required to start a fresh build
    pub fn seed(&self) -> Result<&str> {
        self.tree.seed.as_deref().ok_or_else(|| AppError::Configuration {
            message: "tree.seed is not set".to_string(),
        })
    }
}

impl SourceConfig {
    /// Per-request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RateLimitConfig {
    /// Cooldown window as Duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tree: TreeConfig::default(),
            source: SourceConfig::default(),
            rate_limit: RateLimitConfig::default(),
            snapshot: SnapshotConfig::default(),
            export: ExportConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Accept DOI-style identifiers (`10.<registrant>/<suffix>`)
pub fn validate_identifier(id: &str) -> Result<()> {
    let doi = Regex::new(r"^10\.\d+/\S+$").map_err(|e| AppError::Internal {
        message: e.to_string(),
    })?;
    if doi.is_match(id.trim()) {
        Ok(())
    } else {
        Err(AppError::InvalidIdentifier { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tree.generations, 2);
        assert_eq!(config.tree.output_stem, "filename");
        assert_eq!(config.rate_limit.max_calls, 99);
        assert_eq!(config.rate_limit.window(), Duration::from_secs(300));
        assert_eq!(config.source.timeout(), Duration::from_secs(350));
        assert_eq!(config.rate_limit.strategy, RateLimitStrategy::Window);
    }

    #[test]
    fn test_seed_required() {
        let config = AppConfig::default();
        assert!(config.seed().is_err());
    }

    #[test]
    fn test_identifier_validation() {
        assert!(validate_identifier("10.1002/ejp.1639").is_ok());
        assert!(validate_identifier("10.1/x").is_ok());
        assert!(validate_identifier("ejp.1639").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn test_excessive_retries_rejected() {
        let mut config = AppConfig::default();
        config.source.max_retries = MAX_SOURCE_ATTEMPTS;
        assert!(config.validate().is_ok());

        config.source.max_retries = 60;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "source.max_retries"));
    }

    #[test]
    fn test_zero_budget_rejected() {
        let mut config = AppConfig::default();
        config.rate_limit.max_calls = 0;
        assert!(config.validate().is_err());
    }
}
