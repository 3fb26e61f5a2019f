//! Configuration management for voxcrm
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from the YAML config file, environment, and CLI overrides.

use crate::cli::Cli;
use crate::error::{Result, VoxcrmError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for voxcrm
///
/// This structure holds all configuration needed by the service: the HTTP
/// listener, the model provider, the CRM data API, agent loop behavior,
/// the response cache, rate limits, and session storage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Model provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// CRM data-API configuration
    #[serde(default)]
    pub crm: CrmConfig,

    /// Agent loop behavior configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Response cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Rate limit configuration
    #[serde(default)]
    pub limits: RateLimitConfig,

    /// Session storage configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the server binds to
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Trust the X-Forwarded-For header for client IPs
    ///
    /// Only enable when the service sits behind a proxy that strips the
    /// header from inbound traffic; otherwise clients can spoof their IP
    /// and dodge the per-IP limiter.
    #[serde(default)]
    pub behind_proxy: bool,
}

fn default_listen() -> String {
    "127.0.0.1:8087".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            behind_proxy: false,
        }
    }
}

/// Model provider configuration
///
/// The provider speaks the chat-completions wire format. `api_base` can be
/// pointed at a mock server in tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL for the chat-completions API
    #[serde(default = "default_provider_base")]
    pub api_base: String,

    /// API key sent as a bearer token (optional for local servers)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model to request completions from
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-call HTTP timeout (seconds)
    #[serde(default = "default_provider_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_provider_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_provider_timeout() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_provider_base(),
            api_key: None,
            model: default_model(),
            request_timeout_seconds: default_provider_timeout(),
        }
    }
}

/// CRM data-API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    /// Base URL of the hosted CRM data API
    #[serde(default = "default_crm_base")]
    pub api_base: String,

    /// Service credential for tables without per-user ownership columns
    #[serde(default)]
    pub service_token: Option<String>,

    /// Per-call HTTP timeout (seconds)
    #[serde(default = "default_crm_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_crm_base() -> String {
    "http://localhost:3000".to_string()
}

fn default_crm_timeout() -> u64 {
    10
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            api_base: default_crm_base(),
            service_token: None,
            request_timeout_seconds: default_crm_timeout(),
        }
    }
}

/// Agent loop behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model-call rounds per turn before the forced final answer
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,

    /// Wall-clock ceiling for one whole turn, covering all rounds (seconds)
    #[serde(default = "default_deadline")]
    pub deadline_seconds: u64,

    /// Maximum accepted question length (characters)
    #[serde(default = "default_max_question")]
    pub max_question_chars: usize,
}

fn default_max_rounds() -> usize {
    5
}

fn default_deadline() -> u64 {
    60
}

fn default_max_question() -> usize {
    2000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            deadline_seconds: default_deadline(),
            max_question_chars: default_max_question(),
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for cached tool-free responses (seconds)
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

fn default_cache_ttl() -> u64 {
    600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
        }
    }
}

/// Rate limit configuration
///
/// Two fixed windows: one keyed by client IP (checked before auth), one
/// keyed by user id (checked after auth).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per IP window
    #[serde(default = "default_ip_max")]
    pub ip_max: u32,

    /// IP window length (seconds)
    #[serde(default = "default_window")]
    pub ip_window_seconds: u64,

    /// Maximum requests per user window
    #[serde(default = "default_user_max")]
    pub user_max: u32,

    /// User window length (seconds)
    #[serde(default = "default_window")]
    pub user_window_seconds: u64,
}

fn default_ip_max() -> u32 {
    60
}

fn default_user_max() -> u32 {
    30
}

fn default_window() -> u64 {
    60
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            ip_max: default_ip_max(),
            ip_window_seconds: default_window(),
            user_max: default_user_max(),
            user_window_seconds: default_window(),
        }
    }
}

/// Session storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    /// Path to the session database file
    ///
    /// Defaults to `sessions.db` under the platform data directory when
    /// unset. An unusable path drops the store into its in-memory tier.
    #[serde(default)]
    pub db_path: Option<String>,
}

impl Config {
    /// Loads configuration from a YAML file with CLI overrides applied
    ///
    /// A missing config file is not an error; defaults are used so the
    /// service can start from CLI flags alone.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed CLI arguments whose flags override file values
    ///
    /// # Errors
    ///
    /// Returns `VoxcrmError::Yaml` if the file exists but cannot be parsed.
    pub fn load(path: impl AsRef<Path>, cli: &Cli) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(VoxcrmError::Io)?;
            serde_yaml::from_str(&raw).map_err(VoxcrmError::Yaml)?
        } else {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            Self::default()
        };

        if let Some(listen) = &cli.listen {
            config.server.listen = listen.clone();
        }
        if let Some(db_path) = &cli.session_db {
            config.session.db_path = Some(db_path.clone());
        }

        Ok(config)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `VoxcrmError::Config` if any invariant is violated:
    /// - `max_rounds` must be greater than 0
    /// - rate-limit windows must be greater than 0
    /// - the provider model name must not be empty
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_rounds == 0 {
            return Err(VoxcrmError::Config("max_rounds must be greater than 0".to_string()).into());
        }
        if self.limits.ip_window_seconds == 0 || self.limits.user_window_seconds == 0 {
            return Err(
                VoxcrmError::Config("rate-limit windows must be greater than 0".to_string()).into(),
            );
        }
        if self.provider.model.trim().is_empty() {
            return Err(VoxcrmError::Config("provider model must not be empty".to_string()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn cli_defaults() -> Cli {
        Cli {
            config: None,
            listen: None,
            session_db: None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.agent.max_rounds, 5);
        assert_eq!(config.agent.deadline_seconds, 60);
        assert_eq!(config.limits.user_max, 30);
        assert_eq!(config.limits.ip_max, 60);
        assert_eq!(config.cache.ttl_seconds, 600);
        assert!(!config.server.behind_proxy);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let cli = cli_defaults();
        let config = Config::load("/nonexistent/voxcrm.yaml", &cli).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:8087");
    }

    #[test]
    fn test_load_parses_yaml_sections() {
        let yaml = r#"
server:
  listen: "0.0.0.0:9000"
provider:
  model: "gpt-4o"
limits:
  user_max: 10
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, yaml).unwrap();

        let config = Config::load(&path, &cli_defaults()).unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:9000");
        assert_eq!(config.provider.model, "gpt-4o");
        assert_eq!(config.limits.user_max, 10);
        // Untouched sections keep defaults
        assert_eq!(config.agent.max_rounds, 5);
    }

    #[test]
    fn test_cli_listen_override_wins() {
        let yaml = "server:\n  listen: \"0.0.0.0:9000\"\n";
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, yaml).unwrap();

        let cli = Cli {
            config: None,
            listen: Some("127.0.0.1:4444".to_string()),
            session_db: None,
        };
        let config = Config::load(&path, &cli).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:4444");
    }

    #[test]
    fn test_validate_rejects_zero_rounds() {
        let mut config = Config::default();
        config.agent.max_rounds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = Config::default();
        config.limits.user_window_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let mut config = Config::default();
        config.provider.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "server: [not a map").unwrap();
        assert!(Config::load(&path, &cli_defaults()).is_err());
    }
}
