//! Error types for the voxcrm agent service
//!
//! This module defines all error types used throughout the service,
//! using `thiserror` for ergonomic error handling. The server layer maps
//! these variants onto HTTP status codes; tool-level failures never reach
//! this taxonomy because they are folded back into the transcript as
//! in-band results.

use thiserror::Error;

/// Main error type for voxcrm operations
///
/// This enum encompasses all possible errors that can occur while serving
/// a chat turn: request validation, authentication, rate limiting, model
/// provider calls, CRM data-API calls, and session storage.
#[derive(Error, Debug)]
pub enum VoxcrmError {
    /// Malformed or missing request fields (HTTP 400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid session cookie (HTTP 401)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Rate-limit window exceeded (HTTP 429 with Retry-After)
    #[error("Rate limit exceeded: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until the current window resets
        retry_after_secs: u64,
    },

    /// Model provider errors (API calls, timeouts, malformed replies)
    #[error("Provider error: {0}")]
    Provider(String),

    /// CRM data-API errors
    #[error("CRM API error: {0}")]
    Crm(String),

    /// Session storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for voxcrm operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let error = VoxcrmError::Validation("question is empty".to_string());
        assert_eq!(error.to_string(), "Validation error: question is empty");
    }

    #[test]
    fn test_auth_error_display() {
        let error = VoxcrmError::Auth("missing session cookie".to_string());
        assert_eq!(
            error.to_string(),
            "Authentication error: missing session cookie"
        );
    }

    #[test]
    fn test_rate_limited_display() {
        let error = VoxcrmError::RateLimited {
            retry_after_secs: 42,
        };
        assert!(error.to_string().contains("42s"));
    }

    #[test]
    fn test_provider_error_display() {
        let error = VoxcrmError::Provider("model call timed out".to_string());
        assert_eq!(error.to_string(), "Provider error: model call timed out");
    }

    #[test]
    fn test_crm_error_display() {
        let error = VoxcrmError::Crm("contacts table returned 503".to_string());
        assert_eq!(
            error.to_string(),
            "CRM API error: contacts table returned 503"
        );
    }

    #[test]
    fn test_storage_error_display() {
        let error = VoxcrmError::Storage("session database unavailable".to_string());
        assert_eq!(
            error.to_string(),
            "Storage error: session database unavailable"
        );
    }

    #[test]
    fn test_config_error_display() {
        let error = VoxcrmError::Config("max_rounds must be greater than 0".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: max_rounds must be greater than 0"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: VoxcrmError = io_error.into();
        assert!(matches!(error, VoxcrmError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_str = "{invalid json}";
        let json_error = serde_json::from_str::<serde_json::Value>(json_str).unwrap_err();
        let error: VoxcrmError = json_error.into();
        assert!(matches!(error, VoxcrmError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_str = "invalid: : yaml";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: VoxcrmError = yaml_error.into();
        assert!(matches!(error, VoxcrmError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VoxcrmError>();
    }
}
