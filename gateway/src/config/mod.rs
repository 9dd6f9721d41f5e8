//! Configuration module for the vapi-guard server
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use vapi_guard::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use zeroize::Zeroizing;

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// Base URL of the Vapi REST API
pub const DEFAULT_VAPI_API_URL: &str = "https://api.vapi.ai";

/// Seconds a call may run before it is ended
pub const DEFAULT_GRACE_SECONDS: u64 = 15;

pub const DEFAULT_PORT: u16 = 3000;

/// Secret string that is wiped from memory when dropped
pub type Secret = Zeroizing<String>;

/// Server configuration
///
/// Contains everything needed to run the webhook receiver:
/// - Server settings (host, port)
/// - Vapi credential and API location
/// - Grace period before a started call is ended
/// - Optional shared secret expected on inbound webhooks
/// - Rate limiting
#[derive(Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Vapi settings
    /// Private API key used as the bearer credential for outbound calls.
    /// When absent the server still starts but rejects webhooks with 500.
    pub vapi_private_key: Option<Secret>,
    pub vapi_api_url: String,
    pub vapi_request_timeout_seconds: u64,

    // Timer settings
    /// Delay between `call-started` and the automatic end-of-call request
    pub grace_seconds: u64,

    // Webhook authentication
    /// Shared secret compared against the `X-Vapi-Secret` header.
    /// Default: None (webhooks accepted without a secret)
    pub webhook_secret: Option<Secret>,

    // Rate limiting configuration
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            vapi_private_key: None,
            vapi_api_url: DEFAULT_VAPI_API_URL.to_string(),
            vapi_request_timeout_seconds: 10,
            grace_seconds: DEFAULT_GRACE_SECONDS,
            webhook_secret: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
        }
    }
}

/// Secrets are redacted so the config can be logged safely.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "vapi_private_key",
                &self.vapi_private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("vapi_api_url", &self.vapi_api_url)
            .field(
                "vapi_request_timeout_seconds",
                &self.vapi_request_timeout_seconds,
            )
            .field("grace_seconds", &self.grace_seconds)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "rate_limit_requests_per_second",
                &self.rate_limit_requests_per_second,
            )
            .field("rate_limit_burst_size", &self.rate_limit_burst_size)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables only
    ///
    /// The `.env` file is loaded by `main` before this is called, so its values
    /// are visible here as ordinary environment variables.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_seconds)
    }

    pub fn vapi_request_timeout(&self) -> Duration {
        Duration::from_secs(self.vapi_request_timeout_seconds)
    }

    /// Check if a Vapi credential is configured
    pub fn has_vapi_credentials(&self) -> bool {
        self.vapi_private_key
            .as_deref()
            .is_some_and(|key| !key.is_empty())
    }

    /// Check if inbound webhooks must carry a shared secret
    pub fn has_webhook_secret(&self) -> bool {
        self.webhook_secret
            .as_deref()
            .is_some_and(|secret| !secret.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.grace_seconds, 15);
        assert_eq!(config.vapi_api_url, "https://api.vapi.ai");
        assert_eq!(config.grace_period(), Duration::from_secs(15));
        assert!(!config.has_vapi_credentials());
        assert!(!config.has_webhook_secret());
    }

    #[test]
    fn test_address() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(config.address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_empty_credential_is_not_configured() {
        let config = ServerConfig {
            vapi_private_key: Some(Secret::new(String::new())),
            ..Default::default()
        };
        assert!(!config.has_vapi_credentials());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ServerConfig {
            vapi_private_key: Some(Secret::new("sk-very-secret".to_string())),
            webhook_secret: Some(Secret::new("hook-secret".to_string())),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(!debug.contains("hook-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
