use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3000
///
/// vapi:
///   private_key: "your-vapi-private-key"
///   api_url: "https://api.vapi.ai"
///   request_timeout_seconds: 10
///
/// timers:
///   grace_seconds: 15
///
/// webhook:
///   secret: "shared-webhook-secret"
///
/// security:
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub vapi: Option<VapiYaml>,
    pub timers: Option<TimersYaml>,
    pub webhook: Option<WebhookYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Vapi API settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VapiYaml {
    pub private_key: Option<String>,
    pub api_url: Option<String>,
    pub request_timeout_seconds: Option<u64>,
}

/// Timer settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TimersYaml {
    pub grace_seconds: Option<u64>,
}

/// Inbound webhook settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WebhookYaml {
    pub secret: Option<String>,
}

/// Security settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
