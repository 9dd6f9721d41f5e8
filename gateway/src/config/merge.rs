//! Merging of environment and YAML configuration

use super::yaml::YamlConfig;
use super::{Secret, ServerConfig, env};

/// Build a [`ServerConfig`] from defaults, environment variables and an optional YAML file
///
/// Environment values replace defaults; YAML values replace both.
pub(crate) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = ServerConfig::default();

    if let Some(host) = env::var(env::HOST) {
        config.host = host;
    }
    if let Some(port) = env::parse::<u16>(env::PORT)? {
        config.port = port;
    }
    if let Some(key) = env::var(env::VAPI_PRIVATE_KEY) {
        config.vapi_private_key = Some(Secret::new(key));
    }
    if let Some(url) = env::var(env::VAPI_API_URL) {
        config.vapi_api_url = url;
    }
    if let Some(timeout) = env::parse::<u64>(env::VAPI_REQUEST_TIMEOUT_SECONDS)? {
        config.vapi_request_timeout_seconds = timeout;
    }
    if let Some(grace) = env::parse::<u64>(env::CALL_GRACE_SECONDS)? {
        config.grace_seconds = grace;
    }
    if let Some(secret) = env::var(env::VAPI_WEBHOOK_SECRET) {
        config.webhook_secret = Some(Secret::new(secret));
    }
    if let Some(rps) = env::parse::<u32>(env::RATE_LIMIT_REQUESTS_PER_SECOND)? {
        config.rate_limit_requests_per_second = rps;
    }
    if let Some(burst) = env::parse::<u32>(env::RATE_LIMIT_BURST_SIZE)? {
        config.rate_limit_burst_size = burst;
    }

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
    }

    if let Some(vapi) = yaml.vapi {
        if let Some(key) = vapi.private_key.filter(|key| !key.is_empty()) {
            config.vapi_private_key = Some(Secret::new(key));
        }
        if let Some(url) = vapi.api_url {
            config.vapi_api_url = url;
        }
        if let Some(timeout) = vapi.request_timeout_seconds {
            config.vapi_request_timeout_seconds = timeout;
        }
    }

    if let Some(grace) = yaml.timers.and_then(|timers| timers.grace_seconds) {
        config.grace_seconds = grace;
    }

    if let Some(secret) = yaml
        .webhook
        .and_then(|webhook| webhook.secret)
        .filter(|secret| !secret.is_empty())
    {
        config.webhook_secret = Some(Secret::new(secret));
    }

    if let Some(security) = yaml.security {
        if let Some(rps) = security.rate_limit_requests_per_second {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = security.rate_limit_burst_size {
            config.rate_limit_burst_size = burst;
        }
    }

    Ok(config)
}
