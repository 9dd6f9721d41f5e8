//! Configuration validation

use super::ServerConfig;

/// Upper bound for `CALL_GRACE_SECONDS` and `VAPI_REQUEST_TIMEOUT_SECONDS` (one day)
pub(crate) const MAX_DURATION_SECONDS: u64 = 24 * 60 * 60;

/// Validate a fully merged configuration
///
/// A missing Vapi credential is not an error here: the server starts and
/// reports the problem per request instead.
pub(crate) fn validate(config: &ServerConfig) -> Result<(), String> {
    if config.port == 0 {
        return Err("PORT must be greater than zero".to_string());
    }

    validate_api_url(&config.vapi_api_url)?;

    if config.vapi_request_timeout_seconds == 0 {
        return Err("VAPI_REQUEST_TIMEOUT_SECONDS must be greater than zero".to_string());
    }
    if config.vapi_request_timeout_seconds > MAX_DURATION_SECONDS {
        return Err(format!(
            "VAPI_REQUEST_TIMEOUT_SECONDS must be at most {MAX_DURATION_SECONDS}"
        ));
    }
    if config.grace_seconds > MAX_DURATION_SECONDS {
        return Err(format!(
            "CALL_GRACE_SECONDS must be at most {MAX_DURATION_SECONDS}"
        ));
    }
    if config.rate_limit_requests_per_second == 0 {
        return Err("RATE_LIMIT_REQUESTS_PER_SECOND must be greater than zero".to_string());
    }
    if config.rate_limit_burst_size == 0 {
        return Err("RATE_LIMIT_BURST_SIZE must be greater than zero".to_string());
    }

    Ok(())
}

fn validate_api_url(raw: &str) -> Result<(), String> {
    let parsed =
        url::Url::parse(raw).map_err(|e| format!("Invalid VAPI_API_URL '{raw}': {e}"))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!(
            "Invalid VAPI_API_URL '{raw}': unsupported scheme '{other}'"
        )),
    }
}
