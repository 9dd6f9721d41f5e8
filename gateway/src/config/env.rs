//! Environment variable access helpers

use std::env;
use std::str::FromStr;

pub(crate) const HOST: &str = "HOST";
pub(crate) const PORT: &str = "PORT";
pub(crate) const VAPI_PRIVATE_KEY: &str = "VAPI_PRIVATE_KEY";
pub(crate) const VAPI_API_URL: &str = "VAPI_API_URL";
pub(crate) const VAPI_REQUEST_TIMEOUT_SECONDS: &str = "VAPI_REQUEST_TIMEOUT_SECONDS";
pub(crate) const CALL_GRACE_SECONDS: &str = "CALL_GRACE_SECONDS";
pub(crate) const VAPI_WEBHOOK_SECRET: &str = "VAPI_WEBHOOK_SECRET";
pub(crate) const RATE_LIMIT_REQUESTS_PER_SECOND: &str = "RATE_LIMIT_REQUESTS_PER_SECOND";
pub(crate) const RATE_LIMIT_BURST_SIZE: &str = "RATE_LIMIT_BURST_SIZE";

/// Read an environment variable, treating blank values as unset
pub(crate) fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Read and parse an environment variable
///
/// Returns `Ok(None)` when the variable is unset and an error naming the
/// variable when it is set to something that does not parse.
pub(crate) fn parse<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {name} '{raw}': {e}")),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_var_blank_is_none() {
        unsafe {
            env::set_var("VAPI_GUARD_TEST_BLANK", "   ");
        }
        assert_eq!(var("VAPI_GUARD_TEST_BLANK"), None);
        unsafe {
            env::remove_var("VAPI_GUARD_TEST_BLANK");
        }
    }

    #[test]
    #[serial]
    fn test_parse_valid_and_invalid() {
        unsafe {
            env::set_var("VAPI_GUARD_TEST_NUM", "42");
        }
        assert_eq!(parse::<u64>("VAPI_GUARD_TEST_NUM").unwrap(), Some(42));

        unsafe {
            env::set_var("VAPI_GUARD_TEST_NUM", "forty-two");
        }
        let err = parse::<u64>("VAPI_GUARD_TEST_NUM").unwrap_err();
        assert!(err.contains("VAPI_GUARD_TEST_NUM"));

        unsafe {
            env::remove_var("VAPI_GUARD_TEST_NUM");
        }
        assert_eq!(parse::<u64>("VAPI_GUARD_TEST_NUM").unwrap(), None);
    }
}
