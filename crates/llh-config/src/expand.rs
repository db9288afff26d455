//! Environment variable expansion for configuration strings.

use std::borrow::Cow;

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the configuration key and is only used for error reporting.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(Cow::into_owned)
        .map_err(|e| env_var_error(field, &e))
}

/// Expand environment variables and a leading `~` in a path value.
pub(crate) fn expand_path(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::full(value)
        .map(Cow::into_owned)
        .map_err(|e| env_var_error(field, &e))
}

fn env_var_error(field: &str, err: &shellexpand::LookupError<std::env::VarError>) -> ConfigError {
    ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} {}", err.var_name, err.cause),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_literal_unchanged() {
        assert_eq!(expand_env("127.0.0.1", "server.host").unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_expand_default_value() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("LLH_EXPAND_UNSET_TEST");
        }

        let value = expand_env("${LLH_EXPAND_UNSET_TEST:-/reload}", "live_reload.service").unwrap();
        assert_eq!(value, "/reload");
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("LLH_EXPAND_MISSING_TEST");
        }

        let err = expand_env("${LLH_EXPAND_MISSING_TEST}", "server.host").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("server.host"), "got: {msg}");
        assert!(msg.contains("LLH_EXPAND_MISSING_TEST"), "got: {msg}");
    }
}
