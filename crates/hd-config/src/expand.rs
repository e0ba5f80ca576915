//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a config value.
///
/// # Errors
///
/// Returns `ConfigError::EnvVar` naming `field` when a referenced variable
/// without a default is not set.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_value_unchanged() {
        assert_eq!(expand_env("docs", "repository.path").unwrap(), "docs");
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("HD_EXPAND_TEST_UNSET");
        }

        let value = expand_env("${HD_EXPAND_TEST_UNSET:-fallback}", "server.host").unwrap();

        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_missing_variable_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("HD_EXPAND_TEST_MISSING");
        }

        let err = expand_env("${HD_EXPAND_TEST_MISSING}", "repository.origin").unwrap_err();

        assert!(err.to_string().contains("repository.origin"));
        assert!(err.to_string().contains("HD_EXPAND_TEST_MISSING"));
    }
}
