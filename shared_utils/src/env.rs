use std::str::FromStr;

use crate::config::ConfigError;

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

/// Reads an environment variable, treating unset and empty values alike.
pub fn get_env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Reads an environment variable, substituting `default` when it is unset or empty.
pub fn get_env_or(name: &str, default: &str) -> String {
    get_env_opt(name).unwrap_or_else(|| default.to_string())
}

/// Reads and parses an environment variable when it is set.
///
/// Returns `Ok(None)` when the variable is unset or empty, and
/// [`ConfigError::InvalidValue`] when it is set but fails to parse.
pub fn parse_env_opt<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_opt(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::invalid(name, format!("{raw:?}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn set(name: &str, value: &str) {
        // SAFETY: env-mutating tests are serialized.
        unsafe { std::env::set_var(name, value) };
    }

    fn unset(name: &str) {
        // SAFETY: env-mutating tests are serialized.
        unsafe { std::env::remove_var(name) };
    }

    #[test]
    #[serial]
    fn missing_var_is_reported_by_name() {
        unset("SHARED_UTILS_TEST_MISSING");
        let err = get_env_var("SHARED_UTILS_TEST_MISSING").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing environment variable: SHARED_UTILS_TEST_MISSING"
        );
    }

    #[test]
    #[serial]
    fn empty_value_falls_back_to_default() {
        set("SHARED_UTILS_TEST_SYMBOL", "");
        assert_eq!(get_env_or("SHARED_UTILS_TEST_SYMBOL", "MSFT"), "MSFT");

        set("SHARED_UTILS_TEST_SYMBOL", "IBM");
        assert_eq!(get_env_or("SHARED_UTILS_TEST_SYMBOL", "MSFT"), "IBM");
        unset("SHARED_UTILS_TEST_SYMBOL");
    }

    #[test]
    #[serial]
    fn parse_env_opt_distinguishes_unset_from_invalid() {
        unset("SHARED_UTILS_TEST_NDAYS");
        assert_eq!(parse_env_opt::<usize>("SHARED_UTILS_TEST_NDAYS").unwrap(), None);

        set("SHARED_UTILS_TEST_NDAYS", " 7 ");
        assert_eq!(
            parse_env_opt::<usize>("SHARED_UTILS_TEST_NDAYS").unwrap(),
            Some(7)
        );

        set("SHARED_UTILS_TEST_NDAYS", "seven");
        let err = parse_env_opt::<usize>("SHARED_UTILS_TEST_NDAYS").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "SHARED_UTILS_TEST_NDAYS"));
        unset("SHARED_UTILS_TEST_NDAYS");
    }
}
