use thiserror::Error;

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// A setting was present but could not be interpreted.
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue {
        /// Name of the setting (environment variable, flag or file key).
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidValue {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}
