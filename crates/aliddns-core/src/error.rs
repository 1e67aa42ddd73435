//! Error types for the aliddns system
//!
//! Every fallible operation in the workspace returns [`Result`]. Callers
//! receive the first error encountered; nothing is aggregated.

use thiserror::Error;

/// Result type alias for aliddns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the aliddns system
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be read or is not valid INI
    #[error("Failed to read configuration: {0}")]
    ConfigRead(String),

    /// A required section is absent from the configuration file
    #[error("Configuration section [{section}] is missing")]
    ConfigSectionMissing {
        /// Section name
        section: String,
    },

    /// A required key is absent from a present section
    #[error("Configuration key '{key}' is missing from section [{section}]")]
    ConfigKeyMissing {
        /// Section name
        section: String,
        /// Key name
        key: String,
    },

    /// A configuration value failed type coercion
    #[error("Configuration value {section}.{key} = '{value}' is invalid: {reason}")]
    ConfigValueInvalid {
        /// Section name
        section: String,
        /// Key name
        key: String,
        /// The raw value found in the file
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// A list, create or update call to the DNS provider failed
    #[error("DNS provider request failed ({provider}): {message}")]
    ProviderRequestFailed {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// The current public IP could not be determined
    #[error("IP source error: {0}")]
    IpSource(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a "section missing" error
    pub fn section_missing(section: impl Into<String>) -> Self {
        Self::ConfigSectionMissing {
            section: section.into(),
        }
    }

    /// Create a "key missing" error
    pub fn key_missing(section: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ConfigKeyMissing {
            section: section.into(),
            key: key.into(),
        }
    }

    /// Create a "value invalid" error
    pub fn value_invalid(
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ConfigValueInvalid {
            section: section.into(),
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a provider request error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderRequestFailed {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error happened while loading configuration
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigRead(_)
                | Self::ConfigSectionMissing { .. }
                | Self::ConfigKeyMissing { .. }
                | Self::ConfigValueInvalid { .. }
        )
    }
}

impl From<ini::Error> for Error {
    fn from(err: ini::Error) -> Self {
        Self::ConfigRead(err.to_string())
    }
}

impl From<ini::ParseError> for Error {
    fn from(err: ini::ParseError) -> Self {
        Self::ConfigRead(err.to_string())
    }
}
