//! Typed errors and result aliases for the configuration registry.

use error_stack::Report;
use thiserror::Error;

/// Result type for registry operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error-stack–backed result alias for override-document loading.
///
/// Equivalent to `Result<T, error_stack::Report<ConfigError>>`.
pub type ConfigReport<T> = ::std::result::Result<T, Report<ConfigError>>;

/// Extension trait to convert `Result<T, ConfigError>` into [`ConfigReport<T>`].
pub trait IntoConfigReport<T> {
    /// Wrap the error in an `error_stack::Report`.
    fn into_report(self) -> ConfigReport<T>;
}

impl<T> IntoConfigReport<T> for ::std::result::Result<T, ConfigError> {
    #[inline]
    fn into_report(self) -> ConfigReport<T> {
        self.map_err(Report::new)
    }
}

/// Errors raised while reading, resolving or extracting registry entries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The key is not present in the registry.
    #[error("config key '{0}' is not defined")]
    MissingKey(String),

    /// A deferred entry was requested while its own resolution was running.
    #[error("cyclic resolution detected while resolving '{0}'")]
    CyclicResolution(String),

    /// A namespaced entry resolved to a value of the wrong kind.
    #[error("config key '{key}' must hold {expected}, found {found}")]
    UnexpectedKind {
        /// The offending key.
        key: String,
        /// The kind the namespace requires.
        expected: &'static str,
        /// The kind actually stored.
        found: &'static str,
    },

    /// A data value does not have the shape the reader asked for.
    #[error("config key '{key}' has an invalid value: {reason}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// Human-readable mismatch description.
        reason: String,
    },

    /// A deferred resolver failed for a reason of its own.
    #[error("failed to resolve '{key}': {reason}")]
    Resolution {
        /// The key being resolved.
        key: String,
        /// The resolver's failure message.
        reason: String,
    },

    /// Reading an override document failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An override document could not be parsed.
    #[error("Config parsing error: {0}")]
    Parse(String),

    /// The override document's extension is not a supported format.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl ConfigError {
    /// Build a [`ConfigError::Resolution`] from any displayable failure.
    pub fn resolution(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Resolution {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`ConfigError::InvalidValue`] from any displayable failure.
    pub fn invalid(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}
