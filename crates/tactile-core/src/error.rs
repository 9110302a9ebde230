#![forbid(unsafe_code)]

//! Error types shared by the core and the web shell.

use thiserror::Error;

/// Failure loading or validating a [`crate::TactileConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "config-toml")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {}", .problems.join("; "))]
    Invalid { problems: Vec<String> },
}

/// Failure reported by a platform capability (haptics, fullscreen, worker).
///
/// These never reach the user. Callers log them at debug level and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("capability unavailable: {0}")]
    Unavailable(&'static str),

    #[error("platform rejected {0}")]
    Rejected(&'static str),

    #[error("platform exception: {0}")]
    Exception(String),
}

impl PlatformError {
    #[must_use]
    pub fn exception(message: impl Into<String>) -> Self {
        Self::Exception(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, PlatformError};

    #[test]
    fn invalid_config_lists_every_problem() {
        let error = ConfigError::Invalid {
            problems: vec!["a must be > 0".into(), "b must be < 1".into()],
        };
        assert_eq!(
            error.to_string(),
            "invalid config: a must be > 0; b must be < 1"
        );
    }

    #[test]
    fn platform_exception_keeps_message() {
        let error = PlatformError::exception("NotAllowedError");
        assert_eq!(error.to_string(), "platform exception: NotAllowedError");
    }
}
