//! Configuration errors
//!
//! All configuration errors are fatal at startup.

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "CREDQ_CONFIG_IO",
            Self::Parse(_) => "CREDQ_CONFIG_PARSE",
            Self::Invalid(_) => "CREDQ_CONFIG_INVALID",
        }
    }
}
