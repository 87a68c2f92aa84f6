use thiserror::Error;

use crate::sources::SourceError;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Source operation failed: {0}")]
    Source(#[from] SourceError),

    #[error("App configuration failed: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Io(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Missing configuration key: {0}")]
    MissingKey(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::InvalidValue(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::InvalidValue(err.to_string())
    }
}
