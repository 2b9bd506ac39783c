//! Shared error type for configuration and reference data handling

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures while reading config files, reference data or user parameters
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reference data or record file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config file exists but could not be used
    #[error("Configuration error: {0}")]
    Config(String),

    /// A parameter value outside its accepted set (e.g. `dataSource`)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_converts() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.to_string().starts_with("JSON error"));
    }
}
