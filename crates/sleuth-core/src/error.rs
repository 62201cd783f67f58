use thiserror::Error;

/// Top-level error type for Sleuth.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for SleuthError` where they need `?` to cross
/// crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SleuthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for SleuthError {
    fn from(err: toml::de::Error) -> Self {
        SleuthError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SleuthError {
    fn from(err: toml::ser::Error) -> Self {
        SleuthError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SleuthError {
    fn from(err: serde_json::Error) -> Self {
        SleuthError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Sleuth operations.
pub type Result<T> = std::result::Result<T, SleuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SleuthError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(SleuthError, &str)> = vec![
            (
                SleuthError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                SleuthError::Discovery("connection refused".to_string()),
                "Discovery error: connection refused",
            ),
            (
                SleuthError::Analysis("no api key".to_string()),
                "Analysis error: no api key",
            ),
            (
                SleuthError::Chat("disabled".to_string()),
                "Chat error: disabled",
            ),
            (
                SleuthError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                SleuthError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SleuthError = io_err.into();
        assert!(matches!(err, SleuthError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let err: SleuthError = toml_err.into();
        assert!(matches!(err, SleuthError::Config(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let err: SleuthError = json_err.into();
        assert!(matches!(err, SleuthError::Serialization(_)));
    }

    #[test]
    fn test_result_alias_propagates() {
        fn inner() -> Result<()> {
            Err(SleuthError::Api("nope".into()))
        }
        fn outer() -> Result<u32> {
            inner()?;
            Ok(1)
        }
        assert!(outer().is_err());
    }
}
