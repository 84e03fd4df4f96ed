use thiserror::Error;

/// Errors from repository operations (used by trait definitions in chatrelay-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),
}

/// Errors raised by the chat service before any side effect happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("user_input must not be empty")]
    EmptyInput,
}

/// Startup configuration problems. These are fatal: the process exits.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(String),

    #[error("invalid setting {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("cannot read instruction file {path}: {message}")]
    InstructionFile { path: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyInput.to_string(), "user_input must not be empty");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            key: "temperature".to_string(),
            message: "must be between 0 and 2".to_string(),
        };
        assert!(err.to_string().contains("temperature"));
        assert!(err.to_string().contains("between 0 and 2"));
    }
}
