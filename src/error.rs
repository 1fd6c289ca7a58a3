use thiserror::Error;

/// Main error type for the overseer supervisor
#[derive(Debug, Error)]
pub enum OverseerError {
    // Launch failures (reported synchronously, fatal to the attempt)
    #[error("Failed to spawn overlay engine: {0}")]
    SpawnError(String),

    #[error("Failed to stop overlay engine: {0}")]
    StopError(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Missing required configuration field: {0}")]
    MissingConfigField(String),

    // Status record errors
    #[error("Failed to load status record: {0}")]
    StatusLoadError(String),

    #[error("Failed to save status record: {0}")]
    StatusSaveError(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for overseer operations
pub type Result<T> = std::result::Result<T, OverseerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_context() {
        let err = OverseerError::SpawnError("no such file".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to spawn overlay engine: no such file"
        );

        let err = OverseerError::StopError("task cancelled".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to stop overlay engine: task cancelled"
        );

        let err = OverseerError::MissingConfigField("engine_path".to_string());
        assert_eq!(
            err.to_string(),
            "Missing required configuration field: engine_path"
        );
    }
}
