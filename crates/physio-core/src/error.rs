//! Error types for the physiotherapy exercise coach.
//!
//! Only configuration-time failures are errors. Per-frame conditions such as
//! an undetected pose or a rejected outlier are reported as frame status,
//! never raised.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown exercise: {0}")]
    UnknownExercise(String),

    #[error("Invalid exercise definition '{id}': {reason}")]
    InvalidDefinition { id: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::UnknownExercise("jumping-jacks".to_string());
        assert_eq!(err.to_string(), "Unknown exercise: jumping-jacks");

        let err = Error::InvalidDefinition {
            id: "leg-extension".to_string(),
            reason: "hold duration must be positive".to_string(),
        };
        assert!(err.to_string().contains("leg-extension"));
    }

    #[test]
    fn test_from_serde_json() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
