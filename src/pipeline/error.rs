//! Ingestion error taxonomy.

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// No body, an empty body, or a JSON `null`.
    #[error("Missing required fields")]
    MissingBody,

    /// Joined validation issues.
    #[error("The provided parameters are invalid: {0}")]
    Invalid(String),

    /// Only produced when sweep failures are surfaced.
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("An error occurred while creating the log: {0}")]
    StorageFailure(#[source] StorageError),
}

impl IngestError {
    /// HTTP status the caller should see.
    pub fn status_code(&self) -> u16 {
        match self {
            IngestError::MissingBody | IngestError::Invalid(_) => 400,
            IngestError::ChannelNotFound(_) => 404,
            IngestError::StorageFailure(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Message safe to return to callers. Storage details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            IngestError::ChannelNotFound(_) => "Channel not found".to_string(),
            IngestError::StorageFailure(_) => {
                "An error occurred while creating the log".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(IngestError::MissingBody.status_code(), 400);
        assert_eq!(IngestError::Invalid("x".into()).status_code(), 400);
        assert_eq!(IngestError::ChannelNotFound("c".into()).status_code(), 404);
        let storage = IngestError::StorageFailure(StorageError::Backend("disk".into()));
        assert_eq!(storage.status_code(), 500);
        assert!(!storage.is_client_error());
        assert!(IngestError::MissingBody.is_client_error());
    }

    #[test]
    fn test_public_messages() {
        assert_eq!(
            IngestError::Invalid("[0].host is required".into()).public_message(),
            "The provided parameters are invalid: [0].host is required"
        );
        let storage = IngestError::StorageFailure(StorageError::Backend("disk".into()));
        assert_eq!(
            storage.public_message(),
            "An error occurred while creating the log"
        );
    }
}
