//! Error types for workflow operations.

use database::DatabaseError;
use fleet_core::NotifyError;
use thiserror::Error;

/// Errors that can occur while driving a session or the review queue.
///
/// All variants except [`WorkflowError::Notify`] are recoverable: the
/// engine converts them to a user-visible message at the component
/// boundary, and one session's failure never affects another.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Malformed or out-of-place user input; re-prompt, state unchanged.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The driver has no active truck assignment.
    #[error("driver has no active truck assignment")]
    Unassigned,

    /// A review decision was attempted on a non-pending record.
    #[error("check record {0} has already been reviewed")]
    AlreadyDecided(i64),

    /// A referenced entity no longer exists.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller is not on the admin allow-list.
    #[error("not authorized")]
    NotAuthorized,

    /// The store failed; the user may retry, no partial rows were left.
    #[error("store error: {0}")]
    Store(DatabaseError),

    /// Outbound delivery failed.
    #[error("delivery failed: {0}")]
    Notify(#[from] NotifyError),
}

impl From<DatabaseError> for WorkflowError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::AlreadyDecided { id } => Self::AlreadyDecided(id),
            DatabaseError::NotFound { entity, id } => {
                Self::NotFound(format!("{} {}", entity, id))
            }
            other => Self::Store(other),
        }
    }
}

impl WorkflowError {
    /// The message shown to the user when this error reaches the
    /// component boundary.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Unassigned => {
                "You are not assigned to an active truck. Ask an administrator to assign you."
                    .to_string()
            }
            Self::AlreadyDecided(_) => "This submission has already been reviewed.".to_string(),
            Self::NotFound(_) => {
                "That no longer exists. It may have been removed; please start over.".to_string()
            }
            Self::NotAuthorized => "You do not have administrator access.".to_string(),
            Self::Store(_) => {
                "Something went wrong while saving. Nothing was recorded; please try again."
                    .to_string()
            }
            Self::Notify(e) => format!("Could not deliver a message: {}", e),
        }
    }
}

/// Result type for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_mapping() {
        let err: WorkflowError = DatabaseError::AlreadyDecided { id: 7 }.into();
        assert!(matches!(err, WorkflowError::AlreadyDecided(7)));

        let err: WorkflowError = DatabaseError::NotFound {
            entity: "Truck",
            id: "3".to_string(),
        }
        .into();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = [
            WorkflowError::Validation("send a photo".to_string()),
            WorkflowError::Unassigned,
            WorkflowError::AlreadyDecided(1),
            WorkflowError::NotFound("Truck 3".to_string()),
            WorkflowError::NotAuthorized,
        ];

        for err in errors {
            assert!(!err.user_message().is_empty());
        }
    }
}
