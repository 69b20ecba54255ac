//! Error types for console operations
//!
//! Errors are classified by recoverability:
//! - Retryable: simulated backend failures (fetch, update, convert)
//! - RequiresUserAction: validation failures, conversion conflicts, unknown leads
//!
//! Preference storage problems are never surfaced; see `PreferenceError`.

use thiserror::Error;

/// Field-level validation failure. Local to the form that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    Email(String),

    #[error("{0}")]
    Amount(String),

    #[error("{0}")]
    RequiredField(String),
}

/// Preference storage failure. Best-effort callers log and drop these.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Preference store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference store SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Preference serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Preference store unavailable: {0}")]
    Unavailable(String),
}

/// Error types for console operations
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("{0}")]
    FetchFailed(String),

    #[error("{0}")]
    UpdateFailed(String),

    #[error("{0}")]
    ConvertFailed(String),

    #[error("Lead has already been converted to an opportunity")]
    AlreadyConverted,

    #[error("Lead conversion is already in progress")]
    ConversionInProgress,

    #[error("Lead not found: {0}")]
    LeadNotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ConsoleError {
    /// Returns true if repeating the same action may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConsoleError::FetchFailed(_)
                | ConsoleError::UpdateFailed(_)
                | ConsoleError::ConvertFailed(_)
                | ConsoleError::ConversionInProgress
        )
    }

    /// Returns true if the user has to change their input first
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            ConsoleError::Validation(_)
                | ConsoleError::AlreadyConverted
                | ConsoleError::LeadNotFound(_)
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ConsoleError::FetchFailed(_) => "Reload the lead list.",
            ConsoleError::UpdateFailed(_) => "Your change was reverted. Save it again.",
            ConsoleError::ConvertFailed(_) => "Submit the conversion again.",
            ConsoleError::AlreadyConverted => "Open the existing opportunity instead.",
            ConsoleError::ConversionInProgress => "Wait for the running conversion to finish.",
            ConsoleError::LeadNotFound(_) => "Reload the lead list and pick the lead again.",
            ConsoleError::Validation(_) => "Correct the highlighted field.",
        }
    }
}

/// Serializable error representation for front ends
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
    pub error_type: ErrorType,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    Retryable,
    RequiresUserAction,
}

impl From<&ConsoleError> for ErrorPayload {
    fn from(err: &ConsoleError) -> Self {
        let error_type = if err.requires_user_action() {
            ErrorType::RequiresUserAction
        } else {
            ErrorType::Retryable
        };

        ErrorPayload {
            message: err.to_string(),
            error_type,
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_failures_are_retryable() {
        let err = ConsoleError::UpdateFailed("Failed to update lead".into());
        let payload = ErrorPayload::from(&err);
        assert_eq!(payload.message, "Failed to update lead");
        assert_eq!(payload.error_type, ErrorType::Retryable);
        assert!(payload.can_retry);
    }

    #[test]
    fn test_validation_message_is_transparent() {
        let err: ConsoleError = ValidationError::Email("Email is required".into()).into();
        assert_eq!(err.to_string(), "Email is required");
        assert_eq!(ErrorPayload::from(&err).error_type, ErrorType::RequiresUserAction);
    }

    #[test]
    fn test_already_converted_message() {
        let err = ConsoleError::AlreadyConverted;
        assert_eq!(
            err.to_string(),
            "Lead has already been converted to an opportunity"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_lead_not_found_needs_user_action() {
        let err = ConsoleError::LeadNotFound("42".into());
        assert_eq!(err.to_string(), "Lead not found: 42");
        let payload = ErrorPayload::from(&err);
        assert_eq!(payload.error_type, ErrorType::RequiresUserAction);
        assert!(!payload.can_retry);
    }
}
