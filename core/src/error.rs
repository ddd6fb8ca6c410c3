use thiserror::Error;

/// Errors surfaced by [`crate::service::PlanSyncService`].
///
/// Validation failures are raised before any state is touched. Storage
/// failures are passed through unchanged; callers may retry the same
/// add/remove call since both are safe to repeat.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl PlanError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<rusqlite::Error> for PlanError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.into())
    }
}

pub type PlanResult<T> = Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_displayed_verbatim() {
        let err = PlanError::validation("Invalid meal slot 'brunch'");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Invalid meal slot 'brunch'");
    }

    #[test]
    fn test_storage_error_is_not_validation() {
        let err: PlanError = anyhow::anyhow!("disk I/O error").into();
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "disk I/O error");
    }
}
