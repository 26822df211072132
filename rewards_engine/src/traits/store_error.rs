use thiserror::Error;

/// The stable, backend-agnostic error taxonomy for store failures.
///
/// Backends translate every driver error into one of these kinds before it crosses the facade
/// boundary; repository code never sees a raw driver exception. The original message (and code,
/// where the driver supplies one) is preserved for diagnostics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    DuplicateEntry(String),
    #[error("Foreign key reference not found: {0}")]
    ReferenceNotFound(String),
    #[error("Check constraint failed: {0}")]
    ValidationFailed(String),
    #[error("Referenced table does not exist: {0}")]
    SchemaMissing(String),
    #[error("Database error ({code}): {message}")]
    Unknown { code: String, message: String },
}

impl StoreError {
    pub(crate) fn other<S: Into<String>>(message: S) -> Self {
        StoreError::Unknown { code: String::new(), message: message.into() }
    }
}
