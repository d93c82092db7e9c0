//! Errors raised while building a request snapshot.

use thiserror::Error;

/// Errors that can occur while normalizing an inbound request.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A form field was submitted without any value.
    #[error("Form field '{field}' has no value, exactly one is required")]
    MissingFormValue { field: String },

    /// A form field was submitted with more than one value.
    #[error("Form field '{field}' has {count} values, exactly one is required")]
    RepeatedFormValue { field: String, count: usize },

    /// The same form field name appeared twice in the raw form data.
    #[error("Form field '{field}' appears more than once")]
    DuplicateFormField { field: String },

    /// The application path could not be resolved against the request url.
    #[error("Application path '{path}' cannot be resolved against the request url: {source}")]
    InvalidApplicationPath {
        path: String,
        #[source]
        source: url::ParseError,
    },
}

impl SnapshotError {
    /// True for every error caused by form data that is not single-valued.
    pub fn is_malformed_form_data(&self) -> bool {
        matches!(
            self,
            SnapshotError::MissingFormValue { .. }
                | SnapshotError::RepeatedFormValue { .. }
                | SnapshotError::DuplicateFormField { .. }
        )
    }

    /// Name of the offending form field, if the error concerns one.
    pub fn field(&self) -> Option<&str> {
        match self {
            SnapshotError::MissingFormValue { field }
            | SnapshotError::RepeatedFormValue { field, .. }
            | SnapshotError::DuplicateFormField { field } => Some(field),
            SnapshotError::InvalidApplicationPath { .. } => None,
        }
    }
}

/// Result type for snapshot construction.
pub type SnapshotResult<T> = Result<T, SnapshotError>;
