use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReshapeError {
    #[error("Invalid schema at '{path}': {reason}")]
    InvalidSchema { path: String, reason: String },
    #[error("No numeric property found in schema to use as an identifier")]
    MissingIdentifier,
    #[error("Malformed input at {path}: expected {expected}, found {found}")]
    MalformedInput {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReshapeError>;

impl ReshapeError {
    pub(crate) fn invalid_schema(path: &str, reason: impl Into<String>) -> Self {
        ReshapeError::InvalidSchema {
            path: if path.is_empty() { "$".to_string() } else { path.to_string() },
            reason: reason.into(),
        }
    }
}

/// First property found not to match a schema.
///
/// Conformance is a query rather than a precondition, so this is returned as
/// a diagnostic alongside a `false` verdict instead of being raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Shape mismatch at '{path}': expected {expected}, found {found}")]
pub struct ShapeMismatch {
    pub path: String,
    pub expected: String,
    pub found: String,
}
