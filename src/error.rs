use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A persisted path no longer resolves against the loaded scene.
    #[error("path {0} no longer resolves")]
    StaleReference(String),

    #[error("parameter {key} holds a {expected} value, got {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("index {index} out of range (len {len})")]
    InvalidIndex { index: usize, len: usize },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
