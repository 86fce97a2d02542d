use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Entity slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Duplicate {kind} representation: {detail}")]
    DuplicateRepresentation { kind: &'static str, detail: String },

    #[error("Entity not found: {0}")]
    EntityNotFound(String),
}

pub type MemoryResult<T> = Result<T, MemoryError>;
