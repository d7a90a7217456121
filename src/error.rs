use thiserror::Error;

use crate::store::StoreError;

/// Error taxonomy of the read pipeline. `NotFound` asks the caller to
/// fall back to the generic 404 page; everything else is fatal to the
/// request and maps to a 500-class response.
#[derive(Debug, Error)]
pub enum BlogError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage query failed: {0}")]
    Storage(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("feed rendering failed: {0}")]
    Feed(#[from] quick_xml::Error),
}

impl From<StoreError> for BlogError {
    fn from(err: StoreError) -> Self {
        BlogError::Storage(err.to_string())
    }
}

impl BlogError {
    pub fn not_found(what: impl Into<String>) -> BlogError {
        BlogError::NotFound(what.into())
    }
}

pub type BlogResult<T> = Result<T, BlogError>;
