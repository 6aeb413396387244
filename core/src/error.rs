use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    /// Malformed caller input. Raised before the store is touched.
    #[error("{0}")]
    Validation(String),

    #[error("storage failure: {0}")]
    Persistence(#[from] rusqlite::Error),
}

impl LogError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T, E = LogError> = std::result::Result<T, E>;
