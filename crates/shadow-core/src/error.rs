use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported file format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("No document content was loaded")]
    NoContent,

    #[error("Access denied: clearance level {level} is insufficient")]
    AccessDenied { level: u8 },

    #[error("Invalid clearance level: {0}")]
    InvalidClearance(String),

    #[error("Invalid top_k {0}: expected a value between 3 and 10")]
    InvalidTopK(usize),

    #[error("Id already present in the corpus: {0}")]
    DuplicateId(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Errors that abort a whole request rather than a single document or query.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NoContent | Self::InvalidClearance(_) | Self::InvalidTopK(_) | Self::InvalidConfig(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_level_errors_are_fatal() {
        assert!(Error::NoContent.is_fatal());
        assert!(Error::InvalidTopK(11).is_fatal());
        assert!(Error::InvalidClearance("x".into()).is_fatal());
        assert!(!Error::AccessDenied { level: 1 }.is_fatal());
        assert!(!Error::ProviderUnavailable("timeout".into()).is_fatal());
        assert!(!Error::DuplicateId("brief".into()).is_fatal());
    }
}
