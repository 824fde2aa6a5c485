use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("{0}")]
    Validation(String),
    #[error("classification error: {0}")]
    Classification(String),
    #[error("fetch error: {0}")]
    Fetch(String),
    #[error("{0}")]
    Submission(String),
    #[error("status update error: {0}")]
    StatusUpdate(String),
    #[error("backend responded with {status}{}", detail_suffix(.detail))]
    Backend { status: u16, detail: Option<String> },
    #[error("transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AppError {
    /// Server-supplied detail, when the backend sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            AppError::Backend { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}

pub type AppResult<T> = Result<T, AppError>;
