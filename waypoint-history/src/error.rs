use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("identity is not a safe file name: {0:?}")]
    UnsafeIdentity(String),
}

pub type Result<T> = std::result::Result<T, HistoryError>;
