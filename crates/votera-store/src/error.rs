use thiserror::Error;
use votera_worker::WorkerError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage is locked")]
    Locked,

    #[error("key \"{0}\" is reserved")]
    ReservedKey(String),

    #[error("Worker error: {0}")]
    Worker(WorkerError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<WorkerError> for StoreError {
    fn from(e: WorkerError) -> Self {
        match e {
            WorkerError::NotInitialized => StoreError::Locked,
            other => StoreError::Worker(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
