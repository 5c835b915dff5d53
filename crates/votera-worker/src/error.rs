use thiserror::Error;
use votera_crypto::CryptoError;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("not initialized")]
    NotInitialized,

    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("bad parameter: {0}")]
    BadParameter(String),

    #[error("request id {0} is already pending")]
    DuplicateId(u64),

    #[error("worker is not running")]
    Disconnected,

    #[error("failed to start worker: {0}")]
    Spawn(String),

    #[error("unexpected response for {0}")]
    UnexpectedResponse(&'static str),

    #[error("invalid worker config: {0}")]
    Config(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl WorkerError {
    /// Stable code carried alongside the message on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            WorkerError::MissingParameter(_) => "missing_parameter",
            WorkerError::NotInitialized => "not_initialized",
            WorkerError::UnknownType(_) => "unknown_type",
            WorkerError::BadParameter(_) => "bad_parameter",
            WorkerError::DuplicateId(_) => "duplicate_id",
            WorkerError::Disconnected => "disconnected",
            WorkerError::Spawn(_) => "spawn",
            WorkerError::UnexpectedResponse(_) => "unexpected_response",
            WorkerError::Config(_) => "config",
            WorkerError::Crypto(_) => "crypto",
        }
    }
}
