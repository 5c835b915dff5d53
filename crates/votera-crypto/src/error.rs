use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Encrypted data too short")]
    DataTooShort,

    #[error("Invalid base64: {0}")]
    InvalidBase64(String),

    #[error("Malformed salt record: {0}")]
    MalformedRecord(&'static str),

    #[error("Invalid scrypt parameters: {0}")]
    InvalidKdfParams(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Decrypted data is not valid UTF-8")]
    InvalidUtf8,

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}

impl From<base64ct::Error> for CryptoError {
    fn from(e: base64ct::Error) -> Self {
        CryptoError::InvalidBase64(e.to_string())
    }
}
