//! Worker configuration.
//!
//! ```toml
//! decrypt_failure = "error"   # or "empty_string"
//!
//! [kdf]
//! log_n = 14
//! r = 8
//! p = 1
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use votera_crypto::{DecryptFailurePolicy, KdfParams};

use crate::error::WorkerError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// scrypt cost used for both creating and verifying salt records.
    pub kdf: KdfParams,
    /// Result of decrypting a stored value that fails authentication.
    pub decrypt_failure: DecryptFailurePolicy,
}

impl WorkerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, WorkerError> {
        let config: WorkerConfig =
            toml::from_str(s).map_err(|e| WorkerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, WorkerError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| WorkerError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), WorkerError> {
        self.kdf
            .validate()
            .map_err(|e| WorkerError::Config(e.to_string()))
    }
}
