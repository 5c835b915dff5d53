//! Encrypted JSON storage over a `KeyValueStore`.
//!
//! The salt record is kept in the backend under `SALT_RECORD_KEY`. Every other
//! value is JSON, encrypted by the worker before it reaches the backend.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use votera_worker::WorkerClient;

use crate::backend::KeyValueStore;
use crate::error::{Result, StoreError};

/// Backend key holding the salt record.
pub const SALT_RECORD_KEY: &str = "votera.localSalt";

pub struct EncryptedStore<S: KeyValueStore> {
    backend: S,
    worker: WorkerClient,
    unlocked: AtomicBool,
    // Held across record lookup, key install and record write so the stored
    // record always matches the worker's key.
    key_lock: Mutex<()>,
}

impl<S: KeyValueStore> EncryptedStore<S> {
    pub fn new(backend: S, worker: WorkerClient) -> Self {
        Self {
            backend,
            worker,
            unlocked: AtomicBool::new(false),
            key_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Whether the last unlock succeeded and `lock` has not been called since.
    pub fn is_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::Acquire)
    }

    /// Whether a salt record has been stored.
    pub async fn has_key(&self) -> Result<bool> {
        Ok(self.backend.get(SALT_RECORD_KEY).await?.is_some())
    }

    /// Unlock with `seed` (base64).
    ///
    /// With a stored salt record the seed is verified against it and `false`
    /// is returned for a wrong seed. Without one, a new record is created.
    pub async fn unlock(&self, seed: &str) -> Result<bool> {
        let _guard = self.key_lock.lock().await;
        let ok = match self.backend.get(SALT_RECORD_KEY).await? {
            Some(record) => self.worker.get_local(&record, seed).await?,
            None => {
                self.install_new_key(seed).await?;
                true
            }
        };
        self.unlocked.store(ok, Ordering::Release);
        if ok {
            info!("storage unlocked");
        } else {
            warn!("storage unlock rejected");
        }
        Ok(ok)
    }

    /// Replace the stored key with a new one for `seed`.
    ///
    /// Values written under the previous key can no longer be decrypted.
    pub async fn reset_key(&self, seed: &str) -> Result<()> {
        let _guard = self.key_lock.lock().await;
        self.install_new_key(seed).await?;
        self.unlocked.store(true, Ordering::Release);
        info!("storage key replaced");
        Ok(())
    }

    /// Drop the active key.
    pub async fn lock(&self) -> Result<()> {
        let _guard = self.key_lock.lock().await;
        self.worker.reset_local().await?;
        self.unlocked.store(false, Ordering::Release);
        debug!("storage locked");
        Ok(())
    }

    pub async fn set_item<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        check_name(name)?;
        let json = serde_json::to_string(value)?;
        let ciphertext = self.worker.encrypt(&json).await?;
        self.backend.set(name, &ciphertext).await
    }

    /// Read and decrypt a value. Unencrypted values written by older clients
    /// are parsed as stored.
    pub async fn get_item<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        check_name(name)?;
        let Some(stored) = self.backend.get(name).await? else {
            return Ok(None);
        };
        let json = self.worker.decrypt(&stored).await?;
        if json.is_empty() {
            debug!(name, "stored value decrypted to empty string");
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&json)?))
    }

    pub async fn remove_item(&self, name: &str) -> Result<()> {
        check_name(name)?;
        self.backend.remove(name).await
    }

    /// Caller must hold `key_lock`.
    async fn install_new_key(&self, seed: &str) -> Result<()> {
        let record = self.worker.set_local(seed).await?;
        if let Err(e) = self.backend.set(SALT_RECORD_KEY, &record).await {
            // Never leave a key active that a later session cannot reconstruct.
            warn!(error = %e, "failed to persist salt record, dropping key");
            self.worker.reset_local().await?;
            self.unlocked.store(false, Ordering::Release);
            return Err(e);
        }
        Ok(())
    }
}

fn check_name(name: &str) -> Result<()> {
    if name == SALT_RECORD_KEY {
        return Err(StoreError::ReservedKey(name.to_string()));
    }
    Ok(())
}
