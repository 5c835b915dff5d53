//! Encrypted local storage for the Votera client.
//!
//! `EncryptedStore` keeps the salt record and JSON values in a pluggable
//! `KeyValueStore`. All encryption goes through a `WorkerClient`, so the key
//! never lives outside the worker.

mod backend;
mod error;
mod file;
mod store;

pub use backend::{KeyValueStore, MemoryStore};
pub use error::{Result, StoreError};
pub use file::FileStore;
pub use store::{EncryptedStore, SALT_RECORD_KEY};
