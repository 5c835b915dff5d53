//! Raw string storage the encrypted store writes through.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;

/// Device key-value storage. Values are stored as given; encryption happens
/// above this layer.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<String>>;
    async fn set(&self, name: &str, value: &str) -> Result<()>;
    async fn remove(&self, name: &str) -> Result<()>;
}

/// In-memory backend.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(name).cloned())
    }

    async fn set(&self, name: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.values.lock().remove(name);
        Ok(())
    }
}
