//! Integration tests for `EncryptedStore`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use votera_store::{
    EncryptedStore, FileStore, KeyValueStore, MemoryStore, StoreError, SALT_RECORD_KEY,
};
use votera_worker::{DecryptFailurePolicy, KdfParams, WorkerClient, WorkerConfig};

// ============================================================================
// Helpers
// ============================================================================

const SEED: &str = "c2VlZA==";
const WRONG_SEED: &str = "d3Jvbmc=";

fn fast_config() -> WorkerConfig {
    WorkerConfig {
        kdf: KdfParams {
            log_n: 4,
            r: 8,
            p: 1,
        },
        ..Default::default()
    }
}

fn worker() -> WorkerClient {
    WorkerClient::spawn(fast_config()).expect("spawn worker")
}

fn memory_store() -> EncryptedStore<MemoryStore> {
    EncryptedStore::new(MemoryStore::new(), worker())
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Settings {
    language: String,
    notifications: bool,
    proposals_seen: Vec<u32>,
}

fn settings() -> Settings {
    Settings {
        language: "ko".into(),
        notifications: true,
        proposals_seen: vec![3, 5, 8],
    }
}

/// Backend whose writes always fail.
struct ReadOnlyStore;

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get(&self, _name: &str) -> votera_store::Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _name: &str, _value: &str) -> votera_store::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
    }

    async fn remove(&self, _name: &str) -> votera_store::Result<()> {
        Ok(())
    }
}

/// Backend whose first write stalls, widening any window between deriving a
/// key and persisting its record.
struct SlowFirstWrite {
    inner: MemoryStore,
    stalled: AtomicBool,
}

impl SlowFirstWrite {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            stalled: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl KeyValueStore for SlowFirstWrite {
    async fn get(&self, name: &str) -> votera_store::Result<Option<String>> {
        self.inner.get(name).await
    }

    async fn set(&self, name: &str, value: &str) -> votera_store::Result<()> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        self.inner.set(name, value).await
    }

    async fn remove(&self, name: &str) -> votera_store::Result<()> {
        self.inner.remove(name).await
    }
}

/// Write a value, then check a fresh worker can rebuild the key from the
/// persisted record and read it back.
async fn assert_readable_by_new_session<S: KeyValueStore>(store: &EncryptedStore<S>) {
    store.set_item("vote", &42).await.unwrap();

    let record = store.backend().get(SALT_RECORD_KEY).await.unwrap().unwrap();
    let stored = store.backend().get("vote").await.unwrap().unwrap();

    let fresh = worker();
    assert!(fresh.get_local(&record, SEED).await.unwrap());
    assert_eq!(fresh.decrypt(&stored).await.unwrap(), "42");
}

// ============================================================================
// unlock / lock
// ============================================================================

#[tokio::test]
async fn first_unlock_creates_record() {
    let store = memory_store();
    assert!(!store.has_key().await.unwrap());
    assert!(!store.is_unlocked());

    assert!(store.unlock(SEED).await.unwrap());
    assert!(store.is_unlocked());
    assert!(store.has_key().await.unwrap());

    let record = store.backend().get(SALT_RECORD_KEY).await.unwrap().unwrap();
    assert_eq!(record.matches('.').count(), 1);
}

#[tokio::test]
async fn second_unlock_verifies_seed() {
    let store = memory_store();
    store.unlock(SEED).await.unwrap();
    store.lock().await.unwrap();
    assert!(!store.is_unlocked());

    assert!(!store.unlock(WRONG_SEED).await.unwrap());
    assert!(!store.is_unlocked());
    assert!(matches!(
        store.set_item("x", &1).await,
        Err(StoreError::Locked)
    ));

    assert!(store.unlock(SEED).await.unwrap());
    assert!(store.is_unlocked());
}

#[tokio::test]
async fn locked_store_rejects_reads_and_writes() {
    let store = memory_store();
    assert!(matches!(
        store.set_item("x", &1).await,
        Err(StoreError::Locked)
    ));

    store.unlock(SEED).await.unwrap();
    store.set_item("x", &1).await.unwrap();
    store.lock().await.unwrap();
    assert!(matches!(
        store.get_item::<i32>("x").await,
        Err(StoreError::Locked)
    ));
}

#[tokio::test]
async fn concurrent_first_unlocks_agree_on_one_key() {
    let store = EncryptedStore::new(SlowFirstWrite::new(), worker());
    let (a, b) = tokio::join!(store.unlock(SEED), store.unlock(SEED));
    assert!(a.unwrap());
    assert!(b.unwrap());
    assert!(store.is_unlocked());
    assert_readable_by_new_session(&store).await;
}

#[tokio::test]
async fn unlock_racing_reset_key_keeps_record_in_sync() {
    let store = EncryptedStore::new(SlowFirstWrite::new(), worker());
    let (unlocked, reset) = tokio::join!(store.unlock(SEED), store.reset_key(SEED));
    assert!(unlocked.unwrap());
    reset.unwrap();
    assert_readable_by_new_session(&store).await;
}

// ============================================================================
// items
// ============================================================================

#[tokio::test]
async fn json_round_trip_is_encrypted_at_rest() {
    let store = memory_store();
    store.unlock(SEED).await.unwrap();

    store.set_item("settings", &settings()).await.unwrap();
    let raw = store.backend().get("settings").await.unwrap().unwrap();
    assert!(raw.starts_with("E$"));
    assert!(!raw.contains("notifications"));

    let loaded: Settings = store.get_item("settings").await.unwrap().unwrap();
    assert_eq!(loaded, settings());
}

#[tokio::test]
async fn missing_item_is_none() {
    let store = memory_store();
    store.unlock(SEED).await.unwrap();
    assert_eq!(store.get_item::<Settings>("nope").await.unwrap(), None);
}

#[tokio::test]
async fn legacy_plaintext_is_readable() {
    let store = memory_store();
    store.unlock(SEED).await.unwrap();
    store
        .backend()
        .set("legacy", r#"{"theme":"dark"}"#)
        .await
        .unwrap();

    let value: BTreeMap<String, String> = store.get_item("legacy").await.unwrap().unwrap();
    assert_eq!(value.get("theme").map(String::as_str), Some("dark"));
}

#[tokio::test]
async fn remove_item() {
    let store = memory_store();
    store.unlock(SEED).await.unwrap();
    store.set_item("a", "value").await.unwrap();
    store.remove_item("a").await.unwrap();
    assert_eq!(store.get_item::<String>("a").await.unwrap(), None);
}

#[tokio::test]
async fn salt_record_key_is_reserved() {
    let store = memory_store();
    store.unlock(SEED).await.unwrap();
    assert!(matches!(
        store.set_item(SALT_RECORD_KEY, "x").await,
        Err(StoreError::ReservedKey(_))
    ));
    assert!(matches!(
        store.remove_item(SALT_RECORD_KEY).await,
        Err(StoreError::ReservedKey(_))
    ));
    assert!(store.has_key().await.unwrap());
}

#[tokio::test]
async fn reset_key_orphans_old_values() {
    let store = memory_store();
    store.unlock(SEED).await.unwrap();
    store.set_item("a", &1).await.unwrap();

    store.reset_key(WRONG_SEED).await.unwrap();
    assert!(matches!(
        store.get_item::<i32>("a").await,
        Err(StoreError::Worker(_))
    ));

    store.lock().await.unwrap();
    assert!(!store.unlock(SEED).await.unwrap());
    assert!(store.unlock(WRONG_SEED).await.unwrap());
}

#[tokio::test]
async fn empty_string_policy_reads_tampered_value_as_none() {
    let config = WorkerConfig {
        decrypt_failure: DecryptFailurePolicy::EmptyString,
        ..fast_config()
    };
    let store = EncryptedStore::new(
        MemoryStore::new(),
        WorkerClient::spawn(config).unwrap(),
    );
    store.unlock(SEED).await.unwrap();
    store.set_item("a", &1).await.unwrap();

    let raw = store.backend().get("a").await.unwrap().unwrap();
    let mut tampered: Vec<char> = raw.chars().collect();
    let last = tampered.len() - 3;
    tampered[last] = if tampered[last] == 'A' { 'B' } else { 'A' };
    let tampered: String = tampered.into_iter().collect();
    store.backend().set("a", &tampered).await.unwrap();

    assert_eq!(store.get_item::<i32>("a").await.unwrap(), None);
}

#[tokio::test]
async fn failed_record_write_leaves_store_locked() {
    let store = EncryptedStore::new(ReadOnlyStore, worker());
    assert!(matches!(store.unlock(SEED).await, Err(StoreError::Io(_))));
    assert!(!store.is_unlocked());
    assert!(matches!(
        store.set_item("x", &1).await,
        Err(StoreError::Locked)
    ));
}

// ============================================================================
// file backend
// ============================================================================

#[tokio::test]
async fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("votera.json");

    {
        let store = EncryptedStore::new(FileStore::new(&path), worker());
        assert!(store.unlock(SEED).await.unwrap());
        store.set_item("settings", &settings()).await.unwrap();
    }

    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert!(on_disk.contains(SALT_RECORD_KEY));
    assert!(!on_disk.contains("proposals_seen"));

    let store = EncryptedStore::new(FileStore::new(&path), worker());
    assert!(!store.unlock(WRONG_SEED).await.unwrap());
    assert!(store.unlock(SEED).await.unwrap());
    let loaded: Settings = store.get_item("settings").await.unwrap().unwrap();
    assert_eq!(loaded, settings());
}
