//! Async client for the local worker.
//!
//! Requests are tagged with an id and registered in a pending map before they
//! are sent. A router thread reads worker replies and completes the matching
//! pending entry, so replies are matched by id rather than arrival order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::protocol::{Envelope, Reply, Request, Response};
use crate::worker::{spawn_worker, WorkerPort};

const ROUTER_THREAD_NAME: &str = "votera-local-worker-router";

type ReplySender = oneshot::Sender<Result<Response, WorkerError>>;
type PendingMap = Arc<Mutex<HashMap<u64, ReplySender>>>;

/// Receiver for one outstanding request.
pub type PendingReply = oneshot::Receiver<Result<Response, WorkerError>>;

struct ClientInner {
    requests: mpsc::UnboundedSender<Envelope>,
    pending: PendingMap,
    next_id: AtomicU64,
}

/// Handle to a running worker. Cheap to clone; the worker stops when the last
/// clone is dropped.
#[derive(Clone)]
pub struct WorkerClient {
    inner: Arc<ClientInner>,
}

impl WorkerClient {
    /// Start a worker and its reply router.
    pub fn spawn(config: WorkerConfig) -> Result<Self, WorkerError> {
        let WorkerPort {
            requests,
            replies,
            thread: _,
        } = spawn_worker(config)?;

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let router_pending = Arc::clone(&pending);
        thread::Builder::new()
            .name(ROUTER_THREAD_NAME.to_string())
            .spawn(move || route_replies(replies, router_pending))
            .map_err(|e| WorkerError::Spawn(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                requests,
                pending,
                next_id: AtomicU64::new(1),
            }),
        })
    }

    /// Send a request under a caller-chosen id.
    pub fn post(&self, id: u64, request: Request) -> Result<PendingReply, WorkerError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.inner.pending.lock();
            if pending.contains_key(&id) {
                return Err(WorkerError::DuplicateId(id));
            }
            pending.insert(id, tx);
        }
        self.send(Envelope { id, request })?;
        Ok(rx)
    }

    /// Send a request under a fresh id and wait for its reply.
    ///
    /// Ids still pending from `post` are skipped.
    pub async fn request(&self, request: Request) -> Result<Response, WorkerError> {
        let (tx, rx) = oneshot::channel();
        let id = {
            let mut pending = self.inner.pending.lock();
            let mut id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
            while pending.contains_key(&id) {
                id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
            }
            pending.insert(id, tx);
            id
        };
        self.send(Envelope { id, request })?;
        rx.await.map_err(|_| WorkerError::Disconnected)?
    }

    fn send(&self, envelope: Envelope) -> Result<(), WorkerError> {
        let id = envelope.id;
        if self.inner.requests.send(envelope).is_err() {
            self.inner.pending.lock().remove(&id);
            return Err(WorkerError::Disconnected);
        }
        Ok(())
    }

    /// Number of requests still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Create a new salt record for `seed` and make its key active.
    pub async fn set_local(&self, seed: &str) -> Result<String, WorkerError> {
        match self
            .request(Request::SetLocal {
                seed: seed.to_string(),
            })
            .await?
        {
            Response::Record(record) => Ok(record),
            _ => Err(WorkerError::UnexpectedResponse("SET_LOCAL")),
        }
    }

    /// Check `seed` against `record`. On `true` the key is active; on `false`
    /// no key is active.
    pub async fn get_local(&self, record: &str, seed: &str) -> Result<bool, WorkerError> {
        match self
            .request(Request::GetLocal {
                record: record.to_string(),
                seed: seed.to_string(),
            })
            .await?
        {
            Response::Verified(ok) => Ok(ok),
            _ => Err(WorkerError::UnexpectedResponse("GET_LOCAL")),
        }
    }

    pub async fn reset_local(&self) -> Result<(), WorkerError> {
        match self.request(Request::ResetLocal).await? {
            Response::Reset => Ok(()),
            _ => Err(WorkerError::UnexpectedResponse("RESET_LOCAL")),
        }
    }

    pub async fn encrypt(&self, plaintext: &str) -> Result<String, WorkerError> {
        match self
            .request(Request::Encrypt {
                plaintext: plaintext.to_string(),
            })
            .await?
        {
            Response::Ciphertext(ciphertext) => Ok(ciphertext),
            _ => Err(WorkerError::UnexpectedResponse("ENCRYPT")),
        }
    }

    pub async fn decrypt(&self, ciphertext: &str) -> Result<String, WorkerError> {
        match self
            .request(Request::Decrypt {
                ciphertext: ciphertext.to_string(),
            })
            .await?
        {
            Response::Plaintext(plaintext) => Ok(plaintext),
            _ => Err(WorkerError::UnexpectedResponse("DECRYPT")),
        }
    }
}

fn route_replies(mut replies: mpsc::UnboundedReceiver<Reply>, pending: PendingMap) {
    while let Some(reply) = replies.blocking_recv() {
        let sender = pending.lock().remove(&reply.id);
        match sender {
            Some(tx) => {
                // Receiver may have been dropped by a caller that gave up waiting.
                if tx.send(reply.result).is_err() {
                    debug!(id = reply.id, "reply dropped, caller no longer waiting");
                }
            }
            None => warn!(id = reply.id, kind = %reply.kind, "reply for unknown request id"),
        }
    }
    // Worker is gone: fail everything still waiting.
    pending.lock().clear();
}
