//! Dedicated worker thread.
//!
//! The thread owns the `KeyState`, drains envelopes one at a time and posts a
//! reply for each. It exits once every request sender is dropped or the reply
//! receiver goes away.

use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::protocol::{Envelope, Reply};
use crate::state::KeyState;

const WORKER_THREAD_NAME: &str = "votera-local-worker";

/// Channel endpoints of a running worker.
pub struct WorkerPort {
    pub requests: mpsc::UnboundedSender<Envelope>,
    pub replies: mpsc::UnboundedReceiver<Reply>,
    pub thread: JoinHandle<()>,
}

/// Start a worker thread.
pub fn spawn_worker(config: WorkerConfig) -> Result<WorkerPort, WorkerError> {
    config.validate()?;

    let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Envelope>();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel::<Reply>();

    let thread = thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || {
            let mut state = KeyState::new(config);
            info!("local worker started");
            while let Some(envelope) = request_rx.blocking_recv() {
                let reply = state.process(envelope);
                if reply_tx.send(reply).is_err() {
                    debug!("reply receiver dropped");
                    break;
                }
            }
            info!("local worker stopped");
        })
        .map_err(|e| WorkerError::Spawn(e.to_string()))?;

    Ok(WorkerPort {
        requests: request_tx,
        replies: reply_rx,
        thread,
    })
}
