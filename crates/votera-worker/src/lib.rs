//! Background worker for the local storage key.
//!
//! The worker owns the single active key. Hosts talk to it through correlated
//! messages: typed `Request`/`Response` pairs in Rust, or the flat
//! `{type, id, data1, data2}` `WireMessage` shape across a JS boundary.
//!
//! With the default `runtime` feature the worker runs on its own thread and
//! `WorkerClient` offers an async API over it. Without it, `KeyState` can be
//! driven directly (e.g. from a browser Web Worker).

mod config;
mod error;
pub mod protocol;
mod state;

#[cfg(feature = "runtime")]
mod client;
#[cfg(feature = "runtime")]
mod worker;

pub use config::WorkerConfig;
pub use error::WorkerError;
pub use protocol::{Envelope, MessageType, Reply, Request, Response, WireMessage, ERROR_TYPE};
pub use state::KeyState;

#[cfg(feature = "runtime")]
pub use client::{PendingReply, WorkerClient};
#[cfg(feature = "runtime")]
pub use worker::{spawn_worker, WorkerPort};

pub use votera_crypto::{DecryptFailurePolicy, KdfParams};
