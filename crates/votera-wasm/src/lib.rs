//! WASM bindings for the Votera local worker.
//!
//! Runs the same message protocol as the native worker thread, synchronously,
//! inside a browser Web Worker so key derivation stays off the UI thread.

mod error;
mod worker;

pub use worker::LocalWorker;
