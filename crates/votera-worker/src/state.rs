//! The worker's key state machine.
//!
//! Uninitialized -> (SetLocal | GetLocal true) -> Keyed
//! Keyed -> (ResetLocal | GetLocal false) -> Uninitialized
//!
//! Encrypt and Decrypt require Keyed. A request that fails with an error
//! leaves the current key as it was.

use tracing::{debug, info, warn};
use votera_crypto::{
    create_salt_record, decrypt_text, encrypt_text, verify_salt_record, KeyMaterial, SaltRecord,
};
use zeroize::Zeroizing;

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::protocol::{Envelope, Reply, Request, Response, WireMessage};

pub struct KeyState {
    config: WorkerConfig,
    key: Option<KeyMaterial>,
}

impl KeyState {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config, key: None }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn is_keyed(&self) -> bool {
        self.key.is_some()
    }

    fn active_key(&self) -> Result<&KeyMaterial, WorkerError> {
        self.key.as_ref().ok_or(WorkerError::NotInitialized)
    }

    pub fn handle(&mut self, request: Request) -> Result<Response, WorkerError> {
        match request {
            Request::GetLocal { record, seed } => {
                let seed = Zeroizing::new(seed);
                let record: SaltRecord = record.parse()?;
                match verify_salt_record(&record, &seed, &self.config.kdf)? {
                    Some(key) => {
                        self.key = Some(key);
                        info!("local key verified");
                        Ok(Response::Verified(true))
                    }
                    None => {
                        self.key = None;
                        warn!("local key verification failed");
                        Ok(Response::Verified(false))
                    }
                }
            }
            Request::SetLocal { seed } => {
                let seed = Zeroizing::new(seed);
                let (record, key) = create_salt_record(&seed, &self.config.kdf)?;
                self.key = Some(key);
                info!("local key created");
                Ok(Response::Record(record.to_string()))
            }
            Request::ResetLocal => {
                if self.key.take().is_some() {
                    info!("local key cleared");
                }
                Ok(Response::Reset)
            }
            Request::Encrypt { plaintext } => {
                let plaintext = Zeroizing::new(plaintext);
                let key = self.active_key()?;
                Ok(Response::Ciphertext(encrypt_text(&plaintext, key)?))
            }
            Request::Decrypt { ciphertext } => {
                let key = self.active_key()?;
                let plaintext = decrypt_text(&ciphertext, key, self.config.decrypt_failure)?;
                Ok(Response::Plaintext(plaintext))
            }
        }
    }

    /// Process one correlated request.
    pub fn process(&mut self, envelope: Envelope) -> Reply {
        let kind = envelope.request.kind();
        let result = self.handle(envelope.request);
        match &result {
            Ok(_) => debug!(id = envelope.id, %kind, "request handled"),
            Err(e) => debug!(id = envelope.id, %kind, error = %e, "request failed"),
        }
        Reply {
            id: envelope.id,
            kind,
            result,
        }
    }

    /// Process one wire message. Always produces a response carrying the same id.
    pub fn handle_wire(&mut self, msg: WireMessage) -> WireMessage {
        let id = msg.id;
        match Envelope::try_from(msg) {
            Ok(envelope) => self.process(envelope).into(),
            Err(e) => {
                warn!(id, error = %e, "rejected worker message");
                WireMessage::error(id, &e)
            }
        }
    }
}
