//! Worker message protocol.
//!
//! Typed requests and responses are used in-process. `WireMessage` is the flat
//! `{type, id, data1, data2}` shape exchanged with JS hosts; converting it into
//! a `Request` is where missing fields and unknown kinds are rejected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WorkerError;

/// Wire `type` of an error response.
pub const ERROR_TYPE: &str = "ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    GetLocal,
    SetLocal,
    ResetLocal,
    Encrypt,
    Decrypt,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::GetLocal => "GET_LOCAL",
            MessageType::SetLocal => "SET_LOCAL",
            MessageType::ResetLocal => "RESET_LOCAL",
            MessageType::Encrypt => "ENCRYPT",
            MessageType::Decrypt => "DECRYPT",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET_LOCAL" => Ok(MessageType::GetLocal),
            "SET_LOCAL" => Ok(MessageType::SetLocal),
            "RESET_LOCAL" => Ok(MessageType::ResetLocal),
            "ENCRYPT" => Ok(MessageType::Encrypt),
            "DECRYPT" => Ok(MessageType::Decrypt),
            other => Err(WorkerError::UnknownType(other.to_string())),
        }
    }
}

/// A request to the worker. Seeds are base64.
#[derive(Clone, PartialEq, Eq)]
pub enum Request {
    /// Verify `seed` against a stored salt record and install the key on success.
    GetLocal { record: String, seed: String },
    /// Create a new salt record for `seed` and install its key.
    SetLocal { seed: String },
    /// Drop the active key.
    ResetLocal,
    Encrypt { plaintext: String },
    Decrypt { ciphertext: String },
}

impl Request {
    pub fn kind(&self) -> MessageType {
        match self {
            Request::GetLocal { .. } => MessageType::GetLocal,
            Request::SetLocal { .. } => MessageType::SetLocal,
            Request::ResetLocal => MessageType::ResetLocal,
            Request::Encrypt { .. } => MessageType::Encrypt,
            Request::Decrypt { .. } => MessageType::Decrypt,
        }
    }
}

// Payloads carry seeds and plaintext; only the kind is printable.
impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request::{}", self.kind())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Response {
    /// Outcome of `GetLocal`. `false` means the seed was wrong.
    Verified(bool),
    /// New salt record from `SetLocal`.
    Record(String),
    /// Acknowledges `ResetLocal`.
    Reset,
    Ciphertext(String),
    Plaintext(String),
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Verified(ok) => write!(f, "Verified({ok})"),
            Response::Record(_) => f.write_str("Record(..)"),
            Response::Reset => f.write_str("Reset"),
            Response::Ciphertext(_) => f.write_str("Ciphertext(..)"),
            Response::Plaintext(_) => f.write_str("Plaintext(..)"),
        }
    }
}

/// A request tagged with its correlation id.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub id: u64,
    pub request: Request,
}

/// The worker's answer to one `Envelope`.
#[derive(Debug)]
pub struct Reply {
    pub id: u64,
    pub kind: MessageType,
    pub result: Result<Response, WorkerError>,
}

/// Flat message shape used across the JS boundary.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data2: Option<String>,
}

impl fmt::Debug for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireMessage")
            .field("type", &self.kind)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl WireMessage {
    pub fn new(kind: MessageType, id: u64) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            id,
            data1: None,
            data2: None,
        }
    }

    pub fn with_data1(mut self, data1: impl Into<String>) -> Self {
        self.data1 = Some(data1.into());
        self
    }

    pub fn with_data2(mut self, data2: impl Into<String>) -> Self {
        self.data2 = Some(data2.into());
        self
    }

    /// Error response: `data1` is the message, `data2` the error code.
    pub fn error(id: u64, err: &WorkerError) -> Self {
        Self {
            kind: ERROR_TYPE.to_string(),
            id,
            data1: Some(err.to_string()),
            data2: Some(err.code().to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == ERROR_TYPE
    }
}

impl TryFrom<WireMessage> for Envelope {
    type Error = WorkerError;

    fn try_from(msg: WireMessage) -> Result<Self, Self::Error> {
        let kind: MessageType = msg.kind.parse()?;
        let request = match kind {
            MessageType::GetLocal => Request::GetLocal {
                record: msg.data1.ok_or(WorkerError::MissingParameter("data1"))?,
                seed: msg.data2.ok_or(WorkerError::MissingParameter("data2"))?,
            },
            MessageType::SetLocal => Request::SetLocal {
                seed: msg.data1.ok_or(WorkerError::MissingParameter("data1"))?,
            },
            MessageType::ResetLocal => Request::ResetLocal,
            MessageType::Encrypt => Request::Encrypt {
                plaintext: msg.data1.ok_or(WorkerError::MissingParameter("data1"))?,
            },
            MessageType::Decrypt => Request::Decrypt {
                ciphertext: msg.data1.ok_or(WorkerError::MissingParameter("data1"))?,
            },
        };
        Ok(Envelope { id: msg.id, request })
    }
}

impl From<Envelope> for WireMessage {
    fn from(envelope: Envelope) -> Self {
        let msg = WireMessage::new(envelope.request.kind(), envelope.id);
        match envelope.request {
            Request::GetLocal { record, seed } => msg.with_data1(record).with_data2(seed),
            Request::SetLocal { seed } => msg.with_data1(seed),
            Request::ResetLocal => msg,
            Request::Encrypt { plaintext } => msg.with_data1(plaintext),
            Request::Decrypt { ciphertext } => msg.with_data1(ciphertext),
        }
    }
}

impl From<Reply> for WireMessage {
    fn from(reply: Reply) -> Self {
        match reply.result {
            Ok(response) => {
                let msg = WireMessage::new(reply.kind, reply.id);
                match response {
                    Response::Verified(ok) => msg.with_data1(ok.to_string()),
                    Response::Record(record) => msg.with_data1(record),
                    Response::Reset => msg,
                    Response::Ciphertext(c) => msg.with_data1(c),
                    Response::Plaintext(p) => msg.with_data1(p),
                }
            }
            Err(err) => WireMessage::error(reply.id, &err),
        }
    }
}
