//! Derived key material held by the worker.
//!
//! Layout: [key:32][verifier nonce:12]. Zeroized on drop, never serialized.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::types::{KEY_LENGTH, KEY_MATERIAL_LENGTH};

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    bytes: [u8; KEY_MATERIAL_LENGTH],
}

impl KeyMaterial {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; KEY_MATERIAL_LENGTH] =
            bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: KEY_MATERIAL_LENGTH,
                got: bytes.len(),
            })?;
        Ok(Self { bytes })
    }

    pub(crate) fn from_array(bytes: [u8; KEY_MATERIAL_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Cipher key (first 32 bytes).
    pub fn key(&self) -> &[u8] {
        &self.bytes[..KEY_LENGTH]
    }

    /// Nonce used only for the salt-record verifier.
    pub fn verifier_nonce(&self) -> &[u8] {
        &self.bytes[KEY_LENGTH..]
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial(<redacted>)")
    }
}
