//! Salt records: the persisted, non-secret half of the local storage key.
//!
//! Record format: base64(localSalt) + "." + base64(AES-GCM(key, verifierNonce, "hello"))
//!
//! The salt is random and written once. The verifier lets a later session check
//! that a candidate seed reproduces the same key before anything is encrypted
//! under it.

use std::fmt;
use std::str::FromStr;

use crate::base64::{base64_decode, base64_encode};
use crate::cipher::{open, seal};
use crate::error::CryptoError;
use crate::kdf::{derive_key_material, generate_salt, KdfParams};
use crate::key::KeyMaterial;
use crate::types::{RECORD_SEPARATOR, VERIFIER_PLAINTEXT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaltRecord {
    salt: Vec<u8>,
    verifier: Vec<u8>,
}

impl SaltRecord {
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn verifier(&self) -> &[u8] {
        &self.verifier
    }
}

impl fmt::Display for SaltRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            base64_encode(&self.salt),
            RECORD_SEPARATOR,
            base64_encode(&self.verifier)
        )
    }
}

impl FromStr for SaltRecord {
    type Err = CryptoError;

    /// Splits on the first '.'. Both halves must be non-empty base64.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (salt, verifier) = s
            .split_once(RECORD_SEPARATOR)
            .ok_or(CryptoError::MalformedRecord("missing separator"))?;
        let salt = base64_decode(salt)?;
        let verifier = base64_decode(verifier)?;
        if salt.is_empty() {
            return Err(CryptoError::MalformedRecord("empty salt"));
        }
        if verifier.is_empty() {
            return Err(CryptoError::MalformedRecord("empty verifier"));
        }
        Ok(Self { salt, verifier })
    }
}

fn decode_seed(seed: &str) -> Result<Vec<u8>, CryptoError> {
    base64_decode(seed)
}

/// Establish a new local key for `seed` (base64).
///
/// Returns the record to persist and the key material to install.
pub fn create_salt_record(
    seed: &str,
    params: &KdfParams,
) -> Result<(SaltRecord, KeyMaterial), CryptoError> {
    let seed = decode_seed(seed)?;
    let salt = generate_salt()?;
    let material = derive_key_material(&salt, &seed, params)?;
    let verifier = seal(
        material.key(),
        material.verifier_nonce(),
        VERIFIER_PLAINTEXT.as_bytes(),
    )?;
    let record = SaltRecord {
        salt: salt.to_vec(),
        verifier,
    };
    Ok((record, material))
}

/// Recover the local key from a stored record and a candidate seed (base64).
///
/// `Ok(None)` means the seed does not reproduce the key. Errors are reserved
/// for malformed input and KDF failures.
pub fn verify_salt_record(
    record: &SaltRecord,
    seed: &str,
    params: &KdfParams,
) -> Result<Option<KeyMaterial>, CryptoError> {
    let seed = decode_seed(seed)?;
    let material = derive_key_material(&record.salt, &seed, params)?;
    match open(material.key(), material.verifier_nonce(), &record.verifier) {
        Ok(plaintext) if plaintext == VERIFIER_PLAINTEXT.as_bytes() => Ok(Some(material)),
        Ok(_) | Err(CryptoError::DecryptionFailed(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
