//! AES-256-GCM encryption for locally stored values.
//!
//! Stored value format:
//! "E$" + base64([12 bytes: nonce][N bytes: ciphertext + tag])
//!
//! Values without the "E$" marker are legacy plaintext and decrypt to themselves.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use serde::{Deserialize, Serialize};

use crate::base64::{base64_decode, base64_encode};
use crate::error::CryptoError;
use crate::key::KeyMaterial;
use crate::types::{ENCRYPTED_MARKER, KEY_LENGTH, NONCE_LENGTH, TAG_LENGTH};

/// What `decrypt_text` returns when a marked value fails authentication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecryptFailurePolicy {
    /// Return `CryptoError::DecryptionFailed`.
    #[default]
    Error,
    /// Return an empty string. Matches older clients, which could not tell
    /// a tampered or corrupted value apart from an empty one.
    EmptyString,
}

/// Generate a random 12-byte nonce for AES-GCM.
pub fn generate_nonce() -> Result<[u8; NONCE_LENGTH], CryptoError> {
    let mut nonce = [0u8; NONCE_LENGTH];
    getrandom::getrandom(&mut nonce).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(nonce)
}

fn cipher_for(key: &[u8]) -> Result<Aes256Gcm, CryptoError> {
    if key.len() != KEY_LENGTH {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_LENGTH,
            got: key.len(),
        });
    }
    Aes256Gcm::new_from_slice(key).map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
}

fn check_nonce(nonce: &[u8]) -> Result<(), CryptoError> {
    if nonce.len() != NONCE_LENGTH {
        return Err(CryptoError::InvalidKeyLength {
            expected: NONCE_LENGTH,
            got: nonce.len(),
        });
    }
    Ok(())
}

/// Seal `plaintext` under an explicit key and nonce. Returns ciphertext + tag.
pub fn seal(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = cipher_for(key)?;
    check_nonce(nonce)?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
}

/// Open ciphertext + tag sealed with `seal`.
pub fn open(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = cipher_for(key)?;
    check_nonce(nonce)?;
    if ciphertext.len() < TAG_LENGTH {
        return Err(CryptoError::DecryptionFailed("ciphertext shorter than tag".into()));
    }
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Whether a stored value carries the encryption marker.
pub fn is_encrypted(data: &str) -> bool {
    data.starts_with(ENCRYPTED_MARKER)
}

/// Encrypt UTF-8 text under the cipher key with a fresh random nonce.
pub fn encrypt_text(plaintext: &str, key: &KeyMaterial) -> Result<String, CryptoError> {
    let nonce = generate_nonce()?;
    let ciphertext = seal(key.key(), &nonce, plaintext.as_bytes())?;

    let mut blob = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(format!("{}{}", ENCRYPTED_MARKER, base64_encode(&blob)))
}

/// Decrypt a stored value produced by `encrypt_text`.
///
/// Unmarked input is returned unchanged.
pub fn decrypt_text(
    data: &str,
    key: &KeyMaterial,
    policy: DecryptFailurePolicy,
) -> Result<String, CryptoError> {
    let Some(encoded) = data.strip_prefix(ENCRYPTED_MARKER) else {
        return Ok(data.to_string());
    };

    let blob = base64_decode(encoded)?;
    if blob.len() < NONCE_LENGTH {
        return Err(CryptoError::DataTooShort);
    }
    let (nonce, ciphertext) = blob.split_at(NONCE_LENGTH);

    match open(key.key(), nonce, ciphertext) {
        Ok(plaintext) => String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8),
        Err(err @ CryptoError::DecryptionFailed(_)) => match policy {
            DecryptFailurePolicy::Error => Err(err),
            DecryptFailurePolicy::EmptyString => {
                tracing::warn!("stored value failed authentication; returning empty string");
                Ok(String::new())
            }
        },
        Err(err) => Err(err),
    }
}
