//! Local storage crypto for the Votera client.
//!
//! - scrypt derivation of a per-session key from a seed and a random local salt
//! - salt records that verify a candidate seed without storing the key
//! - AES-256-GCM encryption of stored text with the "E$" marker

pub mod base64;
pub mod cipher;
pub mod error;
pub mod kdf;
pub mod key;
pub mod types;
pub mod verifier;

pub use base64::{base64_decode, base64_encode};
pub use cipher::{decrypt_text, encrypt_text, is_encrypted, DecryptFailurePolicy};
pub use error::CryptoError;
pub use kdf::{derive_key_material, generate_salt, KdfParams};
pub use key::KeyMaterial;
pub use types::{
    ENCRYPTED_MARKER, KEY_LENGTH, KEY_MATERIAL_LENGTH, NONCE_LENGTH, TAG_LENGTH,
    VERIFIER_PLAINTEXT,
};
pub use verifier::{create_salt_record, verify_salt_record, SaltRecord};
