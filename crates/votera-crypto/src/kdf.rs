//! scrypt key derivation.
//!
//! keyMaterial = scrypt(password=seed, salt=localSalt, N=2^log_n, r, p, len=44)

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::key::KeyMaterial;
use crate::types::KEY_MATERIAL_LENGTH;

/// scrypt cost parameters.
///
/// The defaults (N=16384, r=8, p=1) match what existing salt records were
/// created with. Changing them makes previously stored records unverifiable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// log2 of the CPU/memory cost N.
    pub log_n: u8,
    /// Block size.
    pub r: u32,
    /// Parallelism.
    pub p: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            log_n: 14,
            r: 8,
            p: 1,
        }
    }
}

impl KdfParams {
    /// The cost factor N.
    pub fn n(&self) -> u64 {
        1u64 << self.log_n.min(63)
    }

    /// Check the parameters are accepted by scrypt.
    pub fn validate(&self) -> Result<(), CryptoError> {
        self.to_scrypt().map(|_| ())
    }

    fn to_scrypt(self) -> Result<scrypt::Params, CryptoError> {
        scrypt::Params::new(self.log_n, self.r, self.p, KEY_MATERIAL_LENGTH)
            .map_err(|e| CryptoError::InvalidKdfParams(e.to_string()))
    }
}

/// Derive key material from a local salt and a decoded seed.
pub fn derive_key_material(
    salt: &[u8],
    seed: &[u8],
    params: &KdfParams,
) -> Result<KeyMaterial, CryptoError> {
    let scrypt_params = params.to_scrypt()?;
    let mut okm = [0u8; KEY_MATERIAL_LENGTH];
    scrypt::scrypt(seed, salt, &scrypt_params, &mut okm)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    let material = KeyMaterial::from_array(okm);
    okm.zeroize();
    Ok(material)
}

/// Generate a fresh random local salt.
pub fn generate_salt() -> Result<[u8; KEY_MATERIAL_LENGTH], CryptoError> {
    let mut salt = [0u8; KEY_MATERIAL_LENGTH];
    getrandom::getrandom(&mut salt).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(salt)
}
