/// AES-256-GCM key length in bytes.
pub const KEY_LENGTH: usize = 32;

/// AES-GCM nonce length in bytes (96 bits per NIST recommendation).
pub const NONCE_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const TAG_LENGTH: usize = 16;

/// Length of the scrypt output: cipher key followed by the verifier nonce.
/// Also the length of the random local salt.
pub const KEY_MATERIAL_LENGTH: usize = KEY_LENGTH + NONCE_LENGTH;

/// Prefix marking a stored value as ciphertext.
///
/// Values without it are legacy plaintext and pass through decryption unchanged.
pub const ENCRYPTED_MARKER: &str = "E$";

/// Known plaintext sealed into the salt record to check a candidate seed.
pub const VERIFIER_PLAINTEXT: &str = "hello";

/// Separator between the salt and the verifier ciphertext in a salt record.
pub const RECORD_SEPARATOR: char = '.';
