use base64ct::{Base64, Encoding};

use crate::error::CryptoError;

/// Standard (padded) base64 encode, the alphabet used by stored records and blobs.
pub fn base64_encode(data: &[u8]) -> String {
    Base64::encode_string(data)
}

/// Standard (padded) base64 decode.
pub fn base64_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    Ok(Base64::decode_vec(s)?)
}
