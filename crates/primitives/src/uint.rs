//! Conversions between [`U256`] and its big-endian byte forms.

use ethnum::U256;

/// Encodes `value` as big-endian bytes with leading zeros stripped (zero encodes as empty).
pub fn to_minimal_be(value: &U256) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}

/// Decodes up to 32 big-endian bytes into a [`U256`].
///
/// Returns `None` if `bytes` is longer than 32 bytes.
pub fn from_be_slice(bytes: &[u8]) -> Option<U256> {
    if bytes.len() > 32 {
        return None;
    }

    let mut buf = [0u8; 32];
    buf[32 - bytes.len()..].copy_from_slice(bytes);
    Some(U256::from_be_bytes(buf))
}
