//! Fixed-size byte buffers used as hashes and identities.

use std::{fmt, str::FromStr};

use arbitrary::Arbitrary;
use serde::{Deserialize, Serialize};

macro_rules! impl_buf {
    ($name:ident, $len:expr) => {
        impl $name {
            /// Length of the buffer in bytes.
            pub const LEN: usize = $len;

            /// The all-zero buffer.
            pub const fn zero() -> Self {
                Self([0; $len])
            }

            /// Returns `true` if every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            /// Returns the underlying bytes.
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Builds the buffer from a slice, returning `None` if the length is wrong.
            pub fn from_slice(bytes: &[u8]) -> Option<Self> {
                <[u8; $len]>::try_from(bytes).ok().map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::zero()
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(value: [u8; $len]) -> Self {
                Self(value)
            }
        }

        impl From<$name> for [u8; $len] {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // the full value is rarely needed in debug output
                let hex = hex::encode(self.0);
                write!(f, "{}({}..{})", stringify!($name), &hex[..8], &hex[hex.len() - 8..])
            }
        }

        impl rlp::Encodable for $name {
            fn rlp_append(&self, stream: &mut rlp::RlpStream) {
                stream.encoder().encode_value(&self.0);
            }
        }

        impl rlp::Decodable for $name {
            fn decode(rlp: &rlp::Rlp<'_>) -> Result<Self, rlp::DecoderError> {
                Self::from_slice(rlp.data()?).ok_or(rlp::DecoderError::RlpInvalidLength)
            }
        }

        impl FromStr for $name {
            type Err = hex::FromHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let mut out = [0u8; $len];
                hex::decode_to_slice(s, &mut out)?;
                Ok(Self(out))
            }
        }
    };
}

/// A 32-byte buffer, used for keccak digests such as header hashes and trie roots.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Arbitrary, Serialize, Deserialize)]
pub struct Buf32(#[serde(with = "hex::serde")] pub [u8; 32]);

impl_buf!(Buf32, 32);

/// A 20-byte account identity on the relay's host ledger.
///
/// Submitters, disputers and verifiers are all identified by an [`Address`]; the zero address is
/// reserved for the genesis header, which has no submitter.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Arbitrary, Serialize, Deserialize)]
pub struct Address(#[serde(with = "hex::serde")] pub [u8; 20]);

impl_buf!(Address, 20);
