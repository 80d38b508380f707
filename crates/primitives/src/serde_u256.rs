//! Serde helpers for [`U256`] values in human-edited formats.
//!
//! TOML integers are limited to 64 bits, so amounts are written as decimal strings. Plain
//! integers are still accepted when deserializing for convenience.
//!
//! Use with `#[serde(with = "ethrelay_primitives::serde_u256")]`.

use ethnum::U256;
use serde::{de, Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Int(u64),
    Str(String),
}

/// Serializes a [`U256`] as a decimal string.
pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

/// Deserializes a [`U256`] from a decimal string, a `0x`-prefixed hex string or an integer.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    match Repr::deserialize(deserializer)? {
        Repr::Int(value) => Ok(U256::from(value)),
        Repr::Str(s) => {
            let parsed = match s.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16),
                None => U256::from_str_radix(&s, 10),
            };
            parsed.map_err(|e| de::Error::custom(format!("invalid u256 {s:?}: {e}")))
        }
    }
}

/// The same encoding for optional values.
pub mod option {
    use ethnum::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    struct Wrapped(#[serde(with = "super")] U256);

    /// Serializes an optional [`U256`] as a decimal string or `none`.
    pub fn serialize<S: Serializer>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => super::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional [`U256`].
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<U256>, D::Error> {
        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|w| w.0))
    }
}
