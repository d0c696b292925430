//! prime field helpers
//!
//! all state and witnesses live in the pallas base field. canonical
//! encoding is the 32-byte little-endian repr.

use ff::{Field, PrimeField};
pub use pasta_curves::Fp;

use crate::{Error, Result};

/// field element from a u64
pub fn fp_from_u64(value: u64) -> Fp {
    Fp::from(value)
}

/// field element from a u128
pub fn fp_from_u128(value: u128) -> Fp {
    let lo = Fp::from(value as u64);
    let hi = Fp::from((value >> 64) as u64);
    hi * two_pow(64) + lo
}

/// 2^n as a field element
pub fn two_pow(n: u64) -> Fp {
    Fp::from(2u64).pow_vartime([n])
}

/// little-endian bit decomposition of `x` into exactly `n` bits
///
/// fails if any bit at position >= n is set.
pub fn fp_to_bits_le(x: &Fp, n: usize) -> Result<Vec<bool>> {
    let repr = x.to_repr();
    let bytes = repr.as_ref();

    let mut bits = Vec::with_capacity(n);
    for i in 0..bytes.len() * 8 {
        let bit = (bytes[i / 8] >> (i % 8)) & 1 == 1;
        if i < n {
            bits.push(bit);
        } else if bit {
            return Err(Error::OutOfRange { bits: n });
        }
    }
    // n may exceed the repr width
    bits.resize(n, false);
    Ok(bits)
}

/// inverse of [`fp_to_bits_le`]
pub fn fp_from_bits_le(bits: &[bool]) -> Fp {
    bits.iter().rev().fold(Fp::ZERO, |acc, &bit| {
        acc.double() + if bit { Fp::ONE } else { Fp::ZERO }
    })
}

/// hex of the canonical repr
pub fn fp_to_hex(x: &Fp) -> String {
    hex::encode(x.to_repr())
}

/// parse a canonical hex repr, rejecting non-canonical encodings
pub fn fp_from_hex(s: &str) -> Result<Fp> {
    let bytes = hex::decode(s).map_err(|e| Error::Serialization(e.to_string()))?;
    let repr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| Error::Serialization("field element must be 32 bytes".into()))?;
    Option::from(Fp::from_repr(repr))
        .ok_or_else(|| Error::Serialization("non-canonical field element".into()))
}

/// serde adapter: field elements as hex strings
pub mod serde_fp {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(x: &Fp, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&fp_to_hex(x))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Fp, D::Error> {
        let s = String::deserialize(deserializer)?;
        fp_from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// serde adapter: fixed-size byte arrays as hex strings
pub mod serde_bytes_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom(format!("expected {} bytes", N)))
    }
}
