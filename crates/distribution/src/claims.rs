//! Claim document types and their wire representation.
//!
//! The JSON layout and the 84-byte leaf encoding are a bit-exact contract
//! with the on-chain verifier; field order and hex forms here are not
//! negotiable.

use merkledrop_core::Address;
use serde::{Deserialize, Serialize};

/// Length of a packed claim leaf: address (20) + index (32) + amount (32).
pub const LEAF_LEN: usize = 84;

/// Pack a claim into the fixed leaf layout the contract reconstructs:
/// raw address bytes, then the index and amount as big-endian 256-bit
/// words. The encoding is hashed once, inside tree construction.
pub fn encode_leaf(address: &Address, index: u64, amount: u128) -> [u8; LEAF_LEN] {
    let mut buf = [0u8; LEAF_LEN];
    buf[..20].copy_from_slice(address.as_bytes());
    buf[44..52].copy_from_slice(&index.to_be_bytes());
    buf[68..84].copy_from_slice(&amount.to_be_bytes());
    buf
}

/// One wallet's claim: its dense index, token amount in smallest units,
/// and inclusion proof (sibling digests, leaf to root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub index: u64,
    pub amount: u128,
    #[serde(with = "proof_hex")]
    pub proof: Vec<[u8; 32]>,
}

/// The per-category distribution document.
///
/// `claims` is an ordered mapping, emitted in index order with
/// checksummed address keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    #[serde(with = "hash_hex")]
    pub merkle_root: [u8; 32],
    #[serde(with = "hex_uint")]
    pub token_total: u128,
    #[serde(with = "ordered_claims")]
    pub claims: Vec<(Address, Claim)>,
}

impl Distribution {
    pub fn claim(&self, address: &Address) -> Option<&Claim> {
        self.claims
            .iter()
            .find(|(wallet, _)| wallet == address)
            .map(|(_, claim)| claim)
    }
}

fn decode_digest<E: serde::de::Error>(s: &str) -> Result<[u8; 32], E> {
    let hex_part = s
        .strip_prefix("0x")
        .ok_or_else(|| E::custom(format!("digest missing 0x prefix: {s}")))?;
    let mut out = [0u8; 32];
    hex::decode_to_slice(hex_part, &mut out)
        .map_err(|e| E::custom(format!("bad digest {s}: {e}")))?;
    Ok(out)
}

/// 32-byte digest as 0x-prefixed lowercase hex.
mod hash_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&merkledrop_core::hex_prefixed(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        super::decode_digest(&s)
    }
}

/// Unsigned integer as a 0x-prefixed hex string without leading zeros.
mod hex_uint {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{value:#x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| serde::de::Error::custom(format!("integer missing 0x prefix: {s}")))?;
        u128::from_str_radix(hex_part, 16).map_err(serde::de::Error::custom)
    }
}

/// Proof as a JSON array of 0x-prefixed digests.
mod proof_hex {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(proof: &[[u8; 32]], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(proof.len()))?;
        for digest in proof {
            seq.serialize_element(&merkledrop_core::hex_prefixed(digest))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<[u8; 32]>, D::Error> {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings.iter().map(|s| super::decode_digest(s)).collect()
    }
}

/// Claims as a JSON object keyed by checksummed address, preserving order.
mod ordered_claims {
    use std::fmt;

    use merkledrop_core::Address;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::Claim;

    pub fn serialize<S: Serializer>(
        claims: &[(Address, Claim)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(claims.len()))?;
        for (address, claim) in claims {
            map.serialize_entry(address, claim)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(Address, Claim)>, D::Error> {
        struct ClaimsVisitor;

        impl<'de> Visitor<'de> for ClaimsVisitor {
            type Value = Vec<(Address, Claim)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of address to claim")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut claims = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<Address, Claim>()? {
                    claims.push(entry);
                }
                Ok(claims)
            }
        }

        deserializer.deserialize_map(ClaimsVisitor)
    }
}
