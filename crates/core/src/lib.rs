//! Merkledrop Core
//!
//! Shared vocabulary for the distribution pipeline: wallet addresses,
//! allocation categories, and the keccak-256 content hash.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Length of a wallet address in bytes.
pub const ADDRESS_LEN: usize = 20;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address must be 0x-prefixed with 40 hex characters, got: {0}")]
    InvalidFormat(String),
    #[error("Address contains invalid hex: {0}")]
    InvalidHex(String),
    #[error("Address checksum mismatch: {0}")]
    BadChecksum(String),
    #[error("Zero address is not allowed")]
    ZeroAddress,
}

/// Compute the keccak-256 digest of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Render a digest or other byte string as 0x-prefixed lowercase hex.
pub fn hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// A 20-byte wallet address.
///
/// The canonical textual form is the EIP-55 mixed-case checksum encoding.
/// Parsing accepts all-lowercase and all-uppercase hex and normalizes them;
/// a mixed-case string with a wrong checksum is rejected, as is the zero
/// address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Construct from raw bytes. The zero address is rejected.
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Result<Self, AddressError> {
        if bytes == [0u8; ADDRESS_LEN] {
            return Err(AddressError::ZeroAddress);
        }
        Ok(Self(bytes))
    }

    /// Parse a textual address, validating the EIP-55 checksum when the
    /// input is mixed-case.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let hex_part = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| AddressError::InvalidFormat(s.to_string()))?;
        if hex_part.len() != ADDRESS_LEN * 2 {
            return Err(AddressError::InvalidFormat(s.to_string()));
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(hex_part.to_lowercase(), &mut bytes)
            .map_err(|_| AddressError::InvalidHex(s.to_string()))?;

        let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower {
            let expected = checksum_hex(&bytes);
            if hex_part != expected {
                return Err(AddressError::BadChecksum(s.to_string()));
            }
        }

        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// EIP-55 checksummed textual form, 0x-prefixed.
    pub fn to_checksum(&self) -> String {
        format!("0x{}", checksum_hex(&self.0))
    }
}

/// EIP-55: hash the lowercase hex of the address and uppercase every hex
/// letter whose corresponding hash nibble is >= 8.
fn checksum_hex(bytes: &[u8; ADDRESS_LEN]) -> String {
    let lower = hex::encode(bytes);
    let hash = keccak256(lower.as_bytes());
    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let nibble = (hash[i / 2] >> (4 * (1 - (i % 2) as u32))) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Allocation categories of the token distribution.
///
/// The ordered ratio table over these categories lives in the allocation
/// crate; category names here match the source documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Convex,
    Yearn,
    Redemptions,
    Treasury,
    Team,
    Victims,
    Licensing,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Convex,
        Category::Yearn,
        Category::Redemptions,
        Category::Treasury,
        Category::Team,
        Category::Victims,
        Category::Licensing,
    ];

    /// Uppercase name as used in the ratio table.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Convex => "CONVEX",
            Category::Yearn => "YEARN",
            Category::Redemptions => "REDEMPTIONS",
            Category::Treasury => "TREASURY",
            Category::Team => "TEAM",
            Category::Victims => "VICTIMS",
            Category::Licensing => "LICENSING",
        }
    }

    /// Lowercase name as used in artifact file names.
    pub fn file_tag(&self) -> &'static str {
        match self {
            Category::Convex => "convex",
            Category::Yearn => "yearn",
            Category::Redemptions => "redemptions",
            Category::Treasury => "treasury",
            Category::Team => "team",
            Category::Victims => "victims",
            Category::Licensing => "licensing",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference addresses from the EIP-55 specification.
    const CHECKSUMMED: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn test_checksum_roundtrip() {
        for s in CHECKSUMMED {
            let addr = Address::parse(s).unwrap();
            assert_eq!(addr.to_checksum(), s);
        }
    }

    #[test]
    fn test_parse_lowercase_normalizes() {
        for s in CHECKSUMMED {
            let addr = Address::parse(&s.to_lowercase()).unwrap();
            assert_eq!(addr.to_checksum(), s);
        }
    }

    #[test]
    fn test_parse_uppercase_normalizes() {
        let upper = format!("0x{}", CHECKSUMMED[0][2..].to_uppercase());
        let addr = Address::parse(&upper).unwrap();
        assert_eq!(addr.to_checksum(), CHECKSUMMED[0]);
    }

    #[test]
    fn test_bad_checksum_rejected() {
        // Flip the case of the final letter of a valid checksum.
        let bad = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD";
        assert!(matches!(
            Address::parse(bad),
            Err(AddressError::BadChecksum(_))
        ));
    }

    #[test]
    fn test_zero_address_rejected() {
        let zero = format!("0x{}", "0".repeat(40));
        assert_eq!(Address::parse(&zero), Err(AddressError::ZeroAddress));
        assert_eq!(
            Address::from_bytes([0u8; ADDRESS_LEN]),
            Err(AddressError::ZeroAddress)
        );
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(Address::parse("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse(&format!("0x{}", "zz".repeat(20))).is_err());
    }

    #[test]
    fn test_address_serde() {
        let addr = Address::parse(CHECKSUMMED[0]).unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", CHECKSUMMED[0]));
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_keccak256_known_vector() {
        // keccak256("") is a well-known constant.
        assert_eq!(
            hex_prefixed(&keccak256(b"")),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_category_names() {
        assert_eq!(Category::Team.name(), "TEAM");
        assert_eq!(Category::Team.file_tag(), "team");
        assert_eq!(Category::ALL.len(), 7);
    }
}
