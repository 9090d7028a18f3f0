//! Source document loading.
//!
//! JSON objects are loaded with their key order preserved: the dust and
//! index tie-breaks depend on original input order, so a plain unordered
//! map would silently change the commitment.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use merkledrop_core::Address;
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::{DistributionError, Result};

/// A JSON object deserialized as an ordered list of entries.
#[derive(Debug, Clone)]
struct OrderedMap<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor<V>(std::marker::PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(std::marker::PhantomData))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DistributionError::MissingInput(path.to_path_buf()),
        _ => DistributionError::MalformedInput {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    })?;
    serde_json::from_str(&content).map_err(|e| DistributionError::MalformedInput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Parse the keys of an ordered object into addresses, rejecting
/// duplicates (two spellings of the same address count as one).
fn parse_wallets<V>(raw: OrderedMap<V>, path: &Path) -> Result<Vec<(Address, V)>> {
    let mut seen = std::collections::HashSet::new();
    let mut entries = Vec::with_capacity(raw.0.len());
    for (key, value) in raw.0 {
        let address = Address::parse(&key).map_err(|e| DistributionError::MalformedInput {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !seen.insert(address) {
            return Err(DistributionError::DuplicateWallet(address.to_checksum()));
        }
        entries.push((address, value));
    }
    Ok(entries)
}

/// Team split source: wallet -> basis points, in document order.
pub fn load_team_splits(path: &Path) -> Result<Vec<(Address, u64)>> {
    let raw: OrderedMap<u64> = read_json(path)?;
    let entries = parse_wallets(raw, path)?;
    debug!(path = %path.display(), wallets = entries.len(), "loaded team splits");
    Ok(entries)
}

#[derive(Debug, Deserialize)]
struct VictimRecord {
    final_loss: i128,
}

/// Victim loss source: wallet -> final loss magnitude, in document order.
/// Fields other than `final_loss` are tolerated and ignored.
pub fn load_victim_data(path: &Path) -> Result<Vec<(Address, i128)>> {
    let raw: OrderedMap<VictimRecord> = read_json(path)?;
    let entries = parse_wallets(raw, path)?;
    debug!(path = %path.display(), wallets = entries.len(), "loaded victim data");
    Ok(entries
        .into_iter()
        .map(|(address, record)| (address, record.final_loss))
        .collect())
}

#[derive(Debug, Deserialize)]
struct RawPenaltyRecord {
    total_penalty: String,
    #[allow(dead_code)]
    timestamp: i64,
    #[serde(default)]
    #[allow(dead_code)]
    txn_hashes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PenaltyDoc {
    last_run: i64,
    data: OrderedMap<RawPenaltyRecord>,
}

/// Penalty collection output: the collection completion timestamp and the
/// per-wallet raw penalty amounts, in document order.
#[derive(Debug, Clone)]
pub struct PenaltySource {
    pub last_run: i64,
    pub penalties: Vec<(Address, u128)>,
}

/// Penalty source: `total_penalty` arrives as an integer string and is
/// parsed exactly; anything unparsable is malformed, not skipped.
pub fn load_penalty_data(path: &Path) -> Result<PenaltySource> {
    let doc: PenaltyDoc = read_json(path)?;
    let entries = parse_wallets(doc.data, path)?;

    let mut penalties = Vec::with_capacity(entries.len());
    for (address, record) in entries {
        let amount: u128 =
            record
                .total_penalty
                .parse()
                .map_err(|_| DistributionError::MalformedInput {
                    path: path.to_path_buf(),
                    reason: format!(
                        "total_penalty for {} is not an integer: {}",
                        address.to_checksum(),
                        record.total_penalty
                    ),
                })?;
        penalties.push((address, amount));
    }

    debug!(
        path = %path.display(),
        wallets = penalties.len(),
        last_run = doc.last_run,
        "loaded penalty data"
    );
    Ok(PenaltySource {
        last_run: doc.last_run,
        penalties,
    })
}
