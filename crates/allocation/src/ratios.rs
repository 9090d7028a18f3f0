//! Protocol supply constants and the static allocation ratio table.

use merkledrop_core::Category;
use tracing::debug;

use crate::split::split_by_ratio;
use crate::{AllocationError, Result};

/// Token decimals; all amounts are in the smallest unit.
pub const TOKEN_DECIMALS: u32 = 18;

/// One whole token in the smallest unit.
const ONE: u128 = 10u128.pow(TOKEN_DECIMALS);

/// Full token supply.
pub const TOTAL_SUPPLY: u128 = 100_000_000 * ONE;

/// Portion of the supply covered by the ratio table (60%).
pub const INITIAL_SUPPLY: u128 = 60_000_000 * ONE;

/// Basis points denominator.
pub const BASIS_POINTS: u64 = 10_000;

/// Expected sum of the protocol ratio table (60% of supply).
pub const PROTOCOL_BPS: u64 = 6_000;

/// Default dust threshold in smallest units.
pub const DUST_THRESHOLD: u128 = 1_000;

/// The protocol allocation table, in basis points of `TOTAL_SUPPLY`.
///
/// Declared statically and validated against `PROTOCOL_BPS` before any
/// allocation math runs; the remaining 40% of supply is outside this
/// system.
pub const PROTOCOL_RATIOS: &[(Category, u64)] = &[
    (Category::Convex, 2_000),
    (Category::Yearn, 1_000),
    (Category::Redemptions, 1_500),
    (Category::Treasury, 1_050),
    (Category::Team, 200),
    (Category::Victims, 200),
    (Category::Licensing, 50),
];

/// Per-category bucket amounts, computed once from the ratio table and
/// passed by value through the pipeline. Never stored globally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocations(Vec<(Category, u128)>);

impl Allocations {
    /// Bucket amount for a category. The table covers every category.
    pub fn get(&self, category: Category) -> u128 {
        self.0
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, amount)| *amount)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Category, u128)> {
        self.0.iter()
    }

    pub fn total(&self) -> u128 {
        self.0.iter().map(|(_, amount)| amount).sum()
    }
}

/// Split `TOTAL_SUPPLY` across the protocol ratio table.
///
/// Validates that the table sums to `PROTOCOL_BPS` and that the resulting
/// bucket amounts sum to `INITIAL_SUPPLY` exactly; either violation is
/// fatal before any bucket is used.
pub fn pool_allocations() -> Result<Allocations> {
    let buckets = split_by_ratio(TOTAL_SUPPLY, PROTOCOL_RATIOS, PROTOCOL_BPS)?;

    let allocated: u128 = buckets.iter().map(|(_, amount)| amount).sum();
    if allocated != INITIAL_SUPPLY {
        return Err(AllocationError::SupplyMismatch {
            allocated,
            expected: INITIAL_SUPPLY,
        });
    }

    debug!(buckets = buckets.len(), allocated, "computed pool allocations");
    Ok(Allocations(buckets))
}
