//! Merkledrop Allocation
//!
//! Deterministic conversion of weighted shares into exact integer token
//! amounts: basis-point ratio splits, proportional loss splits, rate
//! conversion for penalty redemption, and dust correction. Every operation
//! is a pure function over immutable inputs; any failure aborts the
//! category build with no partial output.

use thiserror::Error;

pub mod ratios;
pub mod split;

#[cfg(test)]
mod tests;

pub use ratios::{
    pool_allocations, Allocations, BASIS_POINTS, DUST_THRESHOLD, INITIAL_SUPPLY, PROTOCOL_BPS,
    PROTOCOL_RATIOS, TOKEN_DECIMALS, TOTAL_SUPPLY,
};
pub use split::{
    apply_dust_correction, convert_by_rate, split_by_proportion, split_by_ratio, RateBounds,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Ratio table sums to {total} basis points, expected {expected}")]
    RatioMismatch { total: u64, expected: u64 },
    #[error("Bucket amounts sum to {allocated}, expected {expected}")]
    SupplyMismatch { allocated: u128, expected: u128 },
    #[error("Dust remainder {remainder} is at or above threshold {threshold}")]
    DustOverflow { remainder: u128, threshold: u128 },
    #[error("Amounts sum to {sum}, exceeding target {target}")]
    NegativeRemainder { sum: u128, target: u128 },
    #[error("Oracle sanity check failed: {0}")]
    OracleSanity(String),
    #[error("No eligible entries after filtering")]
    NoEligibleEntries,
}

pub type Result<T> = std::result::Result<T, AllocationError>;
