//! Weight-to-amount conversion primitives.
//!
//! All divisions are integer floor divisions; 256-bit intermediates keep
//! the multiplications overflow-free. The dust correction makes the final
//! amounts sum to the target exactly.

use merkledrop_core::Address;
use primitive_types::U256;
use tracing::debug;

use crate::ratios::BASIS_POINTS;
use crate::{AllocationError, Result};

/// Sanity bounds for an externally supplied conversion rate.
#[derive(Debug, Clone, Copy)]
pub struct RateBounds {
    /// The rate must satisfy `0 < rate < rate_cap`.
    pub rate_cap: u128,
    /// The converted total must stay strictly below this cap.
    pub total_cap: u128,
}

/// Floor of `value * numerator / denominator` with a 256-bit intermediate.
///
/// The quotient never exceeds `value * numerator / denominator` for our
/// callers' bounds, all of which keep it within u128 range.
fn mul_div(value: u128, numerator: u128, denominator: u128) -> u128 {
    (U256::from(value) * U256::from(numerator) / U256::from(denominator)).as_u128()
}

/// Split `total_pool` across a basis-point ratio table.
///
/// `amount = floor(total_pool * bps / 10_000)` per entry. The table must
/// sum to `expected_bps` (10_000 for a full sub-pool split, 6_000 for the
/// protocol table); a mismatch is fatal with no partial output.
pub fn split_by_ratio<K: Clone>(
    total_pool: u128,
    ratios: &[(K, u64)],
    expected_bps: u64,
) -> Result<Vec<(K, u128)>> {
    let total: u64 = ratios.iter().map(|(_, bps)| bps).sum();
    if total != expected_bps {
        return Err(AllocationError::RatioMismatch {
            total,
            expected: expected_bps,
        });
    }

    Ok(ratios
        .iter()
        .map(|(key, bps)| {
            (
                key.clone(),
                mul_div(total_pool, *bps as u128, BASIS_POINTS as u128),
            )
        })
        .collect())
}

/// Split `pool` proportionally to loss magnitudes.
///
/// Entries with zero or negative loss are excluded entirely (they receive
/// no claim at all, not a zero-amount one); the survivors keep their input
/// order. `amount = floor(loss * pool / total_loss)`, truncating toward
/// zero.
pub fn split_by_proportion(pool: u128, losses: &[(Address, i128)]) -> Result<Vec<(Address, u128)>> {
    let eligible: Vec<(Address, u128)> = losses
        .iter()
        .filter(|(_, loss)| *loss > 0)
        .map(|(wallet, loss)| (*wallet, *loss as u128))
        .collect();
    if eligible.is_empty() {
        return Err(AllocationError::NoEligibleEntries);
    }

    let total_loss: u128 = eligible.iter().map(|(_, loss)| loss).sum();
    debug!(
        eligible = eligible.len(),
        excluded = losses.len() - eligible.len(),
        total_loss,
        "proportional split"
    );

    Ok(eligible
        .into_iter()
        .map(|(wallet, loss)| (wallet, mul_div(loss, pool, total_loss)))
        .collect())
}

/// Convert raw penalty amounts to token amounts at an oracle-supplied rate.
///
/// `amount = floor(raw * rate / 10^rate_scale_pow)`. The rate must fall
/// strictly inside `(0, rate_cap)` and the converted total strictly below
/// `total_cap`, otherwise the call fails without output.
pub fn convert_by_rate(
    entries: &[(Address, u128)],
    rate: u128,
    rate_scale_pow: u32,
    bounds: RateBounds,
) -> Result<Vec<(Address, u128)>> {
    if rate == 0 || rate >= bounds.rate_cap {
        return Err(AllocationError::OracleSanity(format!(
            "rate {} outside (0, {})",
            rate, bounds.rate_cap
        )));
    }

    let scale = 10u128.pow(rate_scale_pow);
    let converted: Vec<(Address, u128)> = entries
        .iter()
        .map(|(wallet, raw)| (*wallet, mul_div(*raw, rate, scale)))
        .collect();

    let total: u128 = converted.iter().map(|(_, amount)| amount).sum();
    if total >= bounds.total_cap {
        return Err(AllocationError::OracleSanity(format!(
            "converted total {} exceeds cap {}",
            total, bounds.total_cap
        )));
    }

    Ok(converted)
}

/// Adjust floor-division remainders so amounts sum to `target_total`.
///
/// A remainder strictly below `dust_threshold` is added in full to the
/// smallest holder: wallets are sorted descending by amount (stable on
/// input order) and the remainder goes to the last entry of that sort.
/// A larger remainder, or amounts exceeding the target, signal an upstream
/// data inconsistency and are never silently corrected.
pub fn apply_dust_correction(
    amounts: Vec<(Address, u128)>,
    target_total: u128,
    dust_threshold: u128,
) -> Result<Vec<(Address, u128)>> {
    let sum: u128 = amounts.iter().map(|(_, amount)| amount).sum();
    if sum > target_total {
        return Err(AllocationError::NegativeRemainder {
            sum,
            target: target_total,
        });
    }

    let remainder = target_total - sum;
    if remainder == 0 {
        return Ok(amounts);
    }
    if remainder >= dust_threshold || amounts.is_empty() {
        return Err(AllocationError::DustOverflow {
            remainder,
            threshold: dust_threshold,
        });
    }

    let mut sorted = amounts;
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    if let Some((wallet, amount)) = sorted.last_mut() {
        *amount += remainder;
        debug!(remainder, wallet = %wallet, "added dust remainder to smallest holder");
    }
    Ok(sorted)
}
