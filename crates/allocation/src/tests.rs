//! Allocation math tests, including randomized exactness properties.

use merkledrop_core::Address;
use proptest::prelude::*;

use crate::{
    apply_dust_correction, convert_by_rate, split_by_proportion, split_by_ratio, AllocationError,
    RateBounds, BASIS_POINTS,
};

fn addr(n: u8) -> Address {
    assert_ne!(n, 0);
    Address::from_bytes([n; 20]).unwrap()
}

#[test]
fn test_split_by_ratio_exact() {
    let pool = 2_000_000u128 * 10u128.pow(18);
    let splits = split_by_ratio(pool, &[(addr(1), 6_000), (addr(2), 4_000)], BASIS_POINTS).unwrap();
    assert_eq!(splits[0], (addr(1), 1_200_000 * 10u128.pow(18)));
    assert_eq!(splits[1], (addr(2), 800_000 * 10u128.pow(18)));
}

#[test]
fn test_split_by_ratio_rejects_bad_total() {
    let ratios = [(addr(1), 5_000u64), (addr(2), 3_000), (addr(3), 1_999)];
    let err = split_by_ratio(1_000_000, &ratios, BASIS_POINTS).unwrap_err();
    assert_eq!(
        err,
        AllocationError::RatioMismatch {
            total: 9_999,
            expected: 10_000
        }
    );
}

#[test]
fn test_split_by_proportion_excludes_non_positive() {
    let losses = [(addr(1), 300i128), (addr(2), 0), (addr(3), -50), (addr(4), 100)];
    let splits = split_by_proportion(4_000, &losses).unwrap();
    assert_eq!(splits, vec![(addr(1), 3_000), (addr(4), 1_000)]);
}

#[test]
fn test_split_by_proportion_truncates() {
    // 1000 * 1000 / 3000 = 333.33 -> 333
    let losses = [(addr(1), 1_000i128), (addr(2), 1_000), (addr(3), 1_000)];
    let splits = split_by_proportion(1_000, &losses).unwrap();
    assert!(splits.iter().all(|(_, amount)| *amount == 333));
}

#[test]
fn test_split_by_proportion_no_eligible() {
    let losses = [(addr(1), 0i128), (addr(2), -7)];
    assert_eq!(
        split_by_proportion(1_000, &losses),
        Err(AllocationError::NoEligibleEntries)
    );
}

#[test]
fn test_dust_goes_to_smallest_holder() {
    let amounts = vec![(addr(1), 500u128), (addr(2), 300), (addr(3), 200)];
    let corrected = apply_dust_correction(amounts, 1_003, 10).unwrap();
    assert_eq!(
        corrected,
        vec![(addr(1), 500), (addr(2), 300), (addr(3), 203)]
    );
}

#[test]
fn test_dust_tie_break_is_stable() {
    // Equal amounts: the remainder goes to the last entry in input order.
    let amounts = vec![(addr(1), 100u128), (addr(2), 100), (addr(3), 100)];
    let corrected = apply_dust_correction(amounts, 305, 10).unwrap();
    assert_eq!(
        corrected,
        vec![(addr(1), 100), (addr(2), 100), (addr(3), 105)]
    );
}

#[test]
fn test_dust_zero_remainder_is_noop() {
    let amounts = vec![(addr(2), 300u128), (addr(1), 700)];
    let corrected = apply_dust_correction(amounts.clone(), 1_000, 10).unwrap();
    assert_eq!(corrected, amounts);
}

#[test]
fn test_dust_overflow_rejected() {
    let amounts = vec![(addr(1), 500u128), (addr(2), 480)];
    let err = apply_dust_correction(amounts, 1_000, 10).unwrap_err();
    assert_eq!(
        err,
        AllocationError::DustOverflow {
            remainder: 20,
            threshold: 10
        }
    );
}

#[test]
fn test_negative_remainder_rejected() {
    let amounts = vec![(addr(1), 600u128), (addr(2), 500)];
    let err = apply_dust_correction(amounts, 1_000, 10).unwrap_err();
    assert_eq!(
        err,
        AllocationError::NegativeRemainder {
            sum: 1_100,
            target: 1_000
        }
    );
}

#[test]
fn test_convert_by_rate_floor() {
    let bounds = RateBounds {
        rate_cap: 10u128.pow(18),
        total_cap: u128::MAX,
    };
    // rate 0.25 at 18 decimals
    let entries = [(addr(1), 1_001u128), (addr(2), 4u128)];
    let converted = convert_by_rate(&entries, 25 * 10u128.pow(16), 18, bounds).unwrap();
    assert_eq!(converted, vec![(addr(1), 250), (addr(2), 1)]);
}

#[test]
fn test_convert_by_rate_rejects_out_of_bounds_rate() {
    let bounds = RateBounds {
        rate_cap: 10u128.pow(18),
        total_cap: u128::MAX,
    };
    let entries = [(addr(1), 100u128)];
    assert!(matches!(
        convert_by_rate(&entries, 0, 18, bounds),
        Err(AllocationError::OracleSanity(_))
    ));
    assert!(matches!(
        convert_by_rate(&entries, 10u128.pow(18), 18, bounds),
        Err(AllocationError::OracleSanity(_))
    ));
}

#[test]
fn test_convert_by_rate_rejects_total_above_cap() {
    let bounds = RateBounds {
        rate_cap: 10u128.pow(18),
        total_cap: 100,
    };
    let entries = [(addr(1), 1_000u128)];
    assert!(matches!(
        convert_by_rate(&entries, 5 * 10u128.pow(17), 18, bounds),
        Err(AllocationError::OracleSanity(_))
    ));
}

proptest! {
    /// Floor division loses strictly less than one unit per entry, so a
    /// proportional split followed by dust correction always hits the pool
    /// total exactly when the threshold exceeds the entry count.
    #[test]
    fn prop_proportional_split_sums_to_pool(
        pool in 1u128..10u128.pow(24),
        raw_losses in prop::collection::vec(1i128..10i128.pow(12), 1..40),
    ) {
        let losses: Vec<(Address, i128)> = raw_losses
            .iter()
            .enumerate()
            .map(|(i, loss)| (addr(i as u8 + 1), *loss))
            .collect();
        let splits = split_by_proportion(pool, &losses).unwrap();
        let sum: u128 = splits.iter().map(|(_, amount)| amount).sum();
        prop_assert!(sum <= pool);
        prop_assert!(pool - sum < losses.len() as u128);

        let corrected = apply_dust_correction(splits, pool, losses.len() as u128 + 1).unwrap();
        let total: u128 = corrected.iter().map(|(_, amount)| amount).sum();
        prop_assert_eq!(total, pool);
    }

    /// Any basis-point partition of 10_000 splits a pool into amounts that
    /// fall short of it by less than the number of entries.
    #[test]
    fn prop_ratio_split_remainder_is_bounded(
        pool in 1u128..10u128.pow(26),
        mut cuts in prop::collection::vec(0u64..BASIS_POINTS, 1..8),
    ) {
        cuts.sort_unstable();
        cuts.push(BASIS_POINTS);
        let mut prev = 0u64;
        let mut ratios = Vec::new();
        for (i, cut) in cuts.iter().enumerate() {
            ratios.push((addr(i as u8 + 1), cut - prev));
            prev = *cut;
        }

        let splits = split_by_ratio(pool, &ratios, BASIS_POINTS).unwrap();
        let sum: u128 = splits.iter().map(|(_, amount)| amount).sum();
        prop_assert!(sum <= pool);
        prop_assert!(pool - sum < ratios.len() as u128);
    }
}
