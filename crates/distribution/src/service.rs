//! Per-category orchestration over the allocation math and the builder.

use merkledrop_core::Category;
use tracing::{info, warn};

use merkledrop_allocation::{
    apply_dust_correction, convert_by_rate, pool_allocations, split_by_proportion, split_by_ratio,
    Allocations, RateBounds, BASIS_POINTS, TOKEN_DECIMALS,
};

use crate::builder;
use crate::claims::Distribution;
use crate::config::DistributionConfig;
use crate::sources;
use crate::{DistributionError, Result};

/// Orchestrates the three category builds: loads each source document,
/// runs the category's allocation math against its bucket, and hands the
/// final amounts to the builder. Owns the run configuration and the
/// bucket table; no state is shared between category builds.
pub struct DistributionService {
    config: DistributionConfig,
    allocations: Allocations,
}

impl DistributionService {
    /// Validates the protocol ratio table up front; a bad table never
    /// reaches any category build.
    pub fn new(config: DistributionConfig) -> Result<Self> {
        let allocations = pool_allocations()?;
        Ok(Self {
            config,
            allocations,
        })
    }

    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    pub fn allocations(&self) -> &Allocations {
        &self.allocations
    }

    /// Team distribution: basis-point shares that must sum to 10_000,
    /// applied to the TEAM bucket.
    pub fn build_team(&self) -> Result<Distribution> {
        let bucket = self.allocations.get(Category::Team);
        let splits = sources::load_team_splits(&self.config.team_splits_path())?;
        info!(wallets = splits.len(), bucket, "building team distribution");

        let amounts = split_by_ratio(bucket, &splits, BASIS_POINTS)?;
        let amounts = apply_dust_correction(amounts, bucket, self.config.dust_threshold)?;
        builder::build(bucket, amounts)
    }

    /// Victims distribution: the VICTIMS bucket split proportionally to
    /// final losses; wallets with no remaining loss get no claim.
    pub fn build_victims(&self) -> Result<Distribution> {
        let bucket = self.allocations.get(Category::Victims);
        let losses = sources::load_victim_data(&self.config.victim_data_path())?;
        info!(wallets = losses.len(), bucket, "building victims distribution");

        let amounts = split_by_proportion(bucket, &losses)?;
        let amounts = apply_dust_correction(amounts, bucket, self.config.dust_threshold)?;
        builder::build(bucket, amounts)
    }

    /// Penalty redemption distribution: raw penalties converted at the
    /// configured oracle rate. Refuses to build until the collection run
    /// reports completion past the eligibility window close.
    pub fn build_penalty(&self) -> Result<Distribution> {
        let source = sources::load_penalty_data(&self.config.penalty_data_path())?;
        if source.last_run <= self.config.penalty_window_close {
            warn!(
                last_run = source.last_run,
                window_close = self.config.penalty_window_close,
                "penalty collection has not closed its eligibility window"
            );
            return Err(DistributionError::WindowNotClosed {
                last_run: source.last_run,
                window_close: self.config.penalty_window_close,
            });
        }

        let redemptions_bucket = self.allocations.get(Category::Redemptions);
        let bounds = RateBounds {
            rate_cap: self.config.redemption_rate_cap,
            total_cap: redemptions_bucket * self.config.penalty_total_cap_bps as u128
                / BASIS_POINTS as u128,
        };
        info!(
            wallets = source.penalties.len(),
            rate = self.config.redemption_rate,
            "building penalty distribution"
        );

        let amounts = convert_by_rate(
            &source.penalties,
            self.config.redemption_rate,
            TOKEN_DECIMALS,
            bounds,
        )?;
        let total: u128 = amounts.iter().map(|(_, amount)| amount).sum();
        builder::build(total, amounts)
    }

    /// Build every category. Fails on the first category that fails;
    /// nothing written by the caller should survive a partial run.
    pub fn build_all(&self) -> Result<Vec<(Category, Distribution)>> {
        Ok(vec![
            (Category::Team, self.build_team()?),
            (Category::Victims, self.build_victims()?),
            (Category::Redemptions, self.build_penalty()?),
        ])
    }
}
