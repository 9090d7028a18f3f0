//! Distribution run configuration.

use std::path::{Path, PathBuf};

use merkledrop_core::Category;
use serde::{Deserialize, Serialize};

use merkledrop_allocation::DUST_THRESHOLD;

/// Configuration for a distribution run: directory layout, the penalty
/// eligibility window, and the oracle rate with its sanity bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionConfig {
    /// Root of the data directory (sources under `sources/`, artifacts
    /// under `merkle/`).
    pub data_dir: PathBuf,
    /// Unix timestamp after which the penalty eligibility window is
    /// closed; penalty builds require `last_run` strictly past this.
    pub penalty_window_close: i64,
    /// Penalty-to-token redemption rate as an 18-decimal fixed-point
    /// numerator. Zero (the default) fails the oracle sanity check, so a
    /// penalty build cannot run unconfigured.
    pub redemption_rate: u128,
    /// Exclusive upper bound for the redemption rate (default 10^18,
    /// i.e. the rate must be below 1.0).
    pub redemption_rate_cap: u128,
    /// The converted penalty total must stay under this fraction of the
    /// REDEMPTIONS bucket, in basis points.
    pub penalty_total_cap_bps: u64,
    /// Maximum remainder eligible for dust correction, in smallest units.
    pub dust_threshold: u128,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            penalty_window_close: 0,
            redemption_rate: 0,
            redemption_rate_cap: 10u128.pow(18),
            penalty_total_cap_bps: 5_000,
            dust_threshold: DUST_THRESHOLD,
        }
    }
}

impl DistributionConfig {
    pub fn sources_dir(&self) -> PathBuf {
        self.data_dir.join("sources")
    }

    pub fn merkle_dir(&self) -> PathBuf {
        self.data_dir.join("merkle")
    }

    pub fn team_splits_path(&self) -> PathBuf {
        self.sources_dir().join("team_splits.json")
    }

    pub fn victim_data_path(&self) -> PathBuf {
        self.sources_dir().join("victim_data.json")
    }

    pub fn penalty_data_path(&self) -> PathBuf {
        self.sources_dir().join("penalty_data.json")
    }

    /// Artifact path for one category's claim document.
    pub fn merkle_output_path(&self, category: Category) -> PathBuf {
        self.merkle_dir()
            .join(format!("merkle_data_{}.json", category.file_tag()))
    }

    pub fn with_data_dir(mut self, data_dir: &Path) -> Self {
        self.data_dir = data_dir.to_path_buf();
        self
    }
}
