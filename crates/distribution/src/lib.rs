//! Merkledrop Distribution
//!
//! Glue between the allocation math and the Merkle tree: loads source
//! documents, assigns claim indices, encodes leaves, and assembles the
//! final claim document consumed by the on-chain verifier. Nothing is
//! persisted here; a distribution either passes every invariant and is
//! returned whole, or the category build aborts.

use std::path::PathBuf;

use thiserror::Error;

use merkledrop_allocation::AllocationError;
use merkledrop_tree::TreeError;

pub mod builder;
pub mod claims;
pub mod config;
pub mod service;
pub mod sources;


pub use builder::{build, verify_distribution};
pub use claims::{encode_leaf, Claim, Distribution, LEAF_LEN};
pub use config::DistributionConfig;
pub use service::DistributionService;

#[derive(Error, Debug)]
pub enum DistributionError {
    #[error("Source document not found: {0}")]
    MissingInput(PathBuf),
    #[error("Malformed source document {path}: {reason}")]
    MalformedInput { path: PathBuf, reason: String },
    #[error("Duplicate wallet in source document: {0}")]
    DuplicateWallet(String),
    #[error("Penalty collection last ran at {last_run}, eligibility window closes at {window_close}")]
    WindowNotClosed { last_run: i64, window_close: i64 },
    #[error("Amounts sum to {actual}, expected category target {expected}")]
    TotalMismatch { expected: u128, actual: u128 },
    #[error("Claim proof for {0} does not verify against the root")]
    InvalidProof(String),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

pub type Result<T> = std::result::Result<T, DistributionError>;
