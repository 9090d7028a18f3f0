//! Distribution assembly: index assignment, leaf encoding, tree build,
//! and proof collection.

use merkledrop_core::{hex_prefixed, Address};
use merkledrop_tree::{verify_proof, MerkleTree};
use tracing::info;

use crate::claims::{encode_leaf, Claim, Distribution};
use crate::{DistributionError, Result};

/// Build a distribution over final wallet amounts.
///
/// Re-checks the allocation invariant, assigns dense indices by sorting
/// descending on amount (stable on input order), packs and hashes the
/// claim leaves, and collects every wallet's inclusion proof. Returns the
/// fully assembled document; nothing is persisted here.
pub fn build(target_total: u128, amounts: Vec<(Address, u128)>) -> Result<Distribution> {
    let actual: u128 = amounts.iter().map(|(_, amount)| amount).sum();
    if actual != target_total {
        return Err(DistributionError::TotalMismatch {
            expected: target_total,
            actual,
        });
    }

    let mut ordered = amounts;
    ordered.sort_by(|a, b| b.1.cmp(&a.1));

    let encodings: Vec<[u8; crate::claims::LEAF_LEN]> = ordered
        .iter()
        .enumerate()
        .map(|(index, (address, amount))| encode_leaf(address, index as u64, *amount))
        .collect();

    let tree = MerkleTree::build(&encodings)?;

    let mut claims = Vec::with_capacity(ordered.len());
    for (index, (address, amount)) in ordered.iter().enumerate() {
        let proof = tree.proof(encodings[index])?;
        claims.push((
            *address,
            Claim {
                index: index as u64,
                amount: *amount,
                proof,
            },
        ));
    }

    info!(
        merkle_root = %hex_prefixed(&tree.root()),
        claims = claims.len(),
        token_total = target_total,
        "distribution built"
    );
    Ok(Distribution {
        merkle_root: tree.root(),
        token_total: target_total,
        claims,
    })
}

/// Re-check a finished document: the claim amounts must sum to the stated
/// total and every claim's proof must walk back to the stored root.
pub fn verify_distribution(distribution: &Distribution) -> Result<()> {
    let total: u128 = distribution
        .claims
        .iter()
        .map(|(_, claim)| claim.amount)
        .sum();
    if total != distribution.token_total {
        return Err(DistributionError::TotalMismatch {
            expected: distribution.token_total,
            actual: total,
        });
    }

    for (address, claim) in &distribution.claims {
        let leaf = encode_leaf(address, claim.index, claim.amount);
        if !verify_proof(&distribution.merkle_root, leaf, &claim.proof) {
            return Err(DistributionError::InvalidProof(address.to_checksum()));
        }
    }
    Ok(())
}
