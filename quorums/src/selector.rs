//! Deterministic quorum selection.
//!
//! The signer set for a cycle is a pure function of (quorum id, the block
//! hash at the cycle height, the votable roster snapshot at that height).
//! Each candidate is scored by hashing the seed with its identity; the
//! lowest scores win. No randomness is sourced outside the chain, so every
//! correctly-functioning node derives the same ordered member list.

use crate::error::QuorumError;
use crate::quorum::QuorumId;
use pylon_masternodes::RosterSnapshot;
use pylon_types::{blake2b_256_multi, BlockHash, MasternodeId, ProtocolParams};

/// Derive the ordered member list for `quorum`.
///
/// `params.quorum_size` is an upper bound, not a requirement: a votable
/// roster smaller than the target size still seats a quorum with every
/// votable member, so quorum formation survives roster shrinkage (bans,
/// outages) down to the DKG contributor floor. Fails with
/// `SelectionFailure` only below that floor.
pub fn select_quorum(
    quorum: QuorumId,
    seed_block: BlockHash,
    roster: &RosterSnapshot,
    params: &ProtocolParams,
) -> Result<Vec<MasternodeId>, QuorumError> {
    if roster.votable_count() < params.dkg_min_contributors {
        return Err(QuorumError::SelectionFailure {
            have: roster.votable_count(),
            need: params.dkg_min_contributors,
        });
    }

    let mut scored: Vec<([u8; 32], MasternodeId)> = roster
        .iter()
        .map(|id| {
            let score = blake2b_256_multi(&[
                seed_block.as_bytes(),
                &quorum.height.to_le_bytes(),
                &quorum.index.to_le_bytes(),
                id.as_bytes(),
            ]);
            (score, *id)
        })
        .collect();

    // Tie on score is impossible in practice, but the id keeps the order
    // total regardless.
    scored.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    Ok(scored
        .into_iter()
        .take(params.quorum_size)
        .map(|(_, id)| id)
        .collect())
}
