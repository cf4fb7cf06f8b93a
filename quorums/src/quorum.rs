//! Quorum identity and resolved-quorum history.

use pylon_types::{CommitmentHash, MasternodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity of a quorum: the cycle height it was formed at plus an index,
/// for networks running several quorums per cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuorumId {
    pub height: u64,
    pub index: u32,
}

impl QuorumId {
    pub fn new(height: u64, index: u32) -> Self {
        Self { height, index }
    }
}

/// A committed DKG round: the quorum key commitment plus who failed to
/// contribute. Immutable history once mined.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalCommitment {
    pub quorum: QuorumId,
    pub commitment: CommitmentHash,
    /// The full selected member list, in selection order.
    pub members: Vec<MasternodeId>,
    /// Members that failed to deliver a valid contribution.
    pub bad_members: Vec<MasternodeId>,
}

/// Resolved quorums, keyed by identity. Insert-only.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QuorumHistory {
    resolved: BTreeMap<QuorumId, FinalCommitment>,
}

impl QuorumHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mined commitment. A replayed identical commitment is a no-op;
    /// history is never overwritten.
    pub fn record(&mut self, commitment: FinalCommitment) {
        self.resolved.entry(commitment.quorum).or_insert(commitment);
    }

    pub fn get(&self, id: &QuorumId) -> Option<&FinalCommitment> {
        self.resolved.get(id)
    }

    /// The most recently formed quorum, if any.
    pub fn latest(&self) -> Option<&FinalCommitment> {
        self.resolved.values().next_back()
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}
