//! DKG session coordination.
//!
//! One session per selected quorum: `Pending → CollectingContributions →
//! {Committed | Failed}`. Members get a bounded number of blocks to deliver
//! a contribution; whatever arrived by the deadline is judged, late shares
//! are dropped. A member that never delivered a valid contribution is a bad
//! member — the coordinator cannot (and does not try to) distinguish a
//! disconnected member from one withholding its share.
//!
//! The key-generation mathematics live behind [`ContributionVerifier`];
//! this module owns only the round structure and bad-member accounting.

use crate::error::QuorumError;
use crate::quorum::{FinalCommitment, QuorumId};
use pylon_types::{blake2b_256_multi, CommitmentHash, MasternodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Session lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DkgState {
    /// Created, contribution window not yet open.
    Pending,
    /// Window open, accepting member contributions.
    CollectingContributions,
    /// Enough valid contributors; the commitment is final. Terminal.
    Committed,
    /// Too few valid contributors by the deadline. Terminal.
    Failed,
}

/// An opaque key-share contribution from one member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    /// Commitment to the member's share of the verification vector.
    pub share_commitment: [u8; 32],
}

/// Cross-validates a member's contribution against the scheme's rules.
/// The cryptography is assumed correct and pluggable; the coordinator only
/// consumes the verdict.
pub trait ContributionVerifier {
    fn verify(&self, member: &MasternodeId, contribution: &Contribution) -> bool;
}

/// Verifier that accepts any well-formed contribution. Used where the
/// underlying scheme is validated out-of-band, and in tests.
pub struct AcceptAllVerifier;

impl ContributionVerifier for AcceptAllVerifier {
    fn verify(&self, _member: &MasternodeId, _contribution: &Contribution) -> bool {
        true
    }
}

/// Result of finalizing a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DkgOutcome {
    pub state: DkgState,
    /// Present only when the session committed.
    pub commitment: Option<FinalCommitment>,
    /// Members without a valid contribution by the deadline.
    pub bad_members: Vec<MasternodeId>,
}

/// A single quorum's DKG round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DkgSession {
    quorum: QuorumId,
    members: Vec<MasternodeId>,
    state: DkgState,
    window_blocks: u64,
    min_contributors: usize,
    started_height: u64,
    contributions: BTreeMap<MasternodeId, Contribution>,
}

impl DkgSession {
    /// Create the session in `Pending` for an already-selected member list.
    pub fn new(
        quorum: QuorumId,
        members: Vec<MasternodeId>,
        window_blocks: u64,
        min_contributors: usize,
    ) -> Self {
        Self {
            quorum,
            members,
            state: DkgState::Pending,
            window_blocks,
            min_contributors,
            started_height: 0,
            contributions: BTreeMap::new(),
        }
    }

    pub fn quorum(&self) -> QuorumId {
        self.quorum
    }

    pub fn state(&self) -> DkgState {
        self.state
    }

    pub fn members(&self) -> &[MasternodeId] {
        &self.members
    }

    /// Last height at which contributions are accepted.
    pub fn deadline(&self) -> u64 {
        self.started_height + self.window_blocks
    }

    /// Open the contribution window at `height`.
    pub fn begin(&mut self, height: u64) -> Result<(), QuorumError> {
        if self.state != DkgState::Pending {
            return Err(QuorumError::WrongState);
        }
        self.started_height = height;
        self.state = DkgState::CollectingContributions;
        debug!(quorum = ?self.quorum, height, deadline = self.deadline(), "DKG window opened");
        Ok(())
    }

    /// Record a member's contribution, received at `height`.
    ///
    /// Late contributions are dropped with `WindowClosed` — no backdating.
    /// A member may resubmit inside the window; the last contribution counts.
    pub fn contribute(
        &mut self,
        member: MasternodeId,
        contribution: Contribution,
        height: u64,
    ) -> Result<(), QuorumError> {
        if self.state != DkgState::CollectingContributions {
            return Err(QuorumError::WrongState);
        }
        if !self.members.contains(&member) {
            return Err(QuorumError::NotAMember(member));
        }
        if height > self.deadline() {
            return Err(QuorumError::WindowClosed {
                deadline: self.deadline(),
                height,
            });
        }
        self.contributions.insert(member, contribution);
        Ok(())
    }

    /// Whether the session can be judged at `height`: the window elapsed, or
    /// every member already contributed.
    pub fn ready_to_finalize(&self, height: u64) -> bool {
        self.state == DkgState::CollectingContributions
            && (height > self.deadline() || self.contributions.len() == self.members.len())
    }

    /// Judge the session on whatever contributions arrived.
    ///
    /// Members without a contribution that passes `verifier` are bad
    /// members. With at least `min_contributors` valid members the session
    /// commits anyway; otherwise it fails. Both are expected branches of the
    /// state machine, reported as status, not as errors.
    pub fn finalize<V: ContributionVerifier>(
        &mut self,
        verifier: &V,
    ) -> Result<DkgOutcome, QuorumError> {
        if self.state != DkgState::CollectingContributions {
            return Err(QuorumError::WrongState);
        }

        let mut valid_members = Vec::new();
        let mut bad_members = Vec::new();
        for member in &self.members {
            let valid = self
                .contributions
                .get(member)
                .is_some_and(|c| verifier.verify(member, c));
            if valid {
                valid_members.push(*member);
            } else {
                bad_members.push(*member);
            }
        }

        if valid_members.len() >= self.min_contributors {
            self.state = DkgState::Committed;
            let commitment = FinalCommitment {
                quorum: self.quorum,
                commitment: self.commitment_hash(&valid_members),
                members: self.members.clone(),
                bad_members: bad_members.clone(),
            };
            info!(
                quorum = ?self.quorum,
                valid = valid_members.len(),
                bad = bad_members.len(),
                "DKG session committed"
            );
            Ok(DkgOutcome {
                state: DkgState::Committed,
                commitment: Some(commitment),
                bad_members,
            })
        } else {
            self.state = DkgState::Failed;
            warn!(
                quorum = ?self.quorum,
                valid = valid_members.len(),
                need = self.min_contributors,
                "DKG session failed"
            );
            Ok(DkgOutcome {
                state: DkgState::Failed,
                commitment: None,
                bad_members,
            })
        }
    }

    /// Hash committing to the round: quorum id, the valid-member bitmap over
    /// the selection order, and each valid member's contribution.
    fn commitment_hash(&self, valid_members: &[MasternodeId]) -> CommitmentHash {
        let mut bitmap = vec![0u8; (self.members.len() + 7) / 8];
        for (i, member) in self.members.iter().enumerate() {
            if valid_members.contains(member) {
                bitmap[i / 8] |= 1 << (i % 8);
            }
        }

        let mut parts: Vec<&[u8]> = Vec::with_capacity(3 + valid_members.len() * 2);
        let height_bytes = self.quorum.height.to_le_bytes();
        let index_bytes = self.quorum.index.to_le_bytes();
        parts.push(&height_bytes);
        parts.push(&index_bytes);
        parts.push(&bitmap);
        for member in valid_members {
            parts.push(member.as_bytes());
            parts.push(&self.contributions[member].share_commitment);
        }
        CommitmentHash::new(blake2b_256_multi(&parts))
    }
}
