//! Finalization vote tracking.
//!
//! Competing finalization candidates for the same superblock collect votes
//! from legacy and deterministic masternodes, one unit per identity. The
//! first candidate to reach the quorum threshold becomes canonical for its
//! superblock, permanently; later competitors are rejected even if they
//! would eventually gather the raw weight.

use crate::error::BudgetError;
use crate::finalization::FinalizationTx;
use pylon_masternodes::RosterSnapshot;
use pylon_types::{FinalizationHash, MasternodeId, ProtocolParams, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Whether a finalization has reached quorum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    /// Quorum reached; this candidate is (or just became) canonical.
    Ok,
    /// Still collecting votes.
    Pending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct FinalizationVote {
    voter: MasternodeId,
    /// Legacy masternode vote (vs. deterministic). Both count one unit;
    /// kept for diagnostics and query output.
    legacy: bool,
    timestamp: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Candidate {
    tx: FinalizationTx,
    votes: BTreeMap<MasternodeId, FinalizationVote>,
}

/// Tracks every known finalization candidate and the per-superblock decision.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FinalizationVoteTracker {
    candidates: BTreeMap<FinalizationHash, Candidate>,
    /// block_start → the canonical finalization, once quorum was reached.
    decided: BTreeMap<u64, FinalizationHash>,
    quorum_bps: u32,
}

impl FinalizationVoteTracker {
    pub fn new(params: &ProtocolParams) -> Self {
        Self {
            candidates: BTreeMap::new(),
            decided: BTreeMap::new(),
            quorum_bps: params.finalization_quorum_bps,
        }
    }

    /// Make a candidate known (suggested locally or received from a peer).
    /// Re-registering the same candidate is a no-op.
    pub fn register(&mut self, tx: FinalizationTx) {
        self.candidates.entry(tx.hash).or_insert_with(|| {
            debug!(finalization = %tx.hash, block_start = tx.block_start, "finalization candidate registered");
            Candidate {
                tx,
                votes: BTreeMap::new(),
            }
        });
    }

    /// Record a finalization vote and report the candidate's sync state.
    pub fn vote(
        &mut self,
        roster: &RosterSnapshot,
        voter: MasternodeId,
        fin_hash: FinalizationHash,
        legacy: bool,
        timestamp: Timestamp,
    ) -> Result<SyncStatus, BudgetError> {
        let candidate = self
            .candidates
            .get_mut(&fin_hash)
            .ok_or(BudgetError::UnknownFinalization(fin_hash))?;

        if !roster.is_votable(&voter) {
            return Err(BudgetError::UnknownVoter(voter));
        }

        let block_start = candidate.tx.block_start;
        if let Some(winner) = self.decided.get(&block_start) {
            if *winner != fin_hash {
                return Err(BudgetError::FinalizationAlreadyDecided { block_start });
            }
        }

        match candidate.votes.get(&voter) {
            Some(existing) if timestamp <= existing.timestamp => {
                return Err(BudgetError::StaleVote);
            }
            _ => {}
        }
        candidate.votes.insert(
            voter,
            FinalizationVote {
                voter,
                legacy,
                timestamp,
            },
        );

        let status = self.resolve(roster, fin_hash);
        Ok(status)
    }

    /// Current sync state of a candidate.
    pub fn sync_state(
        &self,
        roster: &RosterSnapshot,
        fin_hash: &FinalizationHash,
    ) -> Result<SyncStatus, BudgetError> {
        let candidate = self
            .candidates
            .get(fin_hash)
            .ok_or(BudgetError::UnknownFinalization(*fin_hash))?;

        // A decided superblock is settled: the winner reports Ok and every
        // competitor stays Pending no matter what raw weight it holds.
        if let Some(winner) = self.decided.get(&candidate.tx.block_start) {
            return Ok(if winner == fin_hash {
                SyncStatus::Ok
            } else {
                SyncStatus::Pending
            });
        }
        if self.live_weight(roster, candidate) >= self.threshold(roster) {
            Ok(SyncStatus::Ok)
        } else {
            Ok(SyncStatus::Pending)
        }
    }

    /// Live votes on a candidate (votable identities only).
    pub fn vote_weight(&self, roster: &RosterSnapshot, fin_hash: &FinalizationHash) -> usize {
        self.candidates
            .get(fin_hash)
            .map_or(0, |c| self.live_weight(roster, c))
    }

    /// The canonical finalization for a superblock, if decided.
    pub fn decided_for(&self, block_start: u64) -> Option<&FinalizationTx> {
        let hash = self.decided.get(&block_start)?;
        self.candidates.get(hash).map(|c| &c.tx)
    }

    /// Consume the decided finalization at superblock creation: returns it
    /// exactly once and discards every candidate for that height.
    pub fn consume(&mut self, block_start: u64) -> Option<FinalizationTx> {
        let hash = self.decided.get(&block_start).copied()?;
        let winner = self.candidates.remove(&hash).map(|c| c.tx);
        self.candidates.retain(|_, c| c.tx.block_start != block_start);
        winner
    }

    fn threshold(&self, roster: &RosterSnapshot) -> usize {
        let weighted = roster.votable_count() * self.quorum_bps as usize / 10_000;
        weighted.max(1)
    }

    fn live_weight(&self, roster: &RosterSnapshot, candidate: &Candidate) -> usize {
        candidate
            .votes
            .values()
            .filter(|v| roster.is_votable(&v.voter))
            .count()
    }

    /// Check quorum after a vote; the first candidate over the line is
    /// recorded as the decision for its superblock.
    fn resolve(&mut self, roster: &RosterSnapshot, fin_hash: FinalizationHash) -> SyncStatus {
        let candidate = &self.candidates[&fin_hash];
        let block_start = candidate.tx.block_start;

        if let Some(winner) = self.decided.get(&block_start) {
            return if *winner == fin_hash {
                SyncStatus::Ok
            } else {
                SyncStatus::Pending
            };
        }
        if self.live_weight(roster, candidate) >= self.threshold(roster) {
            info!(
                finalization = %fin_hash,
                block_start,
                "finalization reached quorum"
            );
            self.decided.insert(block_start, fin_hash);
            SyncStatus::Ok
        } else {
            SyncStatus::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::BudgetPayment;
    use pylon_masternodes::MasternodeRoster;
    use pylon_types::{Amount, PaymentAddress, ProposalHash, RegistrationKind};

    fn mn(byte: u8) -> MasternodeId {
        MasternodeId::from_bytes([byte; 32])
    }

    fn ts(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    fn fin(block_start: u64, tag: u8) -> FinalizationTx {
        FinalizationTx::new(
            block_start,
            vec![BudgetPayment {
                proposal: ProposalHash::new([tag; 32]),
                address: PaymentAddress::new("pyl_payee"),
                amount: Amount::from_coins(11),
            }],
        )
    }

    /// Roster large enough that one vote is below the 5% quorum.
    fn roster(count: u8) -> MasternodeRoster {
        let mut roster = MasternodeRoster::new();
        for i in 1..=count {
            roster.register(mn(i), RegistrationKind::Deterministic).unwrap();
        }
        roster
    }

    fn tracker() -> FinalizationVoteTracker {
        FinalizationVoteTracker::new(&ProtocolParams::regtest())
    }

    #[test]
    fn vote_on_unknown_finalization_errors() {
        let mut t = tracker();
        let snap = roster(3).snapshot();
        let missing = FinalizationHash::new([9u8; 32]);
        assert_eq!(
            t.vote(&snap, mn(1), missing, true, ts(100)),
            Err(BudgetError::UnknownFinalization(missing))
        );
    }

    #[test]
    fn small_roster_reaches_quorum_on_first_vote() {
        // 3 votable, 5% → threshold floors to 1.
        let mut t = tracker();
        let snap = roster(3).snapshot();
        let f = fin(20, 1);
        let hash = f.hash;
        t.register(f);

        assert_eq!(t.sync_state(&snap, &hash).unwrap(), SyncStatus::Pending);
        let status = t.vote(&snap, mn(1), hash, true, ts(100)).unwrap();
        assert_eq!(status, SyncStatus::Ok);
        assert_eq!(t.decided_for(20).unwrap().hash, hash);
    }

    #[test]
    fn large_roster_needs_more_votes() {
        // 60 votable, 5% → threshold 3.
        let mut t = tracker();
        let snap = roster(60).snapshot();
        let f = fin(20, 1);
        let hash = f.hash;
        t.register(f);

        assert_eq!(t.vote(&snap, mn(1), hash, true, ts(100)).unwrap(), SyncStatus::Pending);
        assert_eq!(t.vote(&snap, mn(2), hash, true, ts(100)).unwrap(), SyncStatus::Pending);
        assert_eq!(t.vote(&snap, mn(3), hash, false, ts(100)).unwrap(), SyncStatus::Ok);
        assert_eq!(t.vote_weight(&snap, &hash), 3);
    }

    #[test]
    fn legacy_and_dmn_votes_count_equally() {
        let mut t = tracker();
        let snap = roster(60).snapshot();
        let f = fin(20, 1);
        let hash = f.hash;
        t.register(f);

        t.vote(&snap, mn(1), hash, true, ts(100)).unwrap();
        t.vote(&snap, mn(2), hash, false, ts(100)).unwrap();
        assert_eq!(t.vote_weight(&snap, &hash), 2);
    }

    #[test]
    fn duplicate_vote_same_timestamp_is_stale() {
        let mut t = tracker();
        let snap = roster(60).snapshot();
        let f = fin(20, 1);
        let hash = f.hash;
        t.register(f);

        t.vote(&snap, mn(1), hash, true, ts(100)).unwrap();
        assert_eq!(
            t.vote(&snap, mn(1), hash, true, ts(100)),
            Err(BudgetError::StaleVote)
        );
        // strictly newer re-vote is allowed and does not double-count
        t.vote(&snap, mn(1), hash, true, ts(101)).unwrap();
        assert_eq!(t.vote_weight(&snap, &hash), 1);
    }

    #[test]
    fn first_to_quorum_wins_competitor_rejected() {
        let mut t = tracker();
        let snap = roster(3).snapshot();
        let a = fin(20, 1);
        let b = fin(20, 2);
        let (ha, hb) = (a.hash, b.hash);
        t.register(a);
        t.register(b);

        assert_eq!(t.vote(&snap, mn(1), ha, true, ts(100)).unwrap(), SyncStatus::Ok);

        // The loser is rejected even with raw weight available for it.
        assert_eq!(
            t.vote(&snap, mn(2), hb, true, ts(101)),
            Err(BudgetError::FinalizationAlreadyDecided { block_start: 20 })
        );
        assert_eq!(
            t.vote(&snap, mn(3), hb, false, ts(102)),
            Err(BudgetError::FinalizationAlreadyDecided { block_start: 20 })
        );
        assert_eq!(t.decided_for(20).unwrap().hash, ha);
    }

    #[test]
    fn loser_never_reports_quorum_after_decision() {
        // 60 votable → threshold 3.
        let mut t = tracker();
        let mut roster = roster(60);
        let a = fin(20, 1);
        let b = fin(20, 2);
        let (ha, hb) = (a.hash, b.hash);
        t.register(a);
        t.register(b);

        let snap = roster.snapshot();
        t.vote(&snap, mn(1), hb, true, ts(100)).unwrap();
        t.vote(&snap, mn(2), hb, true, ts(100)).unwrap();
        for v in 3..=5 {
            t.vote(&snap, mn(v), ha, true, ts(100)).unwrap();
        }
        assert_eq!(t.decided_for(20).unwrap().hash, ha);

        // Shrinking the roster drops the threshold to 1, below the loser's
        // surviving raw weight. The decision must still stand.
        for v in 21..=60 {
            roster.set_enabled(&mn(v), false).unwrap();
        }
        let snap = roster.snapshot();
        assert!(t.vote_weight(&snap, &hb) >= 1);
        assert_eq!(t.sync_state(&snap, &hb).unwrap(), SyncStatus::Pending);
        assert_eq!(t.sync_state(&snap, &ha).unwrap(), SyncStatus::Ok);
    }

    #[test]
    fn decision_is_per_superblock() {
        let mut t = tracker();
        let snap = roster(3).snapshot();
        let a = fin(20, 1);
        let b = fin(40, 2);
        let (ha, hb) = (a.hash, b.hash);
        t.register(a);
        t.register(b);

        t.vote(&snap, mn(1), ha, true, ts(100)).unwrap();
        // a decision at 20 does not block the cycle at 40
        assert_eq!(t.vote(&snap, mn(1), hb, true, ts(101)).unwrap(), SyncStatus::Ok);
    }

    #[test]
    fn consume_returns_winner_exactly_once() {
        let mut t = tracker();
        let snap = roster(3).snapshot();
        let a = fin(20, 1);
        let b = fin(20, 2);
        let ha = a.hash;
        t.register(a);
        t.register(b);
        t.vote(&snap, mn(1), ha, true, ts(100)).unwrap();

        let consumed = t.consume(20).unwrap();
        assert_eq!(consumed.hash, ha);
        // discarded after consumption, competitors included
        assert!(t.consume(20).is_none());
        assert_eq!(
            t.sync_state(&snap, &ha),
            Err(BudgetError::UnknownFinalization(ha))
        );
    }

    #[test]
    fn consume_undecided_returns_none() {
        let mut t = tracker();
        let f = fin(20, 1);
        t.register(f);
        assert!(t.consume(20).is_none());
    }
}
