//! Per-masternode proposal votes.
//!
//! One live vote per (voter, proposal); a newer vote from the same voter
//! replaces the prior one (last-writer-wins by signature timestamp).
//! Votes from deactivated masternodes are soft-excluded from the tally
//! without being deleted, so reactivation restores them automatically.

use crate::error::BudgetError;
use crate::ledger::ProposalLedger;
use pylon_masternodes::RosterSnapshot;
use pylon_types::{MasternodeId, ProposalHash, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteDirection {
    Yes,
    No,
    Abstain,
}

/// A single masternode's latest vote on a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetVote {
    pub voter: MasternodeId,
    pub direction: VoteDirection,
    pub timestamp: Timestamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// First vote from this voter on this proposal.
    Recorded,
    /// Replaced the voter's earlier vote.
    Replaced,
}

/// All proposal votes, keyed by proposal then voter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VoteTally {
    votes: BTreeMap<ProposalHash, BTreeMap<MasternodeId, BudgetVote>>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vote.
    ///
    /// Fails with `UnknownProposal` if the ledger has no such proposal,
    /// `UnknownVoter` if the voter is not votable in the roster snapshot,
    /// and `StaleVote` if the timestamp is not strictly newer than the
    /// voter's existing vote on this proposal (replay protection).
    pub fn cast_vote(
        &mut self,
        ledger: &ProposalLedger,
        roster: &RosterSnapshot,
        voter: MasternodeId,
        proposal: ProposalHash,
        direction: VoteDirection,
        timestamp: Timestamp,
    ) -> Result<VoteOutcome, BudgetError> {
        if !ledger.contains(&proposal) {
            return Err(BudgetError::UnknownProposal(proposal));
        }
        if !roster.is_votable(&voter) {
            return Err(BudgetError::UnknownVoter(voter));
        }

        let per_proposal = self.votes.entry(proposal).or_default();
        let outcome = match per_proposal.get(&voter) {
            Some(existing) if timestamp <= existing.timestamp => {
                return Err(BudgetError::StaleVote);
            }
            Some(_) => VoteOutcome::Replaced,
            None => VoteOutcome::Recorded,
        };

        per_proposal.insert(
            voter,
            BudgetVote {
                voter,
                direction,
                timestamp,
            },
        );
        Ok(outcome)
    }

    /// Yes minus no among voters votable in `roster`. Votes from currently
    /// deactivated masternodes are skipped, not removed.
    pub fn net_score(&self, proposal: &ProposalHash, roster: &RosterSnapshot) -> i64 {
        let Some(per_proposal) = self.votes.get(proposal) else {
            return 0;
        };
        per_proposal
            .values()
            .filter(|v| roster.is_votable(&v.voter))
            .map(|v| match v.direction {
                VoteDirection::Yes => 1,
                VoteDirection::No => -1,
                VoteDirection::Abstain => 0,
            })
            .sum()
    }

    /// The stored vote of `voter` on `proposal`, live or soft-excluded.
    pub fn vote_of(&self, proposal: &ProposalHash, voter: &MasternodeId) -> Option<&BudgetVote> {
        self.votes.get(proposal)?.get(voter)
    }

    /// Total stored votes on a proposal (including soft-excluded ones).
    pub fn vote_count(&self, proposal: &ProposalHash) -> usize {
        self.votes.get(proposal).map_or(0, |m| m.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pylon_masternodes::MasternodeRoster;
    use pylon_types::{Amount, PaymentAddress, ProtocolParams, RegistrationKind, TxHash};

    fn mn(byte: u8) -> MasternodeId {
        MasternodeId::from_bytes([byte; 32])
    }

    fn ts(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    fn setup() -> (ProposalLedger, MasternodeRoster, VoteTally, ProposalHash) {
        let params = ProtocolParams::regtest();
        let mut ledger = ProposalLedger::new(&params);
        ledger.advance(10);
        let hash = ledger
            .submit(
                crate::proposal::Proposal::new(
                    "prop_0",
                    "https://link.com",
                    PaymentAddress::new("pyl_payee"),
                    Amount::from_coins(11),
                    3,
                    10,
                    TxHash::new([1u8; 32]),
                )
                .unwrap(),
            )
            .unwrap();

        let mut roster = MasternodeRoster::new();
        for i in 1..=3 {
            roster.register(mn(i), RegistrationKind::Deterministic).unwrap();
        }
        (ledger, roster, VoteTally::new(), hash)
    }

    #[test]
    fn yes_votes_accumulate() {
        let (ledger, roster, mut tally, hash) = setup();
        let snap = roster.snapshot();

        tally.cast_vote(&ledger, &snap, mn(1), hash, VoteDirection::Yes, ts(100)).unwrap();
        tally.cast_vote(&ledger, &snap, mn(2), hash, VoteDirection::Yes, ts(100)).unwrap();
        tally.cast_vote(&ledger, &snap, mn(3), hash, VoteDirection::No, ts(100)).unwrap();

        assert_eq!(tally.net_score(&hash, &snap), 1);
        assert_eq!(tally.vote_count(&hash), 3);
    }

    #[test]
    fn abstain_does_not_move_score() {
        let (ledger, roster, mut tally, hash) = setup();
        let snap = roster.snapshot();
        tally.cast_vote(&ledger, &snap, mn(1), hash, VoteDirection::Abstain, ts(100)).unwrap();
        assert_eq!(tally.net_score(&hash, &snap), 0);
    }

    #[test]
    fn newer_vote_replaces_older() {
        let (ledger, roster, mut tally, hash) = setup();
        let snap = roster.snapshot();

        let first = tally
            .cast_vote(&ledger, &snap, mn(1), hash, VoteDirection::Yes, ts(100))
            .unwrap();
        assert_eq!(first, VoteOutcome::Recorded);

        let second = tally
            .cast_vote(&ledger, &snap, mn(1), hash, VoteDirection::No, ts(101))
            .unwrap();
        assert_eq!(second, VoteOutcome::Replaced);

        assert_eq!(tally.net_score(&hash, &snap), -1);
        assert_eq!(tally.vote_count(&hash), 1);
    }

    #[test]
    fn equal_timestamp_is_stale() {
        let (ledger, roster, mut tally, hash) = setup();
        let snap = roster.snapshot();
        tally.cast_vote(&ledger, &snap, mn(1), hash, VoteDirection::Yes, ts(100)).unwrap();

        let err = tally
            .cast_vote(&ledger, &snap, mn(1), hash, VoteDirection::No, ts(100))
            .unwrap_err();
        assert_eq!(err, BudgetError::StaleVote);
        assert_eq!(tally.net_score(&hash, &snap), 1);
    }

    #[test]
    fn unknown_proposal_rejected() {
        let (ledger, roster, mut tally, _) = setup();
        let snap = roster.snapshot();
        let missing = ProposalHash::new([9u8; 32]);
        let err = tally
            .cast_vote(&ledger, &snap, mn(1), missing, VoteDirection::Yes, ts(100))
            .unwrap_err();
        assert_eq!(err, BudgetError::UnknownProposal(missing));
    }

    #[test]
    fn unknown_voter_rejected() {
        let (ledger, roster, mut tally, hash) = setup();
        let snap = roster.snapshot();
        let err = tally
            .cast_vote(&ledger, &snap, mn(9), hash, VoteDirection::Yes, ts(100))
            .unwrap_err();
        assert_eq!(err, BudgetError::UnknownVoter(mn(9)));
    }

    #[test]
    fn deactivated_voter_soft_excluded_then_restored() {
        let (ledger, mut roster, mut tally, hash) = setup();
        let snap = roster.snapshot();
        tally.cast_vote(&ledger, &snap, mn(1), hash, VoteDirection::Yes, ts(100)).unwrap();
        tally.cast_vote(&ledger, &snap, mn(2), hash, VoteDirection::Yes, ts(100)).unwrap();
        assert_eq!(tally.net_score(&hash, &snap), 2);

        // Deactivation drops the vote from the live tally without deleting it.
        roster.set_enabled(&mn(2), false).unwrap();
        let snap = roster.snapshot();
        assert_eq!(tally.net_score(&hash, &snap), 1);
        assert!(tally.vote_of(&hash, &mn(2)).is_some());

        // Reactivation restores it, no re-vote needed.
        roster.set_enabled(&mn(2), true).unwrap();
        let snap = roster.snapshot();
        assert_eq!(tally.net_score(&hash, &snap), 2);
    }
}
