//! The tier-two manager.

use crate::error::TierTwoError;
use pylon_budget::{
    allocate, rank, suggest_finalization, validate_finalization, BudgetPayment, FinalizationTx,
    FinalizationVoteTracker, Proposal, ProposalLedger, SyncStatus, VoteDirection, VoteOutcome,
    VoteTally,
};
use pylon_masternodes::{MasternodeRoster, PoSeEngine, RosterSnapshot};
use pylon_quorums::{
    select_quorum, AcceptAllVerifier, Contribution, DkgSession, DkgState, FinalCommitment,
    QuorumHistory, QuorumId,
};
use pylon_types::{
    Amount, BlockHash, FinalizationHash, MasternodeId, PaymentAddress, ProposalHash,
    ProtocolParams, RegistrationKind, Timestamp, TxHash,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// One ranked proposal in the budget projection, with its allocation share.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectionEntry {
    pub name: String,
    pub hash: ProposalHash,
    pub payment_address: PaymentAddress,
    pub amount_per_cycle: Amount,
    pub net_score: i64,
    pub total_payment_count: u32,
    pub remaining_payment_count: u32,
    /// Amount the proposal would receive across its full run of cycles.
    pub total_payment_amount: Amount,
    /// Amount admitted for this proposal this cycle (zero if skipped).
    pub allotted: Amount,
    /// Running total of admitted amounts up to and including this entry.
    pub total_allotted: Amount,
}

/// Roster entry as exposed by the query surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MasternodeStatusView {
    pub id: MasternodeId,
    pub kind: RegistrationKind,
    pub enabled: bool,
    pub pose_penalty: u32,
    /// −1 while active; the ban height once PoSe-banned.
    pub pose_ban_height: i64,
    pub votable: bool,
}

/// What connecting one block did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockSummary {
    /// Treasury payments executed in this block.
    pub paid: Vec<BudgetPayment>,
    /// DKG outcomes that finished this block and are ready to be mined.
    pub ready_commitments: Vec<FinalCommitment>,
    /// Sessions that failed this block (too few valid contributors).
    pub failed_sessions: Vec<QuorumId>,
}

/// Owns all tier-two state; every consensus-relevant mutation is driven by
/// confirmed chain events, applied in block order.
pub struct TierTwoManager {
    params: ProtocolParams,
    roster: MasternodeRoster,
    pose: PoSeEngine,
    ledger: ProposalLedger,
    tally: VoteTally,
    fin_tracker: FinalizationVoteTracker,
    history: QuorumHistory,
    sessions: BTreeMap<QuorumId, DkgSession>,
    height: u64,
}

impl TierTwoManager {
    pub fn new(params: ProtocolParams) -> Self {
        Self {
            pose: PoSeEngine::new(&params),
            ledger: ProposalLedger::new(&params),
            fin_tracker: FinalizationVoteTracker::new(&params),
            roster: MasternodeRoster::new(),
            tally: VoteTally::new(),
            history: QuorumHistory::new(),
            sessions: BTreeMap::new(),
            height: 0,
            params,
        }
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    // ── Roster mutations (confirmed registrations / service events) ──────

    pub fn register_masternode(
        &mut self,
        id: MasternodeId,
        kind: RegistrationKind,
    ) -> Result<(), TierTwoError> {
        self.roster.register(id, kind)?;
        info!(masternode = %id, ?kind, "masternode registered");
        Ok(())
    }

    pub fn set_masternode_enabled(
        &mut self,
        id: MasternodeId,
        enabled: bool,
    ) -> Result<(), TierTwoError> {
        self.roster.set_enabled(&id, enabled)?;
        Ok(())
    }

    // ── Budget operations ────────────────────────────────────────────────

    /// Submit a proposal backed by its confirmed fee transaction.
    pub fn submit_proposal(
        &mut self,
        name: impl Into<String>,
        url: impl Into<String>,
        payment_address: PaymentAddress,
        amount_per_cycle: Amount,
        cycle_count: u32,
        fee_tx: TxHash,
    ) -> Result<ProposalHash, TierTwoError> {
        let proposal = Proposal::new(
            name,
            url,
            payment_address,
            amount_per_cycle,
            cycle_count,
            self.height,
            fee_tx,
        )?;
        let hash = self.ledger.submit(proposal)?;
        info!(proposal = %hash, "proposal submitted");
        Ok(hash)
    }

    pub fn cast_vote(
        &mut self,
        voter: MasternodeId,
        proposal: ProposalHash,
        direction: VoteDirection,
        timestamp: Timestamp,
    ) -> Result<VoteOutcome, TierTwoError> {
        let snapshot = self.roster.snapshot();
        let outcome = self
            .tally
            .cast_vote(&self.ledger, &snapshot, voter, proposal, direction, timestamp)?;
        debug!(proposal = %proposal, voter = %voter, ?direction, "budget vote recorded");
        Ok(outcome)
    }

    /// Build and register the canonical finalization for the next superblock.
    /// `None` when the allocation is empty.
    pub fn suggest_finalization(&mut self, height: u64) -> Option<FinalizationHash> {
        let snapshot = self.roster.snapshot();
        let fin = suggest_finalization(height, &self.ledger, &self.tally, &snapshot, &self.params)?;
        let hash = fin.hash;
        self.fin_tracker.register(fin);
        Some(hash)
    }

    /// Validate a finalization received from the network and register it as
    /// a candidate.
    pub fn receive_finalization(&mut self, fin: FinalizationTx) -> Result<(), TierTwoError> {
        let snapshot = self.roster.snapshot();
        validate_finalization(&fin, &self.ledger, &self.tally, &snapshot, &self.params)?;
        self.fin_tracker.register(fin);
        Ok(())
    }

    pub fn vote_finalization(
        &mut self,
        voter: MasternodeId,
        fin_hash: FinalizationHash,
        legacy: bool,
        timestamp: Timestamp,
    ) -> Result<SyncStatus, TierTwoError> {
        let snapshot = self.roster.snapshot();
        let status = self
            .fin_tracker
            .vote(&snapshot, voter, fin_hash, legacy, timestamp)?;
        Ok(status)
    }

    pub fn finalization_sync_state(
        &self,
        fin_hash: &FinalizationHash,
    ) -> Result<SyncStatus, TierTwoError> {
        let snapshot = self.roster.snapshot();
        Ok(self.fin_tracker.sync_state(&snapshot, fin_hash)?)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn query_proposal(&self, hash: &ProposalHash) -> Option<&Proposal> {
        self.ledger.get(hash)
    }

    pub fn query_proposal_by_name(&self, name: &str) -> Option<&Proposal> {
        self.ledger.find_by_name(name)
    }

    pub fn proposal_count(&self) -> usize {
        self.ledger.len()
    }

    /// The ranked allocation for the superblock at (or next after) `height`.
    pub fn query_budget_projection(&self, height: u64) -> Vec<ProjectionEntry> {
        let snapshot = self.roster.snapshot();
        let superblock = if self.params.is_superblock(height) {
            height
        } else {
            self.params.next_superblock(height)
        };
        let ranked = rank(superblock, &self.ledger, &self.tally, &snapshot, &self.params);
        let allocation = allocate(superblock, &self.ledger, &self.tally, &snapshot, &self.params);

        let mut total = Amount::ZERO;
        ranked
            .into_iter()
            .map(|entry| {
                let admitted = allocation
                    .payments
                    .iter()
                    .any(|p| p.proposal == entry.hash);
                let allotted = if admitted {
                    entry.amount_per_cycle
                } else {
                    Amount::ZERO
                };
                total = total.checked_add(allotted).unwrap_or(total);
                let (total_payment_count, total_payment_amount) = self
                    .ledger
                    .get(&entry.hash)
                    .map(|p| (p.total_cycles, p.total_amount()))
                    .unwrap_or((0, Amount::ZERO));
                ProjectionEntry {
                    name: entry.name,
                    hash: entry.hash,
                    payment_address: entry.payment_address,
                    amount_per_cycle: entry.amount_per_cycle,
                    net_score: entry.net_score,
                    total_payment_count,
                    total_payment_amount,
                    remaining_payment_count: entry.remaining_cycles,
                    allotted,
                    total_allotted: total,
                }
            })
            .collect()
    }

    pub fn query_masternode_list(&self) -> Vec<MasternodeStatusView> {
        self.roster.iter().map(Self::status_view).collect()
    }

    pub fn query_masternode_status(&self, id: &MasternodeId) -> Option<MasternodeStatusView> {
        self.roster.get(id).map(Self::status_view)
    }

    pub fn roster_snapshot(&self) -> RosterSnapshot {
        self.roster.snapshot()
    }

    fn status_view(record: &pylon_masternodes::MasternodeRecord) -> MasternodeStatusView {
        MasternodeStatusView {
            id: record.id,
            kind: record.kind,
            enabled: record.enabled,
            pose_penalty: record.pose_penalty,
            pose_ban_height: record.pose_ban_height(),
            votable: record.is_votable(),
        }
    }

    pub fn quorum_history(&self) -> &QuorumHistory {
        &self.history
    }

    pub fn session_state(&self, quorum: &QuorumId) -> Option<DkgState> {
        self.sessions.get(quorum).map(|s| s.state())
    }

    // ── Chain callbacks ──────────────────────────────────────────────────

    /// Connect a confirmed block. Must be called in strict height order;
    /// every tier-two transition for this block happens here, synchronously.
    pub fn block_connected(
        &mut self,
        height: u64,
        block_hash: BlockHash,
    ) -> Result<BlockSummary, TierTwoError> {
        if height != self.height + 1 {
            return Err(TierTwoError::OutOfOrderBlock {
                height,
                expected: self.height + 1,
            });
        }
        self.height = height;

        self.ledger.advance(height);
        self.pose.on_new_block(&mut self.roster);

        let mut summary = BlockSummary {
            paid: self.apply_budget_payouts(height),
            ..BlockSummary::default()
        };

        if height % self.params.dkg_interval == 0 {
            self.open_dkg_session(height, block_hash);
        }
        self.judge_dkg_sessions(height, &mut summary);

        Ok(summary)
    }

    /// A quorum final commitment was mined: record it and penalize the bad
    /// members it reports.
    pub fn quorum_commitment_mined(
        &mut self,
        height: u64,
        commitment: FinalCommitment,
    ) -> Result<(), TierTwoError> {
        info!(
            quorum = ?commitment.quorum,
            bad = commitment.bad_members.len(),
            "quorum commitment mined"
        );
        self.sessions.remove(&commitment.quorum);
        for member in &commitment.bad_members {
            let outcome = self.pose.on_bad_member(&mut self.roster, member, height)?;
            debug!(masternode = %member, ?outcome, "bad DKG member penalized");
        }
        self.history.record(commitment);
        Ok(())
    }

    /// Deliver a member's DKG contribution to its open session.
    pub fn submit_dkg_contribution(
        &mut self,
        quorum: QuorumId,
        member: MasternodeId,
        contribution: Contribution,
    ) -> Result<(), TierTwoError> {
        let session = self
            .sessions
            .get_mut(&quorum)
            .ok_or(TierTwoError::UnknownSession(quorum))?;
        session.contribute(member, contribution, self.height)?;
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────────

    /// Execute the treasury payments scheduled for `height` and consume the
    /// finalization once its superblock passes.
    fn apply_budget_payouts(&mut self, height: u64) -> Vec<BudgetPayment> {
        let superblock = if self.params.is_superblock(height) {
            height
        } else {
            self.params.next_superblock(height)
        };
        let Some(decided) = self.fin_tracker.decided_for(superblock) else {
            return Vec::new();
        };

        let schedule = pylon_budget::payout_schedule(superblock, &decided.payments, &self.params);

        let mut paid = Vec::new();
        for scheduled in schedule {
            if scheduled.height != height {
                continue;
            }
            match self.ledger.record_payment(&scheduled.payment.proposal) {
                Ok(()) => {
                    info!(
                        proposal = %scheduled.payment.proposal,
                        amount = %scheduled.payment.amount,
                        height,
                        "treasury payment executed"
                    );
                    paid.push(scheduled.payment);
                }
                Err(err) => {
                    // The chain must keep progressing; a payment that cannot
                    // be recorded is dropped, not fatal.
                    warn!(%err, proposal = %scheduled.payment.proposal, "treasury payment skipped");
                }
            }
        }

        if self.params.is_superblock(height) {
            self.fin_tracker.consume(height);
        }
        paid
    }

    /// Open the DKG session for the quorum cycle at `height`, seeded by the
    /// cycle block's hash.
    fn open_dkg_session(&mut self, height: u64, seed_block: BlockHash) {
        let quorum = QuorumId::new(height, 0);
        let snapshot = self.roster.snapshot();
        match select_quorum(quorum, seed_block, &snapshot, &self.params) {
            Ok(members) => {
                let mut session = DkgSession::new(
                    quorum,
                    members,
                    self.params.dkg_window_blocks,
                    self.params.dkg_min_contributors,
                );
                // begin cannot fail on a fresh session
                let _ = session.begin(height);
                debug!(?quorum, members = session.members().len(), "DKG session opened");
                self.sessions.insert(quorum, session);
            }
            Err(err) => {
                warn!(%err, ?quorum, "quorum selection failed, no session this cycle");
            }
        }
    }

    /// Finalize every session whose window elapsed (or whose members all
    /// contributed). Failed sessions are dropped; committed ones surface in
    /// the block summary for the chain engine to mine.
    fn judge_dkg_sessions(&mut self, height: u64, summary: &mut BlockSummary) {
        let ready: Vec<QuorumId> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.ready_to_finalize(height))
            .map(|(id, _)| *id)
            .collect();

        for quorum in ready {
            let Some(session) = self.sessions.get_mut(&quorum) else {
                continue;
            };
            match session.finalize(&AcceptAllVerifier) {
                Ok(outcome) => match outcome.state {
                    DkgState::Committed => {
                        if let Some(commitment) = outcome.commitment {
                            summary.ready_commitments.push(commitment);
                        }
                    }
                    DkgState::Failed => {
                        summary.failed_sessions.push(quorum);
                        self.sessions.remove(&quorum);
                    }
                    _ => {}
                },
                Err(err) => {
                    warn!(%err, ?quorum, "DKG finalize rejected");
                }
            }
        }
    }
}
