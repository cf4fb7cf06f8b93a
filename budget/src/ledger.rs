//! The proposal ledger.
//!
//! One owned store of every known proposal, keyed by content hash. Mutation
//! happens through `submit` (network submission confirmed on chain),
//! `advance` (block connection) and `record_payment` (superblock payout) —
//! all serialized by chain height, so replaying blocks reproduces the ledger.

use crate::error::BudgetError;
use crate::proposal::{Proposal, ProposalState};
use pylon_types::{ProposalHash, ProtocolParams};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalLedger {
    proposals: BTreeMap<ProposalHash, Proposal>,
    tip_height: u64,
    maturity_blocks: u64,
    superblock_cycle: u64,
}

impl ProposalLedger {
    pub fn new(params: &ProtocolParams) -> Self {
        Self {
            proposals: BTreeMap::new(),
            tip_height: 0,
            maturity_blocks: params.proposal_maturity_blocks,
            superblock_cycle: params.superblock_cycle,
        }
    }

    /// Store a new proposal in `Pending` state.
    pub fn submit(&mut self, proposal: Proposal) -> Result<ProposalHash, BudgetError> {
        if self.proposals.contains_key(&proposal.hash) {
            return Err(BudgetError::DuplicateProposal(proposal.hash));
        }
        if proposal.submitted_height > self.tip_height {
            return Err(BudgetError::TooEarly {
                submitted: proposal.submitted_height,
                tip: self.tip_height,
            });
        }

        let hash = proposal.hash;
        debug!(proposal = %hash, name = %proposal.name, "proposal stored");
        self.proposals.insert(hash, proposal);
        Ok(hash)
    }

    /// Apply height-driven lifecycle transitions. Pure function of `height`,
    /// idempotent: re-running at the same height changes nothing.
    pub fn advance(&mut self, height: u64) {
        self.tip_height = self.tip_height.max(height);

        for proposal in self.proposals.values_mut() {
            match proposal.state {
                ProposalState::Pending => {
                    if height >= proposal.submitted_height + self.maturity_blocks {
                        proposal.state = ProposalState::Eligible;
                    }
                }
                ProposalState::Eligible => {
                    if proposal.remaining_cycles == 0
                        || height >= Self::funding_window_end(proposal, self.maturity_blocks, self.superblock_cycle)
                    {
                        proposal.state = ProposalState::Expired;
                    }
                }
                ProposalState::Expired => {}
            }
        }
    }

    /// A confirmed superblock paid this proposal: burn one cycle.
    pub fn record_payment(&mut self, hash: &ProposalHash) -> Result<(), BudgetError> {
        let proposal = self
            .proposals
            .get_mut(hash)
            .ok_or(BudgetError::UnknownProposal(*hash))?;

        if proposal.remaining_cycles == 0 {
            return Err(BudgetError::NoCyclesRemaining(*hash));
        }
        proposal.remaining_cycles -= 1;
        debug!(
            proposal = %hash,
            remaining = proposal.remaining_cycles,
            "payment recorded"
        );
        Ok(())
    }

    pub fn get(&self, hash: &ProposalHash) -> Option<&Proposal> {
        self.proposals.get(hash)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Proposal> {
        self.proposals.values().find(|p| p.name == name)
    }

    pub fn contains(&self, hash: &ProposalHash) -> bool {
        self.proposals.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn tip_height(&self) -> u64 {
        self.tip_height
    }

    /// Proposals currently competing for budget, in hash order.
    pub fn eligible(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals
            .values()
            .filter(|p| p.state == ProposalState::Eligible && p.remaining_cycles > 0)
    }

    /// Last height at which the proposal could still be funded: once its
    /// maximum possible run of cycles has passed, it can never re-enter the
    /// allocation and is expired.
    fn funding_window_end(proposal: &Proposal, maturity: u64, cycle: u64) -> u64 {
        proposal.submitted_height + maturity + (proposal.total_cycles as u64 + 1) * cycle
    }
}
