//! Budget proposals and their lifecycle.

use crate::error::BudgetError;
use pylon_types::{blake2b_256, Amount, PaymentAddress, ProposalHash, TxHash};
use serde::{Deserialize, Serialize};

/// Longest accepted proposal name.
pub const MAX_PROPOSAL_NAME_LEN: usize = 20;
/// Longest accepted proposal URL.
pub const MAX_PROPOSAL_URL_LEN: usize = 64;

/// Proposal lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    /// Submitted, waiting out the maturity window.
    Pending,
    /// Matured; competes in budget allocation.
    Eligible,
    /// Out of payment cycles, or its funding window has passed. Terminal.
    Expired,
}

/// A request for a recurring treasury payment.
///
/// Immutable once broadcast except for `remaining_cycles`, which decreases by
/// exactly one each time a scheduled payment is confirmed, and `state`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    /// Content hash over (name, url, address, amount, cycles, height).
    pub hash: ProposalHash,
    pub name: String,
    pub url: String,
    pub payment_address: PaymentAddress,
    /// Paid out per funded superblock cycle.
    pub amount_per_cycle: Amount,
    pub total_cycles: u32,
    pub remaining_cycles: u32,
    /// Height of the block the proposal was confirmed in.
    pub submitted_height: u64,
    /// The confirmed fee (burn) transaction backing the proposal.
    pub fee_tx: TxHash,
    pub state: ProposalState,
}

impl Proposal {
    /// Validate fields and build the proposal in `Pending` state.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        payment_address: PaymentAddress,
        amount_per_cycle: Amount,
        total_cycles: u32,
        submitted_height: u64,
        fee_tx: TxHash,
    ) -> Result<Self, BudgetError> {
        let name = name.into();
        let url = url.into();

        if name.is_empty() || name.len() > MAX_PROPOSAL_NAME_LEN {
            return Err(BudgetError::MalformedProposal(format!(
                "name must be 1..={} bytes",
                MAX_PROPOSAL_NAME_LEN
            )));
        }
        if name.contains(char::is_whitespace) {
            return Err(BudgetError::MalformedProposal(
                "name must not contain whitespace".into(),
            ));
        }
        if url.is_empty() || url.len() > MAX_PROPOSAL_URL_LEN {
            return Err(BudgetError::MalformedProposal(format!(
                "url must be 1..={} bytes",
                MAX_PROPOSAL_URL_LEN
            )));
        }
        if amount_per_cycle.is_zero() {
            return Err(BudgetError::MalformedProposal(
                "amount per cycle must be positive".into(),
            ));
        }
        if total_cycles == 0 {
            return Err(BudgetError::MalformedProposal(
                "total cycle count must be at least 1".into(),
            ));
        }

        let hash = Self::content_hash(
            &name,
            &url,
            &payment_address,
            amount_per_cycle,
            total_cycles,
            submitted_height,
        );

        Ok(Self {
            hash,
            name,
            url,
            payment_address,
            amount_per_cycle,
            total_cycles,
            remaining_cycles: total_cycles,
            submitted_height,
            fee_tx,
            state: ProposalState::Pending,
        })
    }

    /// The deterministic content hash identifying this proposal network-wide.
    pub fn content_hash(
        name: &str,
        url: &str,
        payment_address: &PaymentAddress,
        amount_per_cycle: Amount,
        total_cycles: u32,
        submitted_height: u64,
    ) -> ProposalHash {
        let content = (
            name,
            url,
            payment_address.as_str(),
            amount_per_cycle.raw(),
            total_cycles,
            submitted_height,
        );
        let bytes = bincode::serialize(&content).expect("in-memory serialization cannot fail");
        ProposalHash::new(blake2b_256(&bytes))
    }

    /// Total amount this proposal would receive across all its cycles.
    /// Saturates rather than overflowing on pathological amounts.
    pub fn total_amount(&self) -> Amount {
        self.amount_per_cycle.saturating_mul(self.total_cycles as u64)
    }
}
