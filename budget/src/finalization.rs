//! Finalization transactions.
//!
//! A finalization transaction is the canonical ordered payment list proposed
//! for a superblock. Validation recomputes the allocation from chain state
//! and demands an exact match — membership, amounts and sort order. It is
//! deterministic and side-effect-free, so any node can re-validate any
//! candidate at any time and reach the same verdict.

use crate::allocator::{allocate, BudgetPayment};
use crate::error::BudgetError;
use crate::ledger::ProposalLedger;
use crate::votes::VoteTally;
use pylon_masternodes::RosterSnapshot;
use pylon_types::{blake2b_256, FinalizationHash, ProtocolParams};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The ordered payment list proposed for one superblock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizationTx {
    /// Content hash over (block_start, payments).
    pub hash: FinalizationHash,
    /// The superblock height the payments disburse at.
    pub block_start: u64,
    pub payments: Vec<BudgetPayment>,
}

impl FinalizationTx {
    pub fn new(block_start: u64, payments: Vec<BudgetPayment>) -> Self {
        let content = (
            block_start,
            payments
                .iter()
                .map(|p| (p.proposal.as_bytes(), p.address.as_str(), p.amount.raw()))
                .collect::<Vec<_>>(),
        );
        let bytes = bincode::serialize(&content).expect("in-memory serialization cannot fail");
        Self {
            hash: FinalizationHash::new(blake2b_256(&bytes)),
            block_start,
            payments,
        }
    }
}

/// Build the canonical finalization for the superblock at `height`.
///
/// Returns `None` when nothing is admitted — an empty budget is a normal
/// outcome, not an error.
pub fn suggest_finalization(
    height: u64,
    ledger: &ProposalLedger,
    tally: &VoteTally,
    roster: &RosterSnapshot,
    params: &ProtocolParams,
) -> Option<FinalizationTx> {
    let superblock = if params.is_superblock(height) {
        height
    } else {
        params.next_superblock(height)
    };
    let allocation = allocate(superblock, ledger, tally, roster, params);
    if allocation.payments.is_empty() {
        return None;
    }
    Some(FinalizationTx::new(superblock, allocation.payments))
}

/// Validate a candidate finalization against the canonical allocation for
/// its superblock.
pub fn validate_finalization(
    fin: &FinalizationTx,
    ledger: &ProposalLedger,
    tally: &VoteTally,
    roster: &RosterSnapshot,
    params: &ProtocolParams,
) -> Result<(), BudgetError> {
    if !params.is_superblock(fin.block_start) {
        return Err(BudgetError::InvalidFinalization(format!(
            "block {} is not a superblock height",
            fin.block_start
        )));
    }

    // Duplicate payments are rejected before anything else, regardless of
    // amounts, and reported distinctly for diagnostics.
    let mut seen = BTreeSet::new();
    for payment in &fin.payments {
        if !seen.insert(payment.proposal) {
            return Err(BudgetError::DuplicatePayment(payment.proposal));
        }
    }

    for pair in fin.payments.windows(2) {
        if pair[0].proposal >= pair[1].proposal {
            return Err(BudgetError::InvalidFinalization(
                "payments not in canonical (hash-ascending) order".into(),
            ));
        }
    }

    let canonical = allocate(fin.block_start, ledger, tally, roster, params);
    if fin.payments != canonical.payments {
        return Err(BudgetError::InvalidFinalization(
            "payment set does not match the canonical allocation".into(),
        ));
    }

    Ok(())
}
