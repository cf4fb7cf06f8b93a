//! Treasury budget subsystem.
//!
//! Stakeholders propose recurring payments; masternodes vote one unit per
//! identity; at every superblock the votes resolve into a deterministic
//! ranked allocation, which is finalized on chain and paid exactly once.
//! Every step is a pure function of confirmed chain state, so all nodes
//! derive byte-identical budgets from the same history.
//!
//! ## Module overview
//!
//! - [`proposal`] — proposal records, content hashing, lifecycle states.
//! - [`ledger`] — the proposal store: submit, mature, expire, record payments.
//! - [`votes`] — per-masternode vote tally with last-writer-wins replacement.
//! - [`allocator`] — ranked allocation against the cycle budget cap.
//! - [`finalization`] — canonical finalization transactions and validation.
//! - [`fin_votes`] — finalization vote tracking and quorum decision.
//! - [`error`] — budget error types.

pub mod allocator;
pub mod error;
pub mod fin_votes;
pub mod finalization;
pub mod ledger;
pub mod proposal;
pub mod votes;

pub use allocator::{rank, allocate, payout_schedule, BudgetAllocation, BudgetPayment, RankedProposal, ScheduledPayment};
pub use error::BudgetError;
pub use fin_votes::{FinalizationVoteTracker, SyncStatus};
pub use finalization::{suggest_finalization, validate_finalization, FinalizationTx};
pub use ledger::ProposalLedger;
pub use proposal::{Proposal, ProposalState};
pub use votes::{BudgetVote, VoteDirection, VoteOutcome, VoteTally};
