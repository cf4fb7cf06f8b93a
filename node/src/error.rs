use pylon_budget::BudgetError;
use pylon_masternodes::RosterError;
use pylon_quorums::QuorumError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TierTwoError {
    #[error(transparent)]
    Budget(#[from] BudgetError),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Quorum(#[from] QuorumError),

    #[error("block {height} connected out of order, expected {expected}")]
    OutOfOrderBlock { height: u64, expected: u64 },

    #[error("no DKG session open for quorum {0:?}")]
    UnknownSession(pylon_quorums::QuorumId),
}
