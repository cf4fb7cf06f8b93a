use pylon_types::{FinalizationHash, MasternodeId, ProposalHash};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BudgetError {
    #[error("malformed proposal: {0}")]
    MalformedProposal(String),

    #[error("proposal {0} already exists")]
    DuplicateProposal(ProposalHash),

    #[error("proposal submitted at height {submitted} ahead of chain tip {tip}")]
    TooEarly { submitted: u64, tip: u64 },

    #[error("proposal {0} not found")]
    UnknownProposal(ProposalHash),

    #[error("proposal {0} has no payment cycles remaining")]
    NoCyclesRemaining(ProposalHash),

    #[error("voter {0} is not an active masternode")]
    UnknownVoter(MasternodeId),

    #[error("vote is not newer than the voter's existing vote")]
    StaleVote,

    #[error("invalid finalization: {0}")]
    InvalidFinalization(String),

    #[error("finalization pays proposal {0} more than once")]
    DuplicatePayment(ProposalHash),

    #[error("a competing finalization already reached quorum for block {block_start}")]
    FinalizationAlreadyDecided { block_start: u64 },

    #[error("finalization {0} not found")]
    UnknownFinalization(FinalizationHash),
}
