use pylon_types::MasternodeId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuorumError {
    #[error("quorum selection failed: {have} votable masternodes, need {need}")]
    SelectionFailure { have: usize, need: usize },

    #[error("masternode {0} is not a member of this quorum")]
    NotAMember(MasternodeId),

    #[error("operation not valid in the session's current state")]
    WrongState,

    #[error("contribution window closed at height {deadline}, received at {height}")]
    WindowClosed { deadline: u64, height: u64 },
}
