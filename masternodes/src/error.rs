use pylon_types::MasternodeId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("masternode {0} not found in the roster")]
    UnknownMasternode(MasternodeId),

    #[error("masternode {0} is already registered")]
    DuplicateMasternode(MasternodeId),
}
