//! Fundamental types for the Pylon tier-two protocol.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: hashes, amounts, timestamps, masternode identities, and the
//! tier-two protocol parameters.

pub mod amount;
pub mod hash;
pub mod hashing;
pub mod masternode;
pub mod params;
pub mod time;

pub use amount::Amount;
pub use hash::{BlockHash, CommitmentHash, FinalizationHash, ProposalHash, TxHash};
pub use hashing::{blake2b_256, blake2b_256_multi};
pub use masternode::{MasternodeId, PaymentAddress, RegistrationKind};
pub use params::ProtocolParams;
pub use time::Timestamp;
