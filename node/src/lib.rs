//! Tier-two node layer.
//!
//! [`TierTwoManager`] owns every piece of tier-two state — the masternode
//! roster, the proposal ledger and vote tallies, finalization candidates,
//! DKG sessions and quorum history — and exposes the narrow operation
//! surface the surrounding system (wallet, P2P layer, chain engine) drives.
//!
//! All consensus-relevant mutation flows through [`TierTwoManager::block_connected`]
//! and [`TierTwoManager::quorum_commitment_mined`], serialized by chain
//! height, so replaying confirmed chain events from genesis reconstructs
//! the exact same state on every node.

pub mod error;
pub mod tiertwo;

pub use error::TierTwoError;
pub use tiertwo::{BlockSummary, MasternodeStatusView, ProjectionEntry, TierTwoManager};
