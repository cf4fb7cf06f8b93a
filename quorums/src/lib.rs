//! Deterministic-masternode quorums.
//!
//! At a fixed block cadence a signer set is derived deterministically from
//! chain state, runs a bounded-round distributed key generation (DKG), and
//! either commits a quorum key or fails. Members who never deliver a valid
//! contribution — withholding and disconnection are indistinguishable here —
//! are reported as bad members and penalized by the PoSe engine.
//!
//! ## Module overview
//!
//! - [`quorum`] — quorum identity, final commitments, immutable history.
//! - [`selector`] — pure-function signer selection from a chain-derived seed.
//! - [`dkg`] — the per-quorum session state machine and bad-member detection.
//! - [`error`] — quorum error types.

pub mod dkg;
pub mod error;
pub mod quorum;
pub mod selector;

pub use dkg::{AcceptAllVerifier, Contribution, ContributionVerifier, DkgOutcome, DkgSession, DkgState};
pub use error::QuorumError;
pub use quorum::{FinalCommitment, QuorumHistory, QuorumId};
pub use selector::select_quorum;
