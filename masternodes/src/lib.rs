//! Masternode roster and Proof-of-Service (PoSe) scoring.
//!
//! The roster is the single authoritative mapping from masternode identity to
//! record. It is mutated only by confirmed chain events, serialized by block
//! height, so every node replays to an identical roster. Other components
//! read it through [`RosterSnapshot`]s, never through shared mutable access.
//!
//! ## Module overview
//!
//! - [`roster`] — masternode records, ban state, snapshots.
//! - [`pose`] — penalty step on bad-member reports, per-block decay, bans.
//! - [`error`] — roster error types.

pub mod error;
pub mod pose;
pub mod roster;

pub use error::RosterError;
pub use pose::{PoSeEngine, PoSeOutcome};
pub use roster::{MasternodeRecord, MasternodeRoster, PoSeStatus, RosterSnapshot};
