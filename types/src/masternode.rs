//! Masternode identity types.

use crate::hash::TxHash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a masternode is registered on chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationKind {
    /// Legacy masternode, identified by its collateral txid.
    LegacyCollateral,
    /// Deterministic masternode, identified by its ProRegTx hash.
    Deterministic,
}

/// Identity of a masternode: the collateral txid (legacy) or the ProRegTx
/// hash (deterministic). One vote-unit per identity, regardless of collateral.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MasternodeId(TxHash);

impl MasternodeId {
    pub fn new(tx: TxHash) -> Self {
        Self(tx)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(TxHash::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for MasternodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasternodeId({:?})", self.0)
    }
}

impl fmt::Display for MasternodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A payment address, opaque to the tier-two layer (the wallet owns address
/// semantics; we only carry it into payment lists and compare it verbatim).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct PaymentAddress(String);

impl PaymentAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
