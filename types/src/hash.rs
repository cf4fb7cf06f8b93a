//! 32-byte hash newtypes used across the tier-two layer.
//!
//! Each identity in the protocol gets its own newtype so a proposal hash can
//! never be passed where a finalization hash is expected. All of them share
//! the same representation: a 32-byte Blake2b-256 digest.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte transaction hash (collateral txid, fee tx, ProRegTx, ...).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxHash([u8; 32]);

/// A 32-byte block hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHash([u8; 32]);

/// Content hash identifying a budget proposal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalHash([u8; 32]);

/// Content hash identifying a finalization transaction.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FinalizationHash([u8; 32]);

/// Hash committing to a completed DKG round (quorum key commitment).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommitmentHash([u8; 32]);

macro_rules! impl_hash32 {
    ($name:ident) => {
        impl $name {
            pub const ZERO: Self = Self([0u8; 32]);

            pub fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), hex::encode(&self.0[..4]))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode(&self.0))
            }
        }
    };
}

impl_hash32!(TxHash);
impl_hash32!(BlockHash);
impl_hash32!(ProposalHash);
impl_hash32!(FinalizationHash);
impl_hash32!(CommitmentHash);

// Inline hex encoding to avoid adding the `hex` crate as a dependency of types.
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_hash_is_zero() {
        assert!(TxHash::ZERO.is_zero());
        assert!(!ProposalHash::new([1u8; 32]).is_zero());
    }

    #[test]
    fn display_is_full_hex() {
        let h = BlockHash::new([0xab; 32]);
        assert_eq!(h.to_string(), "ab".repeat(32));
    }

    #[test]
    fn debug_is_truncated() {
        let h = FinalizationHash::new([0xcd; 32]);
        assert_eq!(format!("{:?}", h), "FinalizationHash(cdcdcdcd)");
    }

    #[test]
    fn ordering_is_bytewise() {
        let lo = ProposalHash::new([0u8; 32]);
        let hi = ProposalHash::new([1u8; 32]);
        assert!(lo < hi);
    }
}
