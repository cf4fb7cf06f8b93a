//! Tier-two protocol parameters.
//!
//! Every policy constant of the budget and quorum subsystems lives here.
//! Nothing downstream hard-codes these values: the functional figures
//! (PoSe step 66, ban threshold 100, ...) are network policy, not protocol
//! structure, and are confirmed against the target network's parameters.

use crate::amount::Amount;
use serde::{Deserialize, Serialize};

/// All tier-two parameters stored by every node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtocolParams {
    // ── Budget / treasury ────────────────────────────────────────────────
    /// Fee (raw units) burned by the proposal fee transaction.
    pub proposal_fee: Amount,

    /// Blocks a proposal must sit on chain before it becomes eligible.
    pub proposal_maturity_blocks: u64,

    /// Blocks between superblocks (one treasury cycle).
    pub superblock_cycle: u64,

    /// Total treasury budget available per cycle.
    pub budget_cap_per_cycle: Amount,

    /// Height at which single-block superblock payouts activate. Below it,
    /// admitted payments are spread over the blocks preceding the superblock.
    pub v6_fork_height: u64,

    /// Finalization quorum as basis points of the votable roster (floor 1).
    pub finalization_quorum_bps: u32,

    // ── Quorums / DKG ────────────────────────────────────────────────────
    /// Number of members deterministically selected per quorum.
    pub quorum_size: usize,

    /// Minimum valid contributors for a DKG session to commit.
    pub dkg_min_contributors: usize,

    /// Blocks a DKG session stays open for contributions.
    pub dkg_window_blocks: u64,

    /// Blocks between quorum cycles (a new quorum is formed at each).
    pub dkg_interval: u64,

    // ── PoSe ─────────────────────────────────────────────────────────────
    /// Penalty added per bad-member report (scaled to quorum size so a few
    /// missed sessions reach the ban threshold).
    pub pose_penalty_step: u32,

    /// Penalty at which a masternode is banned.
    pub pose_ban_threshold: u32,
}

impl ProtocolParams {
    /// Regtest parameters: tiny windows so functional tests run in a few
    /// simulated blocks.
    pub fn regtest() -> Self {
        Self {
            proposal_fee: Amount::from_coins(50),
            proposal_maturity_blocks: 5,
            superblock_cycle: 20,
            budget_cap_per_cycle: Amount::from_coins(500),
            v6_fork_height: 130,
            finalization_quorum_bps: 500,
            quorum_size: 3,
            dkg_min_contributors: 2,
            dkg_window_blocks: 4,
            dkg_interval: 20,
            pose_penalty_step: 66,
            pose_ban_threshold: 100,
        }
    }

    /// The total budget available for the cycle paying out at `height`.
    ///
    /// Flat for now; the height argument keeps the signature stable if an
    /// era schedule is introduced.
    pub fn budget_cap(&self, _height: u64) -> Amount {
        self.budget_cap_per_cycle
    }

    /// Whether `height` is a superblock (treasury payout) height.
    pub fn is_superblock(&self, height: u64) -> bool {
        height > 0 && height % self.superblock_cycle == 0
    }

    /// The first superblock height strictly after `height`.
    pub fn next_superblock(&self, height: u64) -> u64 {
        (height / self.superblock_cycle + 1) * self.superblock_cycle
    }

    /// Whether single-block superblock payouts are active at `height`.
    pub fn is_v6_active(&self, height: u64) -> bool {
        height >= self.v6_fork_height
    }
}

impl Default for ProtocolParams {
    /// Mainnet-shaped defaults (roughly one cycle per 30 days at 60s blocks).
    fn default() -> Self {
        Self {
            proposal_fee: Amount::from_coins(50),
            proposal_maturity_blocks: 60,
            superblock_cycle: 43_200,
            budget_cap_per_cycle: Amount::from_coins(43_200),
            v6_fork_height: 2_000_000,
            finalization_quorum_bps: 500,
            quorum_size: 50,
            dkg_min_contributors: 30,
            dkg_window_blocks: 24,
            dkg_interval: 576,
            pose_penalty_step: 66,
            pose_ban_threshold: 100,
        }
    }
}
