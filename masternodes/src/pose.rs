//! Proof-of-Service scoring.
//!
//! Every bad-member report from a DKG session (or an external service-failure
//! signal) adds a fixed penalty step. The penalty decays by one at every
//! connected block. Crossing the ban threshold bans the masternode at the
//! current height, permanently. All three transitions are applied in block
//! order, identically on every node.

use crate::error::RosterError;
use crate::roster::{MasternodeRoster, PoSeStatus};
use pylon_types::{MasternodeId, ProtocolParams};
use tracing::{debug, warn};

/// What a bad-member report did to the masternode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoSeOutcome {
    /// Penalty increased, still below the ban threshold.
    Punished { penalty: u32 },
    /// The report pushed the penalty to the threshold; banned at `height`.
    Banned { height: u64 },
    /// Already banned; the report is a no-op.
    AlreadyBanned { height: u64 },
}

/// Applies PoSe transitions to the roster.
pub struct PoSeEngine {
    penalty_step: u32,
    ban_threshold: u32,
}

impl PoSeEngine {
    pub fn new(params: &ProtocolParams) -> Self {
        Self {
            penalty_step: params.pose_penalty_step,
            ban_threshold: params.pose_ban_threshold,
        }
    }

    /// Record a bad-member report at `height`: add the penalty step, then
    /// run the ban check.
    pub fn on_bad_member(
        &self,
        roster: &mut MasternodeRoster,
        id: &MasternodeId,
        height: u64,
    ) -> Result<PoSeOutcome, RosterError> {
        {
            let record = roster
                .get_mut(id)
                .ok_or(RosterError::UnknownMasternode(*id))?;

            if let PoSeStatus::Banned { height: banned_at } = record.status {
                return Ok(PoSeOutcome::AlreadyBanned { height: banned_at });
            }

            record.pose_penalty = record.pose_penalty.saturating_add(self.penalty_step);
            debug!(
                masternode = %id,
                penalty = record.pose_penalty,
                "PoSe penalty applied"
            );
        }

        if self.check_ban(roster, id, height)? {
            Ok(PoSeOutcome::Banned { height })
        } else {
            let penalty = roster.get(id).map(|r| r.pose_penalty).unwrap_or(0);
            Ok(PoSeOutcome::Punished { penalty })
        }
    }

    /// Per-block decay: every positive penalty drops by exactly one.
    /// Banned masternodes are left untouched.
    pub fn on_new_block(&self, roster: &mut MasternodeRoster) {
        for record in roster.iter_mut() {
            if record.status == PoSeStatus::Active && record.pose_penalty > 0 {
                record.pose_penalty -= 1;
            }
        }
    }

    /// Ban the masternode at `height` if its penalty has reached the
    /// threshold. Returns whether it is banned afterwards. One-way: an
    /// existing ban is never touched.
    pub fn check_ban(
        &self,
        roster: &mut MasternodeRoster,
        id: &MasternodeId,
        height: u64,
    ) -> Result<bool, RosterError> {
        let record = roster
            .get_mut(id)
            .ok_or(RosterError::UnknownMasternode(*id))?;

        match record.status {
            PoSeStatus::Banned { .. } => Ok(true),
            PoSeStatus::Active if record.pose_penalty >= self.ban_threshold => {
                record.status = PoSeStatus::Banned { height };
                warn!(masternode = %id, height, "masternode PoSe-banned");
                Ok(true)
            }
            PoSeStatus::Active => Ok(false),
        }
    }
}
