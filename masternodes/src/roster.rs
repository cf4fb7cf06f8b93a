//! The authoritative masternode roster.

use crate::error::RosterError;
use pylon_types::{MasternodeId, RegistrationKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// PoSe ban state. A ban always carries the height it happened at, so a
/// banned-without-height state is unrepresentable. Bans are never reversed
/// in-protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoSeStatus {
    Active,
    Banned { height: u64 },
}

/// One masternode's roster entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MasternodeRecord {
    pub id: MasternodeId,
    pub kind: RegistrationKind,
    /// Network-level activity (service reachable, pings current). Toggled by
    /// chain events; distinct from a PoSe ban.
    pub enabled: bool,
    /// Decaying penalty counter, ≥ 0.
    pub pose_penalty: u32,
    pub status: PoSeStatus,
}

impl MasternodeRecord {
    /// Whether this masternode may vote and serve in quorums.
    pub fn is_votable(&self) -> bool {
        self.enabled && self.status == PoSeStatus::Active
    }

    /// Ban height with the −1 sentinel used by the query surface.
    pub fn pose_ban_height(&self) -> i64 {
        match self.status {
            PoSeStatus::Active => -1,
            PoSeStatus::Banned { height } => height as i64,
        }
    }
}

/// The single owned identity → record table.
///
/// Mutation happens only inside block-connection handling; everything else
/// reads through [`RosterSnapshot`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MasternodeRoster {
    records: BTreeMap<MasternodeId, MasternodeRecord>,
}

impl MasternodeRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a masternode from its confirmed registration (collateral or
    /// ProRegTx).
    pub fn register(&mut self, id: MasternodeId, kind: RegistrationKind) -> Result<(), RosterError> {
        if self.records.contains_key(&id) {
            return Err(RosterError::DuplicateMasternode(id));
        }
        self.records.insert(
            id,
            MasternodeRecord {
                id,
                kind,
                enabled: true,
                pose_penalty: 0,
                status: PoSeStatus::Active,
            },
        );
        Ok(())
    }

    /// Toggle network-level activity (e.g. missed pings, service restored).
    pub fn set_enabled(&mut self, id: &MasternodeId, enabled: bool) -> Result<(), RosterError> {
        let record = self
            .records
            .get_mut(id)
            .ok_or(RosterError::UnknownMasternode(*id))?;
        record.enabled = enabled;
        Ok(())
    }

    pub fn get(&self, id: &MasternodeId) -> Option<&MasternodeRecord> {
        self.records.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &MasternodeId) -> Option<&mut MasternodeRecord> {
        self.records.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MasternodeRecord> {
        self.records.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut MasternodeRecord> {
        self.records.values_mut()
    }

    pub fn votable_count(&self) -> usize {
        self.records.values().filter(|r| r.is_votable()).count()
    }

    /// A read snapshot of who can vote right now. Cheap to clone, safe to
    /// hand to the tally/selection code without exposing mutation.
    pub fn snapshot(&self) -> RosterSnapshot {
        RosterSnapshot {
            votable: self
                .records
                .values()
                .filter(|r| r.is_votable())
                .map(|r| r.id)
                .collect(),
        }
    }
}

/// Point-in-time view of the votable roster.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RosterSnapshot {
    votable: BTreeSet<MasternodeId>,
}

impl RosterSnapshot {
    pub fn is_votable(&self, id: &MasternodeId) -> bool {
        self.votable.contains(id)
    }

    pub fn votable_count(&self) -> usize {
        self.votable.len()
    }

    /// Votable members in deterministic (byte-ascending) order.
    pub fn iter(&self) -> impl Iterator<Item = &MasternodeId> {
        self.votable.iter()
    }
}
