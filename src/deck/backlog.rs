use std::{
    collections::BTreeMap,
    path::PathBuf,
};

use crate::{
    core::{
        Card,
        PendingUpdate,
        SyncError,
    },
    persistence::{
        load_json_from,
        save_json_to,
    },
};

const PENDING_FILE: &str = "pending_updates.json";
const ACTIVE_FILE: &str = "active_saves.json";

/// The two durable backlogs. Pending updates are writes that failed and must
/// be retried; the active save queue holds full card snapshots awaiting their
/// first write attempt, so a process killed mid-save can recover them.
///
/// Every mutation persists synchronously before it is considered applied.
pub struct BacklogStore {
    dir: PathBuf,
    pending: BTreeMap<String, PendingUpdate>,
    active: Vec<Card>,
}

impl BacklogStore {
    pub fn open(dir: PathBuf) -> Result<Self, SyncError> {
        std::fs::create_dir_all(&dir)?;
        let pending = load_json_from(&dir.join(PENDING_FILE));
        let active = load_json_from(&dir.join(ACTIVE_FILE));
        Ok(Self { dir, pending, active })
    }

    /// Crash recovery: fold every stranded in-flight save into the pending
    /// backlog and clear the active queue. Recovered entries win over any
    /// stale pending entry for the same card, since they are provably newer.
    pub fn recover(&mut self) -> Result<usize, SyncError> {
        let recovered = self.active.len();
        if recovered == 0 {
            return Ok(0);
        }

        for card in std::mem::take(&mut self.active) {
            self.pending.insert(card.id.clone(), PendingUpdate::from(&card));
        }
        self.persist_pending()?;
        self.persist_active()?;
        Ok(recovered)
    }

    // ----- active save queue (FIFO) -----

    pub fn push_active(&mut self, card: Card) -> Result<(), SyncError> {
        self.active.push(card);
        self.persist_active()
    }

    pub fn front_active(&self) -> Option<&Card> {
        self.active.first()
    }

    pub fn pop_active(&mut self) -> Result<Option<Card>, SyncError> {
        if self.active.is_empty() {
            return Ok(None);
        }
        let card = self.active.remove(0);
        self.persist_active()?;
        Ok(Some(card))
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    // ----- pending update backlog -----

    /// Insert or replace the pending entry for this card.
    pub fn add_pending(&mut self, update: PendingUpdate) -> Result<(), SyncError> {
        self.pending.insert(update.id.clone(), update);
        self.persist_pending()
    }

    pub fn remove_pending(&mut self, id: &str) -> Result<bool, SyncError> {
        let removed = self.pending.remove(id).is_some();
        if removed {
            self.persist_pending()?;
        }
        Ok(removed)
    }

    pub fn clear_pending(&mut self) -> Result<(), SyncError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.pending.clear();
        self.persist_pending()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_updates(&self) -> Vec<PendingUpdate> {
        self.pending.values().cloned().collect()
    }

    pub fn pending_for(&self, id: &str) -> Option<&PendingUpdate> {
        self.pending.get(id)
    }

    fn persist_pending(&self) -> Result<(), SyncError> {
        save_json_to(&self.pending, &self.dir.join(PENDING_FILE))
    }

    fn persist_active(&self) -> Result<(), SyncError> {
        save_json_to(&self.active, &self.dir.join(ACTIVE_FILE))
    }
}
