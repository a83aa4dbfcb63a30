use std::{
    collections::HashMap,
    path::PathBuf,
    time::Duration,
};

use chrono::Utc;

use super::{
    backlog::BacklogStore,
    scheduler::{
        self,
        SchedulerConfig,
    },
};
use crate::{
    core::{
        Card,
        PendingUpdate,
        SyncError,
        WriteOutcome,
    },
    history::StudyHistory,
    persistence,
    sheets::{
        parse_spreadsheet_url,
        RemoteStore,
    },
};

pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct DeckManagerConfig {
    /// Directory holding the durable backlogs and the study history.
    pub data_dir: PathBuf,
    pub scheduler: SchedulerConfig,
    pub retry_interval: Duration,
    /// Optional locally bundled deck used when the remote load fails
    /// transiently; surfaced as a warning, not an error.
    pub fallback_deck: Option<Vec<Card>>,
}

impl Default for DeckManagerConfig {
    fn default() -> Self {
        Self {
            data_dir: persistence::get_app_data_dir(),
            scheduler: SchedulerConfig::default(),
            retry_interval: DEFAULT_RETRY_INTERVAL,
            fallback_deck: None,
        }
    }
}

/// Owner of the in-memory card set, the study queue and both durable
/// backlogs. All outbound writes are sequenced through this object one at a
/// time, in FIFO order; the queue itself is recomputed synchronously after
/// every mutation and never waits on the network.
pub struct DeckManager<S: RemoteStore> {
    store: S,
    scheduler_config: SchedulerConfig,
    fallback_deck: Option<Vec<Card>>,
    backlog: BacklogStore,
    history: StudyHistory,
    cards: HashMap<String, Card>,
    queue: Vec<String>,
    source_id: Option<String>,
    loading: bool,
    saving: bool,
    sync_message: Option<String>,
    error: Option<String>,
}

impl<S: RemoteStore> DeckManager<S> {
    /// Opens the durable backlogs and immediately recovers any saves stranded
    /// by an interrupted process: they are folded into the pending backlog so
    /// they get retried instead of silently lost.
    pub fn new(store: S, config: DeckManagerConfig) -> Result<Self, SyncError> {
        let mut backlog = BacklogStore::open(config.data_dir.join("backlog"))?;
        let recovered = backlog.recover()?;
        if recovered > 0 {
            println!("Recovered {} interrupted save(s) into the pending backlog", recovered);
        }

        let history = StudyHistory::load(&config.data_dir);

        Ok(Self {
            store,
            scheduler_config: config.scheduler,
            fallback_deck: config.fallback_deck,
            backlog,
            history,
            cards: HashMap::new(),
            queue: Vec::new(),
            source_id: None,
            loading: false,
            saving: false,
            sync_message: None,
            error: None,
        })
    }

    // ----- observable state for the presentation layer -----

    pub fn queue(&self) -> &[String] {
        &self.queue
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.queue.first().and_then(|id| self.cards.get(id))
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.cards.get(id)
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn sync_message(&self) -> Option<&str> {
        self.sync_message.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of changes not yet confirmed remotely. Durable, so it survives
    /// reloads and restarts.
    pub fn pending_count(&self) -> usize {
        self.backlog.pending_count()
    }

    pub fn history(&self) -> &StudyHistory {
        &self.history
    }

    // ----- deck lifecycle -----

    pub async fn load_deck(&mut self, locator: &str) -> Result<(), SyncError> {
        let source_id = match parse_spreadsheet_url(locator) {
            Ok(id) => id,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };
        self.run_load(source_id).await
    }

    /// Re-runs the fetch+merge+recompute against the current source, picking
    /// up remote edits made out of band.
    pub async fn reload_deck(&mut self) -> Result<(), SyncError> {
        let source_id = self.source_id.clone().ok_or(SyncError::NoDeckLoaded)?;
        self.run_load(source_id).await
    }

    pub fn clear_deck(&mut self) {
        self.cards.clear();
        self.queue.clear();
        self.source_id = None;
        self.sync_message = None;
        self.error = None;
    }

    async fn run_load(&mut self, source_id: String) -> Result<(), SyncError> {
        self.loading = true;
        let result = self.load_into(source_id).await;
        self.loading = false;

        if let Err(e) = &result {
            self.error = Some(e.to_string());
        }
        result
    }

    async fn load_into(&mut self, source_id: String) -> Result<(), SyncError> {
        // Flush anything left over from a previous session first. Failure is
        // fine; the backlog is durable and the periodic retry will get it.
        if self.backlog.pending_count() > 0 {
            if let Err(e) = self.flush_backlog(&source_id).await {
                println!("Pre-load backlog flush failed ({}); will retry later", e);
            }
        }

        let mut warning = None;
        let cards = match self.store.load_all(&source_id).await {
            Ok(cards) => cards,
            Err(SyncError::Transient(reason)) if self.fallback_deck.is_some() => {
                warning = Some(format!(
                    "Remote load failed ({}); studying the built-in sample deck",
                    reason
                ));
                self.fallback_deck.clone().unwrap_or_default()
            }
            Err(e) => return Err(e),
        };

        if cards.is_empty() {
            return Err(SyncError::EmptyDeck);
        }

        let mut card_set: HashMap<String, Card> =
            cards.into_iter().map(|card| (card.id.clone(), card)).collect();

        // Surviving pending updates are newer than whatever the remote just
        // returned: local study state wins until the write lands.
        for update in self.backlog.pending_updates() {
            if let Some(card) = card_set.get_mut(&update.id) {
                update.apply_to(card);
            }
        }

        self.cards = card_set;
        self.source_id = Some(source_id.clone());
        self.error = None;
        self.sync_message = warning;
        self.recompute_queue();

        if self.queue.is_empty() && !self.cards.is_empty() {
            self.sync_message = Some("Nothing due right now".to_string());
        }

        // Fire and forget; history is independent of the scheduling core.
        if let Err(e) = self.history.record_visit(&source_id, &source_id) {
            eprintln!("Failed to record deck visit: {}", e);
        }

        Ok(())
    }

    // ----- review path -----

    /// Applies a reviewed card optimistically, recomputes the queue, and
    /// kicks off the durable write pipeline. The queue never waits on I/O.
    pub async fn update_card(&mut self, mut card: Card) -> Result<(), SyncError> {
        card.updated_at = Some(Utc::now());

        self.cards.insert(card.id.clone(), card.clone());
        self.recompute_queue();

        self.backlog.push_active(card)?;
        self.process_saves().await
    }

    /// Drains the active save queue strictly one write at a time, in FIFO
    /// order. Never runs concurrently with itself; the saving flag also keeps
    /// the background retry from overlapping a foreground save.
    async fn process_saves(&mut self) -> Result<(), SyncError> {
        if self.saving {
            return Ok(());
        }
        let Some(source_id) = self.source_id.clone() else {
            return Ok(());
        };

        self.saving = true;
        let result = self.drain_active(&source_id).await;
        self.saving = false;
        result
    }

    async fn drain_active(&mut self, source_id: &str) -> Result<(), SyncError> {
        while let Some(card) = self.backlog.front_active().cloned() {
            match self.store.write(source_id, &card).await {
                Ok(outcome) => {
                    self.backlog.pop_active()?;
                    self.backlog.remove_pending(&card.id)?;
                    if outcome == WriteOutcome::ConflictSkipped {
                        println!("Write for '{}' skipped; the remote copy is newer", card.front);
                    }
                    // Getting a write through is evidence connectivity is
                    // back, so take the chance to flush the whole backlog.
                    if let Err(e) = self.flush_backlog(source_id).await {
                        println!("Opportunistic backlog flush failed ({}); will retry later", e);
                    }
                }
                Err(SyncError::RowNotFound) => {
                    // Terminal for this card: the user deleted its row.
                    self.backlog.pop_active()?;
                    self.backlog.remove_pending(&card.id)?;
                    self.sync_message =
                        Some(format!("'{}' skipped, deleted remotely", card.front));
                }
                Err(e) => {
                    // Park it in the pending backlog before it leaves the
                    // active queue: the update must be on disk in at least
                    // one backlog at every instant, and recovery tolerates
                    // it being in both.
                    self.backlog.add_pending(PendingUpdate::from(&card))?;
                    self.backlog.pop_active()?;
                    println!("Save for '{}' failed ({}); queued for retry", card.front, e);
                }
            }
        }
        Ok(())
    }

    // ----- backlog retry -----

    /// Flush the pending backlog if there is anything to flush and no save is
    /// in progress. Called by the periodic retry task and safe to call often.
    pub async fn flush_pending(&mut self) -> Result<(), SyncError> {
        if self.saving || self.backlog.pending_count() == 0 {
            return Ok(());
        }
        let Some(source_id) = self.source_id.clone() else {
            return Ok(());
        };

        self.saving = true;
        let result = self.flush_backlog(&source_id).await;
        self.saving = false;
        result
    }

    async fn flush_backlog(&mut self, source_id: &str) -> Result<(), SyncError> {
        if self.backlog.pending_count() == 0 {
            return Ok(());
        }

        let cards: Vec<Card> = self
            .backlog
            .pending_updates()
            .iter()
            .map(|update| self.card_for_update(update))
            .collect();

        self.store.write_batch(source_id, &cards).await?;
        self.backlog.clear_pending()?;
        self.sync_message = Some("All pending changes synced".to_string());
        Ok(())
    }

    /// A full card snapshot for a backlogged update: the in-memory card where
    /// we still have one, otherwise a bare id-only card (the content fallback
    /// then simply cannot match, which is the best we can do).
    fn card_for_update(&self, update: &PendingUpdate) -> Card {
        let mut card = self
            .cards
            .get(&update.id)
            .cloned()
            .unwrap_or_else(|| Card { id: update.id.clone(), ..Card::default() });
        update.apply_to(&mut card);
        card
    }

    fn recompute_queue(&mut self) {
        self.queue = scheduler::compute_queue(&self.cards, Utc::now(), self.scheduler_config);
    }
}
