#[cfg(test)]
mod tests {
    use std::{
        collections::{
            HashMap,
            HashSet,
        },
        sync::{
            atomic::{
                AtomicBool,
                AtomicUsize,
                Ordering,
            },
            Arc,
            Mutex,
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use chrono::Utc;
    use tempfile::TempDir;

    use crate::{
        core::{
            Card,
            SyncError,
            WriteOutcome,
        },
        deck::{
            backlog::BacklogStore,
            manager::{
                DeckManager,
                DeckManagerConfig,
                DEFAULT_RETRY_INTERVAL,
            },
            retry::spawn_retry_task,
            scheduler::SchedulerConfig,
            session::review,
        },
        sheets::RemoteStore,
    };

    const SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/test-sheet-1/edit#gid=0";

    /// In-memory stand-in for the spreadsheet, with switches for the failure
    /// modes the manager has to survive.
    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<HashMap<String, Card>>,
        fail_writes: AtomicBool,
        fail_loads: AtomicBool,
        deleted_rows: Mutex<HashSet<String>>,
        write_log: Mutex<Vec<String>>,
        batch_calls: AtomicUsize,
    }

    impl FakeStore {
        fn with_cards(cards: Vec<Card>) -> Arc<Self> {
            let store = Self::default();
            {
                let mut rows = store.rows.lock().unwrap();
                for card in cards {
                    rows.insert(card.id.clone(), card);
                }
            }
            Arc::new(store)
        }

        fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::Relaxed);
        }

        fn set_fail_loads(&self, fail: bool) {
            self.fail_loads.store(fail, Ordering::Relaxed);
        }

        fn delete_row(&self, id: &str) {
            self.deleted_rows.lock().unwrap().insert(id.to_string());
            self.rows.lock().unwrap().remove(id);
        }

        fn remote_card(&self, id: &str) -> Option<Card> {
            self.rows.lock().unwrap().get(id).cloned()
        }

        fn writes(&self) -> Vec<String> {
            self.write_log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteStore for Arc<FakeStore> {
        async fn load_all(&self, _source_id: &str) -> Result<Vec<Card>, SyncError> {
            if self.fail_loads.load(Ordering::Relaxed) {
                return Err(SyncError::Transient("connection refused".to_string()));
            }
            Ok(self.rows.lock().unwrap().values().cloned().collect())
        }

        async fn write(&self, _source_id: &str, card: &Card) -> Result<WriteOutcome, SyncError> {
            if self.deleted_rows.lock().unwrap().contains(&card.id) {
                return Err(SyncError::RowNotFound);
            }
            if self.fail_writes.load(Ordering::Relaxed) {
                return Err(SyncError::Transient("network down".to_string()));
            }

            let mut rows = self.rows.lock().unwrap();
            let Some(remote) = rows.get(&card.id) else {
                return Err(SyncError::RowNotFound);
            };
            if let (Some(remote_stamp), Some(local_stamp)) = (remote.updated_at, card.updated_at) {
                if remote_stamp >= local_stamp {
                    return Ok(WriteOutcome::ConflictSkipped);
                }
            }

            rows.insert(card.id.clone(), card.clone());
            self.write_log.lock().unwrap().push(card.id.clone());
            Ok(WriteOutcome::Written)
        }

        async fn write_batch(&self, _source_id: &str, cards: &[Card]) -> Result<(), SyncError> {
            if self.fail_writes.load(Ordering::Relaxed) {
                return Err(SyncError::Transient("network down".to_string()));
            }

            self.batch_calls.fetch_add(1, Ordering::Relaxed);
            let mut rows = self.rows.lock().unwrap();
            for card in cards {
                if self.deleted_rows.lock().unwrap().contains(&card.id) {
                    continue; // best effort, silently skipped
                }
                let Some(remote) = rows.get(&card.id) else {
                    continue;
                };
                if let (Some(remote_stamp), Some(local_stamp)) =
                    (remote.updated_at, card.updated_at)
                {
                    if remote_stamp >= local_stamp {
                        continue;
                    }
                }
                rows.insert(card.id.clone(), card.clone());
            }
            Ok(())
        }
    }

    fn new_card(id: &str) -> Card {
        let mut card = Card::new(format!("front-{}", id), format!("back-{}", id));
        card.id = id.to_string();
        card
    }

    // Built field by field so no test touches the real app data directory.
    fn config_for(dir: &TempDir) -> DeckManagerConfig {
        DeckManagerConfig {
            data_dir: dir.path().to_path_buf(),
            scheduler: SchedulerConfig { fuzz: 0.0 },
            retry_interval: DEFAULT_RETRY_INTERVAL,
            fallback_deck: None,
        }
    }

    async fn loaded_manager(
        store: Arc<FakeStore>,
        dir: &TempDir,
    ) -> DeckManager<Arc<FakeStore>> {
        let mut manager = DeckManager::new(store, config_for(dir)).unwrap();
        manager.load_deck(SHEET_URL).await.unwrap();
        manager
    }

    #[tokio::test]
    async fn new_card_is_due_then_scheduled_out_by_a_review() {
        let store = FakeStore::with_cards(vec![new_card("card-1")]);
        let dir = TempDir::new().unwrap();
        let mut manager = loaded_manager(store.clone(), &dir).await;

        assert_eq!(manager.queue(), &["card-1".to_string()]);

        let reviewed = review(manager.current_card().unwrap(), "1d", Utc::now());
        manager.update_card(reviewed).await.unwrap();

        // Not due again for about a day, and the write went straight through.
        assert!(manager.queue().is_empty());
        assert_eq!(manager.pending_count(), 0);
        assert_eq!(store.writes(), vec!["card-1".to_string()]);
        assert_eq!(store.remote_card("card-1").unwrap().interval.as_deref(), Some("1d"));
    }

    #[tokio::test]
    async fn transient_failure_backlogs_and_the_next_success_flushes() {
        let store = FakeStore::with_cards(vec![new_card("card-1"), new_card("card-2")]);
        let dir = TempDir::new().unwrap();
        let mut manager = loaded_manager(store.clone(), &dir).await;

        store.set_fail_writes(true);
        let reviewed = review(manager.card("card-1").unwrap(), "1d", Utc::now());
        manager.update_card(reviewed).await.unwrap();

        // The queue moved on immediately; the write is parked durably.
        assert_eq!(manager.pending_count(), 1);
        assert!(store.writes().is_empty());

        // Connectivity returns. Any successful write doubles as the signal to
        // flush the whole backlog.
        store.set_fail_writes(false);
        let reviewed = review(manager.card("card-2").unwrap(), "1wk", Utc::now());
        manager.update_card(reviewed).await.unwrap();

        assert_eq!(manager.pending_count(), 0);
        assert!(store.batch_calls.load(Ordering::Relaxed) >= 1);
        assert_eq!(store.remote_card("card-1").unwrap().interval.as_deref(), Some("1d"));
    }

    #[tokio::test]
    async fn row_not_found_is_terminal_and_clears_any_backlog_entry() {
        let store = FakeStore::with_cards(vec![new_card("card-1")]);
        let dir = TempDir::new().unwrap();
        let mut manager = loaded_manager(store.clone(), &dir).await;

        store.set_fail_writes(true);
        let reviewed = review(manager.card("card-1").unwrap(), "1d", Utc::now());
        manager.update_card(reviewed.clone()).await.unwrap();
        assert_eq!(manager.pending_count(), 1);

        // The user deletes the row remotely; the next attempt must give up
        // instead of retrying forever.
        store.set_fail_writes(false);
        store.delete_row("card-1");
        manager.update_card(reviewed).await.unwrap();

        assert_eq!(manager.pending_count(), 0);
        assert!(manager.sync_message().unwrap().contains("deleted remotely"));
    }

    #[tokio::test]
    async fn stranded_saves_are_recovered_into_the_pending_backlog() {
        let dir = TempDir::new().unwrap();

        // Simulate a process killed mid-save: snapshots left in the active
        // queue, nothing pending.
        {
            let mut backlog = BacklogStore::open(dir.path().join("backlog")).unwrap();
            for id in ["a", "b", "c"] {
                let mut card = new_card(id);
                card.updated_at = Some(Utc::now());
                backlog.push_active(card).unwrap();
            }
        }

        let store = FakeStore::with_cards(vec![]);
        let manager = DeckManager::new(store, config_for(&dir)).unwrap();
        assert_eq!(manager.pending_count(), 3);
    }

    #[tokio::test]
    async fn pending_updates_override_stale_remote_state_on_reload() {
        let store = FakeStore::with_cards(vec![new_card("card-1")]);
        let dir = TempDir::new().unwrap();
        let mut manager = loaded_manager(store.clone(), &dir).await;

        store.set_fail_writes(true);
        let reviewed = review(manager.card("card-1").unwrap(), "1wk", Utc::now());
        manager.update_card(reviewed).await.unwrap();
        assert_eq!(manager.pending_count(), 1);

        // The remote never saw the review, but a reload must not roll the
        // local study state back.
        manager.reload_deck().await.unwrap();
        assert_eq!(manager.card("card-1").unwrap().interval.as_deref(), Some("1wk"));
        assert_eq!(manager.pending_count(), 1);
        assert_eq!(manager.sync_message(), Some("Nothing due right now"));
    }

    #[tokio::test]
    async fn reload_flushes_the_backlog_before_fetching() {
        let store = FakeStore::with_cards(vec![new_card("card-1")]);
        let dir = TempDir::new().unwrap();
        let mut manager = loaded_manager(store.clone(), &dir).await;

        store.set_fail_writes(true);
        let reviewed = review(manager.card("card-1").unwrap(), "1d", Utc::now());
        manager.update_card(reviewed).await.unwrap();
        assert_eq!(manager.pending_count(), 1);

        // Connectivity is back by the time the user reloads: the pre-load
        // flush lands the review, so the fetch sees it and the card comes
        // back already scheduled out.
        store.set_fail_writes(false);
        manager.reload_deck().await.unwrap();

        assert_eq!(manager.pending_count(), 0);
        assert!(store.batch_calls.load(Ordering::Relaxed) >= 1);
        assert_eq!(store.remote_card("card-1").unwrap().interval.as_deref(), Some("1d"));
        assert!(manager.queue().is_empty());
    }

    #[tokio::test]
    async fn conflict_skip_counts_as_handled() {
        let mut remote = new_card("card-1");
        remote.updated_at = Some(Utc::now() + chrono::Duration::hours(1));
        let store = FakeStore::with_cards(vec![remote]);
        let dir = TempDir::new().unwrap();
        let mut manager = loaded_manager(store.clone(), &dir).await;

        let reviewed = review(manager.card("card-1").unwrap(), "1d", Utc::now());
        manager.update_card(reviewed).await.unwrap();

        // Remote wins; nothing written, nothing backlogged.
        assert!(store.writes().is_empty());
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test]
    async fn invalid_locator_fails_loudly() {
        let store = FakeStore::with_cards(vec![new_card("card-1")]);
        let dir = TempDir::new().unwrap();
        let mut manager = DeckManager::new(store, config_for(&dir)).unwrap();

        let result = manager.load_deck("https://example.com/not-a-sheet").await;
        assert!(matches!(result, Err(SyncError::InvalidLocator(_))));
        assert!(manager.error().is_some());
        assert!(manager.queue().is_empty());
    }

    #[tokio::test]
    async fn an_empty_deck_is_a_fatal_load_error() {
        let store = FakeStore::with_cards(vec![]);
        let dir = TempDir::new().unwrap();
        let mut manager = DeckManager::new(store, config_for(&dir)).unwrap();

        let result = manager.load_deck(SHEET_URL).await;
        assert!(matches!(result, Err(SyncError::EmptyDeck)));
        assert!(manager.error().is_some());
        assert_eq!(manager.card_count(), 0);
    }

    #[tokio::test]
    async fn transient_load_failure_falls_back_to_the_sample_deck() {
        let store = FakeStore::with_cards(vec![new_card("remote-1")]);
        store.set_fail_loads(true);
        let dir = TempDir::new().unwrap();

        let config = DeckManagerConfig {
            fallback_deck: Some(vec![new_card("sample-1")]),
            ..config_for(&dir)
        };
        let mut manager = DeckManager::new(store, config).unwrap();

        manager.load_deck(SHEET_URL).await.unwrap();
        assert_eq!(manager.queue(), &["sample-1".to_string()]);
        assert!(manager.sync_message().unwrap().contains("sample deck"));
        assert!(manager.error().is_none());
    }

    #[tokio::test]
    async fn clearing_the_deck_resets_observable_state() {
        let store = FakeStore::with_cards(vec![new_card("card-1")]);
        let dir = TempDir::new().unwrap();
        let mut manager = loaded_manager(store, &dir).await;

        manager.clear_deck();
        assert!(manager.queue().is_empty());
        assert_eq!(manager.card_count(), 0);
        assert!(manager.source_id().is_none());
        assert!(manager.sync_message().is_none());
    }

    #[tokio::test]
    async fn loading_records_a_history_visit() {
        let store = FakeStore::with_cards(vec![new_card("card-1")]);
        let dir = TempDir::new().unwrap();
        let manager = loaded_manager(store, &dir).await;

        assert_eq!(manager.history().len(), 1);
        assert_eq!(manager.history().visits().front().unwrap().source_id, "test-sheet-1");
    }

    #[tokio::test]
    async fn background_retry_flushes_the_backlog_without_user_action() {
        let store = FakeStore::with_cards(vec![new_card("card-1")]);
        let dir = TempDir::new().unwrap();
        let mut manager = loaded_manager(store.clone(), &dir).await;

        store.set_fail_writes(true);
        let reviewed = review(manager.card("card-1").unwrap(), "1d", Utc::now());
        manager.update_card(reviewed).await.unwrap();
        assert_eq!(manager.pending_count(), 1);
        store.set_fail_writes(false);

        let manager = Arc::new(tokio::sync::Mutex::new(manager));
        let handle = spawn_retry_task(manager.clone(), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop();

        assert_eq!(manager.lock().await.pending_count(), 0);
        assert_eq!(store.remote_card("card-1").unwrap().interval.as_deref(), Some("1d"));
    }
}
