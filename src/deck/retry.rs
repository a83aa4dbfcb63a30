use std::{
    sync::{
        atomic::{
            AtomicBool,
            Ordering,
        },
        Arc,
    },
    time::Duration,
};

use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::MissedTickBehavior,
};

use super::manager::DeckManager;
use crate::sheets::RemoteStore;

/// Stop handle for the periodic backlog retry. The task is owned by whoever
/// holds this handle, not free-running.
pub struct RetryHandle {
    stop_token: Arc<AtomicBool>,
    join_handle: JoinHandle<()>,
}

impl RetryHandle {
    pub fn stop(&self) {
        self.stop_token.store(true, Ordering::Relaxed);
        self.join_handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }
}

/// Periodically retries the pending backlog without user action. The
/// manager's own saving flag keeps a tick from overlapping a foreground save.
pub fn spawn_retry_task<S: RemoteStore + 'static>(
    manager: Arc<Mutex<DeckManager<S>>>,
    interval: Duration,
) -> RetryHandle {
    let stop_token = Arc::new(AtomicBool::new(false));
    let token = stop_token.clone();

    let join_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // the first tick completes immediately

        loop {
            ticker.tick().await;
            if token.load(Ordering::Relaxed) {
                break;
            }

            let mut manager = manager.lock().await;
            if let Err(e) = manager.flush_pending().await {
                println!("Background backlog flush failed ({}); will retry", e);
            }
        }
    });

    RetryHandle { stop_token, join_handle }
}
