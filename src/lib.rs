pub mod auth;
pub mod core;
pub mod deck;
pub mod history;
pub mod persistence;
pub mod sheets;
pub mod streak;

pub use crate::{
    auth::{
        StaticTokenProvider,
        TokenProvider,
    },
    core::{
        intervals,
        Card,
        PendingUpdate,
        SyncError,
        WriteOutcome,
    },
    deck::{
        review,
        spawn_retry_task,
        DeckManager,
        DeckManagerConfig,
        RetryHandle,
        SchedulerConfig,
    },
    history::StudyHistory,
    sheets::{
        parse_spreadsheet_url,
        RemoteStore,
        SheetStore,
    },
    streak::Streak,
};
