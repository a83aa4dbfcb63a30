pub mod backlog;
pub mod manager;
pub mod retry;
pub mod scheduler;
pub mod session;

#[cfg(test)]
mod manager_tests;

pub use manager::{
    DeckManager,
    DeckManagerConfig,
};
pub use retry::{
    spawn_retry_task,
    RetryHandle,
};
pub use scheduler::SchedulerConfig;
pub use session::review;
