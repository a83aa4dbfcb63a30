pub mod errors;
pub mod intervals;
pub mod models;

pub use errors::{
    SyncError,
    WriteOutcome,
};
pub use models::{
    Card,
    PendingUpdate,
};
