//! Remote synchronization with the ClickDealer tracker
//!
//! Two pieces:
//! - `client` - HTTP client, upstream record normalization, and the
//!   [`TrackerApi`] trait the rest of the crate depends on
//! - `scheduler` - the 30s polling loop and the single-cycle runner
//!
//! The scheduler owns all writes to the shared [`DashboardState`]; the UI
//! only flips the live flag through a watch channel.
//!
//! [`DashboardState`]: crate::state::DashboardState

pub mod client;
pub mod scheduler;

// Re-export commonly used types
pub use client::{ClickDealerClient, SyncError, TrackerApi};
pub use scheduler::{run_sync_cycle, sync_scheduler_task, SYNC_INTERVAL};
