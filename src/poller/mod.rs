// Notification polling: delta detection, session state and the scheduler.
//
// - delta.rs: unread-count comparison between two fetches
// - state.rs: per-session state and the snapshot channel
// - controller.rs: interval ticker, single-flight fetches, mark-as-read

pub mod controller;
pub mod delta;
pub mod state;

pub use controller::{NotificationPoller, SessionContext, DEFAULT_POLL_INTERVAL};
pub use delta::{detect, Delta};
pub use state::{NotificationSnapshot, PollerStatus, PollingState, SharedState};
