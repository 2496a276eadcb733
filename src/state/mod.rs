//! State management module
//!
//! Holds the static transit network and the realtime snapshots shared between
//! the HTTP handlers and the feed refresh task.

pub mod app_state;
pub mod feed_status;

// Re-export main types
pub use app_state::AppState;
pub use feed_status::FeedStatus;
