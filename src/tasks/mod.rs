//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod feed_refresh;

// Re-export main functions
pub use feed_refresh::{feed_refresh_task, refresh_feeds, DEFAULT_REFRESH_INTERVAL};
