//! Realtime feed refresh background task

use std::{sync::Arc, time::Duration};
use chrono::Utc;
use futures::future::join_all;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::{
    feed::{FeedClient, FeedSnapshot},
    state::AppState,
};

/// Default time between two refreshes of every feed
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Background task that re-fetches all feeds on a fixed interval until
/// shutdown is requested through the state
pub async fn feed_refresh_task(state: Arc<AppState>, client: FeedClient, every: Duration) {
    info!(
        "Starting feed refresh task: feeds={:?}, interval={:?}",
        client.feed_ids(),
        every
    );

    let mut shutdown_rx = state.subscribe_shutdown();
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while !*shutdown_rx.borrow() {
        tokio::select! {
            // First tick completes immediately
            _ = ticker.tick() => {
                refresh_feeds(&state, &client).await;
            }

            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!("Feed refresh task stopped");
}

/// Fetch every feed concurrently and swap in the snapshots that decoded
pub async fn refresh_feeds(state: &AppState, client: &FeedClient) {
    let fetches = client.feed_ids().iter().map(|&feed_id| async move {
        (feed_id, client.fetch(feed_id).await)
    });

    for (feed_id, result) in join_all(fetches).await {
        let outcome = match result {
            Ok(message) => {
                let snapshot = FeedSnapshot::from_feed(feed_id, &state.network, &message, Utc::now());
                debug!("Feed {}: {} upcoming arrivals", feed_id, snapshot.arrival_count());
                state.replace_snapshot(snapshot)
            }
            Err(e) => state.record_feed_error(feed_id, e.to_string()),
        };

        if let Err(e) = outcome {
            error!("Failed to update state for feed {}: {}", feed_id, e);
        }
    }
}
