//! Main application state shared by the RPC handlers and the feed refresher

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, RwLock},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use super::FeedStatus;
use crate::{
    error::{Error, Result},
    feed::{merge_schedules, FeedSnapshot, Service, ServiceStatusClient, StationSchedule},
    gtfs::TransitNetwork,
};

/// Main application state: the static network plus the latest realtime data
#[derive(Debug)]
pub struct AppState {
    /// Stations and stops loaded at startup, never mutated
    pub network: Arc<TransitNetwork>,
    /// Latest decoded snapshot per feed id
    snapshots: RwLock<BTreeMap<u32, FeedSnapshot>>,
    feed_status: Mutex<BTreeMap<u32, FeedStatus>>,
    /// Source of `GetSystemStatus`, fetched per call
    service_status: Option<ServiceStatusClient>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Flipped to true once to stop background tasks
    shutdown_tx: watch::Sender<bool>,
}

impl AppState {
    pub fn new(network: TransitNetwork, port: u16, host: String, feed_ids: &[u32]) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let feed_status = feed_ids
            .iter()
            .map(|&id| (id, FeedStatus::new(id)))
            .collect();

        Self {
            network: Arc::new(network),
            snapshots: RwLock::new(BTreeMap::new()),
            feed_status: Mutex::new(feed_status),
            service_status: None,
            start_time: Instant::now(),
            port,
            host,
            shutdown_tx,
        }
    }

    pub fn with_service_status(mut self, client: ServiceStatusClient) -> Self {
        self.service_status = Some(client);
        self
    }

    /// Current per-line service status
    pub async fn service_status(&self) -> Result<Service> {
        match &self.service_status {
            Some(client) => client.fetch().await,
            None => Err(Error::StatusUnavailable),
        }
    }

    /// Replace a feed's arrivals with a freshly decoded snapshot
    pub fn replace_snapshot(&self, snapshot: FeedSnapshot) -> Result<()> {
        let feed_id = snapshot.feed_id;
        let fetched_at = snapshot.fetched_at;
        let arrivals = snapshot.arrival_count();

        self.snapshots
            .write()
            .map_err(|_| Error::LockPoisoned("feed snapshots"))?
            .insert(feed_id, snapshot);

        let mut status = self.feed_status.lock()
            .map_err(|_| Error::LockPoisoned("feed status"))?;
        status
            .entry(feed_id)
            .or_insert_with(|| FeedStatus::new(feed_id))
            .record_success(fetched_at, arrivals);
        Ok(())
    }

    /// Record a failed fetch; the feed's previous snapshot stays in place
    pub fn record_feed_error(&self, feed_id: u32, error: String) -> Result<()> {
        let mut status = self.feed_status.lock()
            .map_err(|_| Error::LockPoisoned("feed status"))?;

        warn!("Feed {} refresh failed: {}", feed_id, error);
        status
            .entry(feed_id)
            .or_insert_with(|| FeedStatus::new(feed_id))
            .record_failure(error);
        Ok(())
    }

    /// Upcoming arrivals at a station across all feeds
    pub fn schedule(&self, station_id: &str, now: DateTime<Utc>) -> Result<StationSchedule> {
        let snapshots = self.snapshots
            .read()
            .map_err(|_| Error::LockPoisoned("feed snapshots"))?;
        Ok(merge_schedules(snapshots.values(), station_id, now))
    }

    pub fn get_feed_statuses(&self) -> Result<Vec<FeedStatus>> {
        self.feed_status
            .lock()
            .map(|status| status.values().cloned().collect())
            .map_err(|_| Error::LockPoisoned("feed status"))
    }

    /// Time of the most recent successful fetch of any feed
    pub fn last_refresh(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .get_feed_statuses()?
            .iter()
            .filter_map(|status| status.last_success)
            .max())
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Ask background tasks to stop
    pub fn shutdown(&self) {
        info!("Stopping background tasks");
        self.shutdown_tx.send_replace(true);
    }
}
