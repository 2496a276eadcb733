//! Live arrivals dashboard
//!
//! Polls `GetClosestStations` for the current location and redraws station
//! cards in the terminal. The clock redraws every second; the data refreshes
//! on a fixed interval and immediately when the saved location changes.

pub mod client;
pub mod duration;
pub mod location;
pub mod render;

use std::{future::Future, io::Write, time::Duration};

use chrono::Local;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

pub use client::{ClientError, RpcClient};
pub use location::{LocationError, LocationStore, DEFAULT_COORDINATES};

use crate::{gtfs::Coordinates, protocol::Station};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub refresh: Duration,
    pub location_poll: Duration,
    pub station_count: i64,
    pub width: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            refresh: Duration::from_secs(30),
            location_poll: Duration::from_secs(2),
            station_count: 5,
            width: 30,
        }
    }
}

pub struct Dashboard {
    client: RpcClient,
    store: LocationStore,
    coordinates: Coordinates,
    stations: Vec<Station>,
    options: DashboardOptions,
}

impl Dashboard {
    pub fn new(
        client: RpcClient,
        store: LocationStore,
        coordinates: Coordinates,
        options: DashboardOptions,
    ) -> Self {
        Self {
            client,
            store,
            coordinates,
            stations: Vec::new(),
            options,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Fetch the nearest stations. On failure the previous stations stay.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let stations = self
            .client
            .get_closest_stations(self.coordinates, self.options.station_count)
            .await?;
        self.stations = stations;
        Ok(())
    }

    /// Switch to the saved location if it moved. Returns whether it did.
    pub fn check_location(&mut self) -> bool {
        match self.store.load() {
            Some(saved) if saved != self.coordinates => {
                info!(
                    "Location changed to {}, {}",
                    saved.lat, saved.lon
                );
                self.coordinates = saved;
                true
            }
            _ => false,
        }
    }

    pub fn screen(&self) -> String {
        render::render_dashboard(&self.stations, &Local::now(), self.options.width)
    }

    pub fn draw<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(out, "{}{}", CLEAR_SCREEN, self.screen())?;
        out.flush()
    }

    /// Run until `shutdown` resolves.
    pub async fn run<W, F>(mut self, mut out: W, shutdown: F) -> std::io::Result<()>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        info!(
            "Watching {} for {}, {} every {:?}",
            self.client.endpoint(),
            self.coordinates.lat,
            self.coordinates.lon,
            self.options.refresh
        );

        let mut fetch = interval(self.options.refresh);
        fetch.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut clock = interval(Duration::from_secs(1));
        clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut location = interval(self.options.location_poll);
        location.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = fetch.tick() => {
                    self.refresh_logged().await;
                    self.draw(&mut out)?;
                }

                _ = clock.tick() => {
                    self.draw(&mut out)?;
                }

                _ = location.tick() => {
                    if self.check_location() {
                        self.refresh_logged().await;
                        fetch.reset();
                        self.draw(&mut out)?;
                    }
                }

                _ = &mut shutdown => {
                    info!("Dashboard stopped");
                    return Ok(());
                }
            }
        }
    }

    async fn refresh_logged(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!("Failed to refresh stations: {}", e);
        }
    }
}
