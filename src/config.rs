//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};

use crate::{
    api::RouterOptions,
    dashboard::DashboardOptions,
    feed::{FeedConfig, DEFAULT_FEED_BASE_URL, DEFAULT_SERVICE_STATUS_URL},
    gtfs::{Coordinates, MAX_CLOSEST},
    tasks::DEFAULT_REFRESH_INTERVAL,
};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "mtapi")]
#[command(about = "Nearest-station subway arrivals from the MTA realtime feeds")]
#[command(version)]
pub struct Config {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll the realtime feeds and serve the JSON-RPC API
    Serve(ServeArgs),
    /// Show live arrivals for the nearest stations
    Watch(WatchArgs),
    /// Save the location the dashboard should show
    Locate(LocateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// API key from http://datamine.mta.info/
    #[arg(long, env = "MTA_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Directory holding stops.txt and transfers.txt
    #[arg(long, env = "MTAPI_GTFS_PATH")]
    pub gtfs_path: PathBuf,

    /// Port to bind the server to
    #[arg(short, long, env = "MTAPI_PORT", default_value = "3000")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Directory with index.html and /static assets
    #[arg(long, env = "MTAPI_STATIC_PATH")]
    pub static_path: Option<PathBuf>,

    /// Redirect requests not forwarded over https
    #[arg(long, env = "MTAPI_ENSURE_SSL")]
    pub ensure_ssl: bool,

    /// Realtime feed endpoint
    #[arg(long, default_value = DEFAULT_FEED_BASE_URL)]
    pub feed_url: String,

    /// MTA service status XML for GetSystemStatus
    #[arg(long, default_value = DEFAULT_SERVICE_STATUS_URL)]
    pub status_url: String,

    /// Feed ids to poll
    #[arg(long, value_delimiter = ',', default_value = "1,2,16,21,26,31")]
    pub feed_ids: Vec<u32>,

    /// Seconds between feed refreshes
    #[arg(long, default_value_t = DEFAULT_REFRESH_INTERVAL.as_secs())]
    pub refresh_secs: u64,
}

impl ServeArgs {
    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            base_url: self.feed_url.clone(),
            feed_ids: self.feed_ids.clone(),
            ..FeedConfig::new(self.api_key.clone())
        }
    }

    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            ensure_ssl: self.ensure_ssl,
            static_path: self.static_path.clone(),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Base URL of `mtapi serve`
    #[arg(long, env = "MTAPI_SERVER", default_value = "http://127.0.0.1:3000")]
    pub server: String,

    /// Latitude to look around; remembered for later runs
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude to look around; remembered for later runs
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// File the last location is kept in
    #[arg(long, env = "MTAPI_LOCATION_FILE", default_value = ".mtapi-location.json")]
    pub location_file: PathBuf,

    /// Seconds between arrival refreshes
    #[arg(long, default_value = "30")]
    pub refresh_secs: u64,

    /// Number of stations to show (1-5)
    #[arg(short = 'n', long, default_value_t = MAX_CLOSEST as i64)]
    pub stations: i64,

    /// Card width in characters; longer names are cut
    #[arg(long, default_value = "30")]
    pub width: usize,

    /// Print one screen and exit
    #[arg(long)]
    pub once: bool,
}

impl WatchArgs {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.lat?, self.lon?))
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            refresh: Duration::from_secs(self.refresh_secs.max(1)),
            station_count: self.stations,
            width: self.width,
            ..DashboardOptions::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct LocateArgs {
    #[arg(allow_hyphen_values = true)]
    pub lat: f64,

    #[arg(allow_hyphen_values = true)]
    pub lon: f64,

    /// File the location is kept in
    #[arg(long, env = "MTAPI_LOCATION_FILE", default_value = ".mtapi-location.json")]
    pub location_file: PathBuf,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
