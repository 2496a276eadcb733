//! mtapi - Nearest-station subway arrivals from the MTA realtime feeds
//! 
//! This library loads the static GTFS station list, polls the GTFS-realtime
//! feeds, serves arrivals over JSON-RPC and renders a terminal dashboard
//! against that API.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod gtfs;
pub mod protocol;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::{create_router, RouterOptions};
pub use config::Config;
pub use error::{Error, Result};
pub use gtfs::{Coordinates, TransitNetwork};
pub use state::AppState;
pub use utils::signals::shutdown_signal;
