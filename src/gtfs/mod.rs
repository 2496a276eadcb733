//! GTFS static data
//!
//! Loads `stops.txt` and `transfers.txt` and groups stops connected by
//! in-station transfers into stations.

pub mod network;
pub mod rows;

use serde::{Deserialize, Serialize};

pub use network::{clamp_station_count, Station, Stop, TransitNetwork, MAX_CLOSEST};
pub use rows::{StopRow, TransferRow};

/// A point on the Earth's surface, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "Lat", alias = "lat")]
    pub lat: f64,
    #[serde(rename = "Lon", alias = "lon")]
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}
