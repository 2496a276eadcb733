//! GTFS-realtime ingestion
//!
//! Feeds are fetched over HTTP, decoded with prost and reduced to per-station
//! arrival lists. Each feed's snapshot is replaced wholesale on every fetch.
//! The per-line service status comes from a separate XML document.

pub mod client;
pub mod proto;
pub mod service_status;
pub mod snapshot;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use client::{FeedClient, FeedConfig, DEFAULT_FEED_BASE_URL, DEFAULT_FEED_IDS};
pub use service_status::{
    LineStatus, Service, ServiceStatusClient, DEFAULT_SERVICE_STATUS_URL,
};
pub use snapshot::{merge_schedules, FeedSnapshot, StationSchedule};

/// Direction of travel encoded in the last character of a platform id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "S")]
    South,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::South => "S",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrival {
    pub trip_id: String,
    pub route_id: String,
    pub time: DateTime<Utc>,
}

/// Split a platform id such as `635N` into its parent stop and direction.
pub fn parse_stop_id(platform_id: &str) -> Option<(&str, Direction)> {
    let direction = match platform_id.chars().last()? {
        'N' => Direction::North,
        'S' => Direction::South,
        _ => return None,
    };
    let stop_id = &platform_id[..platform_id.len() - 1];
    if stop_id.is_empty() {
        return None;
    }
    Some((stop_id, direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_ids_split_into_stop_and_direction() {
        assert_eq!(parse_stop_id("635N"), Some(("635", Direction::North)));
        assert_eq!(parse_stop_id("L03S"), Some(("L03", Direction::South)));
        assert_eq!(parse_stop_id("N"), None);
        assert_eq!(parse_stop_id("635"), None);
        assert_eq!(parse_stop_id(""), None);
    }

    #[test]
    fn direction_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&Direction::North).unwrap(), "\"N\"");
        assert_eq!(Direction::South.to_string(), "S");
    }
}
