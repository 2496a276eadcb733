//! Wire types of the JSON-RPC methods
//!
//! Field names are PascalCase (`ID`, `Name`, `StopIDs`, ...) so existing web
//! clients keep working. The dashboard deserializes the same types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    feed::{Arrival, Direction, Service, StationSchedule},
    gtfs::{self, Coordinates},
};

/// One upcoming train at a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    #[serde(rename = "TripID", default)]
    pub trip_id: String,
    #[serde(rename = "Arrival")]
    pub arrival: DateTime<Utc>,
    #[serde(rename = "RouteID")]
    pub route_id: String,
}

impl From<&Arrival> for Update {
    fn from(arrival: &Arrival) -> Self {
        Self {
            trip_id: arrival.trip_id.clone(),
            arrival: arrival.time,
            route_id: display_route(&arrival.route_id).to_string(),
        }
    }
}

/// Shuttle routes (`GS`, `FS`) are all shown as `S`.
pub fn display_route(route_id: &str) -> &str {
    if route_id.ends_with('S') {
        "S"
    } else {
        route_id
    }
}

pub type Schedules = BTreeMap<Direction, Vec<Update>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Coordinates")]
    pub coordinates: Coordinates,
    #[serde(rename = "StopIDs", default, skip_serializing_if = "Vec::is_empty")]
    pub stop_ids: Vec<String>,
    #[serde(rename = "Schedules", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schedules: Schedules,
    #[serde(rename = "Updated", default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl Station {
    /// Station listing entry: member stops, no arrivals.
    pub fn summary(station: &gtfs::Station) -> Self {
        Self {
            id: station.id.clone(),
            name: station.name.clone(),
            coordinates: station.coordinates,
            stop_ids: station.stop_ids.iter().cloned().collect(),
            schedules: Schedules::new(),
            updated: None,
        }
    }

    /// Station with its upcoming arrivals, sorted by arrival time.
    pub fn with_schedule(station: &gtfs::Station, schedule: &StationSchedule) -> Self {
        let schedules = schedule
            .arrivals
            .iter()
            .map(|(direction, arrivals)| {
                let mut updates: Vec<Update> = arrivals.iter().map(Update::from).collect();
                updates.sort_by_key(|u| u.arrival);
                (*direction, updates)
            })
            .collect();

        Self {
            id: station.id.clone(),
            name: station.name.clone(),
            coordinates: station.coordinates,
            stop_ids: Vec::new(),
            schedules,
            updated: schedule.updated,
        }
    }

    pub fn arrivals(&self, direction: Direction) -> &[Update] {
        self.schedules.get(&direction).map(Vec::as_slice).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetStationParams {
    #[serde(rename = "ID", alias = "Id", alias = "id")]
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetClosestParams {
    #[serde(rename = "Lat", alias = "lat")]
    pub lat: f64,
    #[serde(rename = "Lon", alias = "lon")]
    pub lon: f64,
    #[serde(rename = "NumStations", alias = "numStations", default, skip_serializing_if = "Option::is_none")]
    pub num_stations: Option<i64>,
}

impl GetClosestParams {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationsResult {
    #[serde(rename = "Stations")]
    pub stations: Vec<Station>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationResult {
    #[serde(rename = "Station")]
    pub station: Station,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatusResult {
    #[serde(rename = "Service")]
    pub service: Service,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn times_square() -> gtfs::Station {
        gtfs::Station {
            id: "127".to_string(),
            name: "Times Sq - 42 St".to_string(),
            coordinates: Coordinates::new(40.75529, -73.987495),
            stop_ids: BTreeSet::from(["127".to_string(), "725".to_string()]),
        }
    }

    #[test]
    fn shuttle_routes_collapse() {
        assert_eq!(display_route("GS"), "S");
        assert_eq!(display_route("FS"), "S");
        assert_eq!(display_route("SI"), "SI");
        assert_eq!(display_route("6X"), "6X");
    }

    #[test]
    fn summary_lists_stops_and_omits_schedules() {
        let value = serde_json::to_value(Station::summary(&times_square())).unwrap();
        assert_eq!(
            value,
            json!({
                "ID": "127",
                "Name": "Times Sq - 42 St",
                "Coordinates": { "Lat": 40.75529, "Lon": -73.987495 },
                "StopIDs": ["127", "725"],
            })
        );
    }

    #[test]
    fn schedules_are_keyed_by_direction_letter() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 16, 5, 0).unwrap();
        let schedule = StationSchedule {
            arrivals: BTreeMap::from([(
                Direction::South,
                vec![Arrival {
                    trip_id: "091250_GS.S01R".to_string(),
                    route_id: "GS".to_string(),
                    time: at,
                }],
            )]),
            updated: Some(at),
        };

        let station = Station::with_schedule(&times_square(), &schedule);
        let value = serde_json::to_value(&station).unwrap();
        assert_eq!(value["Schedules"]["S"][0]["RouteID"], "S");
        assert_eq!(value["Schedules"]["S"][0]["Arrival"], "2026-10-16T16:05:00Z");
        assert_eq!(value["Updated"], "2026-10-16T16:05:00Z");
        assert!(value.get("StopIDs").is_none());

        let back: Station = serde_json::from_value(value).unwrap();
        assert_eq!(back.arrivals(Direction::South).len(), 1);
        assert!(back.arrivals(Direction::North).is_empty());
    }

    #[test]
    fn closest_params_accept_either_case() {
        let upper: GetClosestParams =
            serde_json::from_value(json!({ "Lat": 40.7, "Lon": -73.9, "NumStations": 3 })).unwrap();
        let lower: GetClosestParams = serde_json::from_value(json!({ "lat": 40.7, "lon": -73.9 })).unwrap();
        assert_eq!(upper.num_stations, Some(3));
        assert_eq!(lower.num_stations, None);
        assert_eq!(lower.coordinates(), Coordinates::new(40.7, -73.9));
    }
}
