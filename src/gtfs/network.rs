//! Stations built from GTFS stops and transfers

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashMap},
    path::Path,
};

use geo::{Distance, Haversine, Point};
use itertools::Itertools;
use tracing::{debug, info};

use super::{
    rows::{read_rows, StopRow, TransferRow},
    Coordinates,
};
use crate::error::{Error, Result};

/// Upper bound for nearest-station queries.
pub const MAX_CLOSEST: usize = 5;

/// Stops that share transfers with a complex but are reported on their own.
const SEPARATE_STOPS: [&str; 2] = ["A27", "132"];

/// Stops whose display name is taken from another stop in the same complex.
const NAME_SOURCES: [(&str, &str); 1] = [("L03", "R20")];

#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinates,
}

/// A group of stops passengers can transfer between without leaving the
/// system.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinates,
    pub stop_ids: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct TransitNetwork {
    stops: HashMap<String, Stop>,
    stations: BTreeMap<String, Station>,
    station_by_stop: HashMap<String, String>,
}

/// Clamp a requested station count to `1..=MAX_CLOSEST`.
pub fn clamp_station_count(requested: i64) -> usize {
    requested.clamp(1, MAX_CLOSEST as i64) as usize
}

impl TransitNetwork {
    /// Load `stops.txt` and `transfers.txt` from a GTFS directory.
    pub fn load(gtfs_dir: &Path) -> Result<Self> {
        let stops: Vec<StopRow> = read_rows(&gtfs_dir.join("stops.txt"))?;
        let transfers: Vec<TransferRow> = read_rows(&gtfs_dir.join("transfers.txt"))?;
        let network = Self::build(stops, transfers);
        info!(
            "Loaded {} stops into {} stations from {}",
            network.stops.len(),
            network.stations.len(),
            gtfs_dir.display()
        );
        Ok(network)
    }

    pub fn build(stop_rows: Vec<StopRow>, transfer_rows: Vec<TransferRow>) -> Self {
        let stops: HashMap<String, Stop> = stop_rows
            .into_iter()
            .filter(StopRow::is_parent)
            .map(|row| {
                let stop = Stop {
                    id: row.stop_id,
                    name: row.stop_name,
                    coordinates: Coordinates::new(row.stop_lat, row.stop_lon),
                };
                (stop.id.clone(), stop)
            })
            .collect();

        let mut station_by_stop: HashMap<String, String> = HashMap::new();
        let mut members: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for transfer in &transfer_rows {
            let (from, to) = (&transfer.from_stop_id, &transfer.to_stop_id);
            if !stops.contains_key(from) || !stops.contains_key(to) {
                debug!("Skipping transfer {} -> {} with unknown stop", from, to);
                continue;
            }

            let station_id = station_by_stop
                .entry(from.clone())
                .or_insert_with(|| from.clone())
                .clone();
            members.entry(station_id.clone()).or_default().insert(from.clone());

            let separate = SEPARATE_STOPS.contains(&from.as_str()) || SEPARATE_STOPS.contains(&to.as_str());
            if from == to || separate || station_by_stop.contains_key(to) {
                continue;
            }
            station_by_stop.insert(to.clone(), station_id.clone());
            members.entry(station_id).or_default().insert(to.clone());
        }

        for id in stops.keys() {
            if !station_by_stop.contains_key(id) {
                station_by_stop.insert(id.clone(), id.clone());
                members.entry(id.clone()).or_default().insert(id.clone());
            }
        }

        let stations = members
            .into_iter()
            .filter_map(|(id, stop_ids)| {
                let coordinates = stops.get(&id)?.coordinates;
                let name = stop_ids
                    .iter()
                    .map(|stop_id| display_name_source(stop_id))
                    .filter_map(|stop_id| stops.get(stop_id))
                    .map(|stop| stop.name.as_str())
                    .unique()
                    .join(" / ");
                Some((
                    id.clone(),
                    Station {
                        id,
                        name,
                        coordinates,
                        stop_ids,
                    },
                ))
            })
            .collect();

        Self {
            stops,
            stations,
            station_by_stop,
        }
    }

    /// All stations ordered by id.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn station(&self, id: &str) -> Result<&Station> {
        self.stations
            .get(id)
            .ok_or_else(|| Error::StationNotFound(id.to_string()))
    }

    /// The station a GTFS parent stop belongs to.
    pub fn station_for_stop(&self, stop_id: &str) -> Option<&Station> {
        self.station_by_stop
            .get(stop_id)
            .and_then(|station_id| self.stations.get(station_id))
    }

    /// The stations nearest to `at`, nearest first.
    pub fn closest(&self, at: Coordinates, count: i64) -> Vec<&Station> {
        let count = clamp_station_count(count);
        let origin = Point::new(at.lon, at.lat);

        self.stations
            .values()
            .map(|station| (haversine_meters(origin, station.coordinates), station))
            .sorted_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            .take(count)
            .map(|(_, station)| station)
            .collect()
    }
}

fn display_name_source(stop_id: &str) -> &str {
    NAME_SOURCES
        .iter()
        .find(|(id, _)| *id == stop_id)
        .map_or(stop_id, |(_, source)| source)
}

fn haversine_meters(origin: Point<f64>, to: Coordinates) -> f64 {
    Haversine::distance(origin, Point::new(to.lon, to.lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(id: &str, name: &str, lat: f64, lon: f64) -> StopRow {
        StopRow {
            stop_id: id.to_string(),
            stop_name: name.to_string(),
            stop_lat: lat,
            stop_lon: lon,
            location_type: Some(1),
            parent_station: None,
        }
    }

    fn transfer(from: &str, to: &str) -> TransferRow {
        TransferRow {
            from_stop_id: from.to_string(),
            to_stop_id: to.to_string(),
            transfer_type: Some(2),
            min_transfer_time: Some(180),
        }
    }

    fn union_square() -> TransitNetwork {
        TransitNetwork::build(
            vec![
                stop("635", "Union Sq - 14 St", 40.734673, -73.989951),
                stop("L03", "14 St - Union Sq", 40.734789, -73.990730),
                stop("R20", "Union Sq - 14 St", 40.735736, -73.990568),
                stop("132", "14 St", 40.737826, -74.000201),
                stop("D19", "14 St", 40.738228, -73.996209),
                stop("L02", "6 Av", 40.737335, -73.996786),
            ],
            vec![
                transfer("L03", "L03"),
                transfer("L03", "635"),
                transfer("L03", "R20"),
                transfer("635", "L03"),
                transfer("R20", "635"),
                transfer("D19", "L02"),
                transfer("D19", "132"),
                transfer("132", "D19"),
                transfer("L02", "D19"),
                transfer("L02", "X99"),
            ],
        )
    }

    #[test]
    fn transfers_merge_stops_into_one_station() {
        let network = union_square();
        let station = network.station("L03").unwrap();
        let ids: Vec<&str> = station.stop_ids.iter().map(String::as_str).collect();
        assert_eq!(ids, ["635", "L03", "R20"]);
        assert_eq!(network.station_for_stop("635").unwrap().id, "L03");
        assert_eq!(network.station_for_stop("R20").unwrap().id, "L03");
    }

    #[test]
    fn remapped_names_collapse_to_one() {
        let network = union_square();
        assert_eq!(network.station("L03").unwrap().name, "Union Sq - 14 St");
    }

    #[test]
    fn distinct_names_are_joined() {
        let network = union_square();
        assert_eq!(network.station("D19").unwrap().name, "14 St / 6 Av");
    }

    #[test]
    fn separate_stops_keep_their_own_station() {
        let network = union_square();
        assert_eq!(network.station_for_stop("132").unwrap().id, "132");
        assert_eq!(network.station("132").unwrap().name, "14 St");
        assert!(!network.station("D19").unwrap().stop_ids.contains("132"));
    }

    #[test]
    fn unknown_station_is_an_error() {
        let network = union_square();
        assert!(matches!(
            network.station("foo"),
            Err(Error::StationNotFound(id)) if id == "foo"
        ));
        assert_eq!(network.station_count(), 3);
    }

    #[test]
    fn closest_is_ordered_and_clamped() {
        let network = union_square();
        let at = Coordinates::new(40.7347908, -73.9907299);

        let one = network.closest(at, 1);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].id, "L03");

        let all: Vec<&str> = network.closest(at, 100).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(all, ["L03", "D19", "132"]);

        assert_eq!(network.closest(at, 0).len(), 1);
        assert_eq!(network.closest(at, -3).len(), 1);
    }

    #[test]
    fn haversine_distance_in_meters() {
        let origin = Point::new(-73.99, 40.0);
        let meters = haversine_meters(origin, Coordinates::new(41.0, -73.99));
        assert!((meters - 111_195.0).abs() < 1.0, "got {meters}");
        assert_eq!(haversine_meters(origin, Coordinates::new(40.0, -73.99)), 0.0);
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_station_count(i64::MIN), 1);
        assert_eq!(clamp_station_count(3), 3);
        assert_eq!(clamp_station_count(5), 5);
        assert_eq!(clamp_station_count(6), MAX_CLOSEST);
    }
}
