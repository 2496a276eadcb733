//! Per-feed arrival snapshots and their merge into station schedules

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use super::{parse_stop_id, proto::FeedMessage, Arrival, Direction};
use crate::gtfs::TransitNetwork;

/// Arrivals extracted from one decoded feed, keyed by station id.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub feed_id: u32,
    pub fetched_at: DateTime<Utc>,
    pub arrivals: HashMap<String, HashMap<Direction, Vec<Arrival>>>,
}

/// Upcoming arrivals at one station across every feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationSchedule {
    pub arrivals: BTreeMap<Direction, Vec<Arrival>>,
    pub updated: Option<DateTime<Utc>>,
}

impl FeedSnapshot {
    pub fn empty(feed_id: u32, fetched_at: DateTime<Utc>) -> Self {
        Self {
            feed_id,
            fetched_at,
            arrivals: HashMap::new(),
        }
    }

    pub fn from_feed(
        feed_id: u32,
        network: &TransitNetwork,
        feed: &FeedMessage,
        now: DateTime<Utc>,
    ) -> Self {
        let mut snapshot = Self::empty(feed_id, now);
        let mut skipped = 0usize;

        let trip_updates = feed
            .entity
            .iter()
            .filter(|entity| !entity.is_deleted.unwrap_or(false))
            .filter_map(|entity| entity.trip_update.as_ref());

        for trip_update in trip_updates {
            let trip_id = trip_update.trip.trip_id.clone().unwrap_or_default();
            let route_id = trip_update.trip.route_id.clone().unwrap_or_default();

            for update in &trip_update.stop_time_update {
                let Some((stop_id, direction)) =
                    update.stop_id.as_deref().and_then(parse_stop_id)
                else {
                    skipped += 1;
                    continue;
                };
                let Some(station) = network.station_for_stop(stop_id) else {
                    skipped += 1;
                    continue;
                };
                let Some(time) = update
                    .arrival
                    .as_ref()
                    .and_then(|event| event.time)
                    .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
                else {
                    continue;
                };
                if time <= now {
                    continue;
                }

                snapshot
                    .arrivals
                    .entry(station.id.clone())
                    .or_default()
                    .entry(direction)
                    .or_default()
                    .push(Arrival {
                        trip_id: trip_id.clone(),
                        route_id: route_id.clone(),
                        time,
                    });
            }
        }

        if skipped > 0 {
            debug!("Feed {}: skipped {} stop time updates with unknown stops", feed_id, skipped);
        }
        snapshot
    }

    pub fn arrival_count(&self) -> usize {
        self.arrivals
            .values()
            .flat_map(|by_direction| by_direction.values())
            .map(Vec::len)
            .sum()
    }
}

/// Merge the arrivals of `station_id` from every snapshot: future only,
/// sorted by time, one entry per trip and direction. When two feeds carry
/// the same trip the earlier arrival is kept. Updates without a trip id are
/// never merged.
pub fn merge_schedules<'a>(
    snapshots: impl IntoIterator<Item = &'a FeedSnapshot>,
    station_id: &str,
    now: DateTime<Utc>,
) -> StationSchedule {
    let mut schedule = StationSchedule::default();

    for snapshot in snapshots {
        let Some(by_direction) = snapshot.arrivals.get(station_id) else {
            continue;
        };
        let mut contributed = false;
        for (direction, arrivals) in by_direction {
            let mut upcoming = arrivals.iter().filter(|a| a.time > now).cloned().peekable();
            if upcoming.peek().is_none() {
                continue;
            }
            contributed = true;
            schedule.arrivals.entry(*direction).or_default().extend(upcoming);
        }
        if contributed {
            schedule.updated = schedule.updated.max(Some(snapshot.fetched_at));
        }
    }

    for arrivals in schedule.arrivals.values_mut() {
        arrivals.sort_by_key(|a| a.time);
        let mut seen = HashSet::new();
        arrivals.retain(|a| a.trip_id.is_empty() || seen.insert(a.trip_id.clone()));
    }
    schedule.arrivals.retain(|_, arrivals| !arrivals.is_empty());
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        feed::proto::{FeedEntity, FeedHeader, StopTimeEvent, StopTimeUpdate, TripDescriptor, TripUpdate},
        gtfs::{StopRow, TransferRow},
    };
    use chrono::Duration;

    fn network() -> TransitNetwork {
        let stop = |id: &str, name: &str| StopRow {
            stop_id: id.to_string(),
            stop_name: name.to_string(),
            stop_lat: 40.73,
            stop_lon: -73.99,
            location_type: Some(1),
            parent_station: None,
        };
        TransitNetwork::build(
            vec![stop("635", "Union Sq - 14 St"), stop("R20", "Union Sq - 14 St")],
            vec![TransferRow {
                from_stop_id: "635".to_string(),
                to_stop_id: "R20".to_string(),
                transfer_type: Some(2),
                min_transfer_time: Some(180),
            }],
        )
    }

    fn trip(id: &str, route: &str, stops: &[(&str, DateTime<Utc>)]) -> FeedEntity {
        FeedEntity {
            id: id.to_string(),
            is_deleted: None,
            trip_update: Some(TripUpdate {
                trip: TripDescriptor {
                    trip_id: Some(id.to_string()),
                    route_id: Some(route.to_string()),
                    ..Default::default()
                },
                stop_time_update: stops
                    .iter()
                    .map(|(stop_id, time)| StopTimeUpdate {
                        stop_id: Some(stop_id.to_string()),
                        arrival: Some(StopTimeEvent {
                            time: Some(time.timestamp()),
                            ..Default::default()
                        }),
                        ..Default::default()
                    })
                    .collect(),
                timestamp: None,
            }),
        }
    }

    fn feed(entity: Vec<FeedEntity>) -> FeedMessage {
        FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "1.0".to_string(),
                timestamp: None,
            },
            entity,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn arrivals_land_on_the_station_of_the_platform() {
        let now = now();
        let message = feed(vec![
            trip("t1", "4", &[("635N", now + Duration::minutes(3)), ("635S", now + Duration::minutes(4))]),
            trip("t2", "R", &[("R20N", now + Duration::minutes(1))]),
            trip("t3", "L", &[("L03N", now + Duration::minutes(2))]),
        ]);

        let snapshot = FeedSnapshot::from_feed(1, &network(), &message, now);
        let north = &snapshot.arrivals["635"][&Direction::North];
        assert_eq!(north.len(), 2);
        assert_eq!(snapshot.arrival_count(), 3);
    }

    #[test]
    fn past_and_timeless_updates_are_dropped() {
        let now = now();
        let mut entity = trip("t1", "6", &[("635N", now - Duration::minutes(1)), ("635S", now)]);
        if let Some(update) = entity.trip_update.as_mut() {
            update.stop_time_update.push(StopTimeUpdate {
                stop_id: Some("635N".to_string()),
                ..Default::default()
            });
        }

        let snapshot = FeedSnapshot::from_feed(1, &network(), &feed(vec![entity]), now);
        assert_eq!(snapshot.arrival_count(), 0);
    }

    #[test]
    fn decoded_bytes_round_trip_through_prost() {
        use prost::Message;

        let now = now();
        let message = feed(vec![trip("t1", "4", &[("635N", now + Duration::minutes(3))])]);
        let decoded = FeedMessage::decode(message.encode_to_vec().as_slice()).unwrap();
        let snapshot = FeedSnapshot::from_feed(2, &network(), &decoded, now);
        assert_eq!(snapshot.arrivals["635"][&Direction::North][0].route_id, "4");
    }

    #[test]
    fn merge_sorts_dedups_and_tracks_latest_fetch() {
        let now = now();
        let net = network();
        let first = FeedSnapshot::from_feed(
            1,
            &net,
            &feed(vec![
                trip("t1", "4", &[("635N", now + Duration::minutes(9))]),
                trip("t2", "5", &[("635N", now + Duration::minutes(2))]),
            ]),
            now,
        );
        let mut second = FeedSnapshot::from_feed(
            16,
            &net,
            &feed(vec![
                trip("t3", "N", &[("R20N", now + Duration::minutes(5))]),
                trip("t1", "4", &[("635N", now + Duration::minutes(12))]),
            ]),
            now,
        );
        second.fetched_at = now + Duration::seconds(5);

        let schedule = merge_schedules([&first, &second], "635", now);
        let trips: Vec<&str> = schedule.arrivals[&Direction::North]
            .iter()
            .map(|a| a.trip_id.as_str())
            .collect();
        assert_eq!(trips, ["t2", "t3", "t1"]);
        assert_eq!(schedule.arrivals[&Direction::North][2].time, now + Duration::minutes(9));
        assert_eq!(schedule.updated, Some(now + Duration::seconds(5)));
        assert!(!schedule.arrivals.contains_key(&Direction::South));
    }

    #[test]
    fn merge_filters_arrivals_that_have_since_passed() {
        let now = now();
        let snapshot = FeedSnapshot::from_feed(
            1,
            &network(),
            &feed(vec![trip("t1", "4", &[("635S", now + Duration::minutes(1))])]),
            now,
        );

        let later = merge_schedules([&snapshot], "635", now + Duration::minutes(2));
        assert!(later.arrivals.is_empty());
        assert_eq!(later.updated, None);
    }

    #[test]
    fn updated_comes_only_from_feeds_with_upcoming_arrivals() {
        let now = now();
        let net = network();
        let fresh = FeedSnapshot::from_feed(
            1,
            &net,
            &feed(vec![trip("t1", "4", &[("635N", now + Duration::minutes(10))])]),
            now,
        );
        let mut stale = FeedSnapshot::from_feed(
            16,
            &net,
            &feed(vec![trip("t2", "N", &[("R20S", now + Duration::minutes(1))])]),
            now,
        );
        stale.fetched_at = now + Duration::seconds(30);

        let schedule = merge_schedules([&fresh, &stale], "635", now + Duration::minutes(2));
        assert_eq!(schedule.arrivals[&Direction::North].len(), 1);
        assert_eq!(schedule.updated, Some(now));
    }

    #[test]
    fn arrivals_without_trip_id_are_all_kept() {
        let now = now();
        let mut message = feed(vec![
            trip("", "4", &[("635N", now + Duration::minutes(2))]),
            trip("", "5", &[("635N", now + Duration::minutes(4))]),
            trip("", "6", &[("635N", now + Duration::minutes(6))]),
        ]);
        for entity in &mut message.entity {
            if let Some(update) = entity.trip_update.as_mut() {
                update.trip.trip_id = None;
            }
        }

        let snapshot = FeedSnapshot::from_feed(1, &network(), &message, now);
        let schedule = merge_schedules([&snapshot], "635", now);
        let routes: Vec<&str> = schedule.arrivals[&Direction::North]
            .iter()
            .map(|a| a.route_id.as_str())
            .collect();
        assert_eq!(routes, ["4", "5", "6"]);
    }
}
