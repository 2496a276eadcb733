//! Station cards as plain text

use std::fmt::{Display, Write};

use chrono::{DateTime, TimeZone, Utc};

use super::duration::{humanize, round_minutes};
use crate::{feed::Direction, protocol::Station};

/// Arrival rows per direction; shorter lists are padded so cards line up.
pub const ARRIVAL_ROWS: usize = 5;

const UPTOWN: &str = "Uptown / Manhattan";
const DOWNTOWN: &str = "Downtown / Brooklyn";

/// Render the clock header followed by one card per station.
pub fn render_dashboard<Tz>(stations: &[Station], now: &DateTime<Tz>, width: usize) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    let _ = writeln!(out, "{}", now.format("%b %-d, %Y, %-I:%M:%S %p"));

    let now = now.with_timezone(&Utc);
    for station in stations {
        out.push('\n');
        out.push_str(&render_station(station, now, width));
    }
    out
}

pub fn render_station(station: &Station, now: DateTime<Utc>, width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", truncate(&station.name, width));
    out.push('\n');

    for (header, direction) in [(UPTOWN, Direction::North), (DOWNTOWN, Direction::South)] {
        let _ = writeln!(out, "{}", header);
        for row in arrival_rows(station, direction, now) {
            let _ = writeln!(out, "{}", truncate(&row, width));
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{}", updated_label(station.updated, now));
    out
}

/// Upcoming arrivals in one direction as exactly `ARRIVAL_ROWS` lines.
pub fn arrival_rows(station: &Station, direction: Direction, now: DateTime<Utc>) -> Vec<String> {
    let mut upcoming: Vec<_> = station
        .arrivals(direction)
        .iter()
        .filter(|update| update.arrival >= now)
        .collect();
    upcoming.sort_by_key(|update| update.arrival);

    let mut rows: Vec<String> = upcoming
        .into_iter()
        .take(ARRIVAL_ROWS)
        .map(|update| {
            format!("{}: {}", update.route_id, humanize(update.arrival - now))
        })
        .collect();

    if rows.is_empty() {
        rows.push("-".to_string());
    }
    rows.resize(ARRIVAL_ROWS, String::new());
    rows
}

/// `~N min ago`, or `recently` when the last update is under half a minute
/// old or unknown.
pub fn updated_label(updated: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match updated.map(|at| round_minutes(at - now)) {
        Some(minutes) if minutes != 0 => format!("~{} min ago", minutes.unsigned_abs()),
        _ => "recently".to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if width == 0 || text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{gtfs::Coordinates, protocol::Update};
    use chrono::{Duration, FixedOffset};
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 19, 4, 5).unwrap()
    }

    fn update(route: &str, minutes: i64) -> Update {
        Update {
            trip_id: format!("{route}-{minutes}"),
            arrival: now() + Duration::minutes(minutes),
            route_id: route.to_string(),
        }
    }

    fn union_square(north: Vec<Update>, south: Vec<Update>) -> Station {
        Station {
            id: "L03".to_string(),
            name: "Union Sq - 14 St".to_string(),
            coordinates: Coordinates::new(40.734789, -73.990730),
            stop_ids: vec![],
            schedules: BTreeMap::from([(Direction::North, north), (Direction::South, south)]),
            updated: Some(now() - Duration::minutes(2)),
        }
    }

    #[test]
    fn rows_are_sorted_truncated_and_padded() {
        let station = union_square(
            vec![
                update("6", 9),
                update("4", 2),
                update("L", -1),
                update("5", 4),
                update("N", 1),
                update("Q", 3),
                update("R", 7),
            ],
            vec![update("L", 3)],
        );

        let north = arrival_rows(&station, Direction::North, now());
        assert_eq!(north, ["N: 1m", "4: 2m", "Q: 3m", "5: 4m", "R: 7m"]);

        let south = arrival_rows(&station, Direction::South, now());
        assert_eq!(south, ["L: 3m", "", "", "", ""]);
    }

    #[test]
    fn empty_direction_shows_a_dash() {
        let station = union_square(vec![], vec![]);
        let rows = arrival_rows(&station, Direction::North, now());
        assert_eq!(rows.len(), ARRIVAL_ROWS);
        assert_eq!(rows[0], "-");
    }

    #[test]
    fn updated_footer() {
        let now = now();
        assert_eq!(updated_label(Some(now - Duration::minutes(3)), now), "~3 min ago");
        assert_eq!(updated_label(Some(now - Duration::seconds(10)), now), "recently");
        assert_eq!(updated_label(None, now), "recently");
    }

    #[test]
    fn long_names_are_cut_to_width() {
        assert_eq!(truncate("42 St - Port Authority Bus Terminal", 12), "42 St - Por…");
        assert_eq!(truncate("14 St", 12), "14 St");
        assert_eq!(truncate("14 St", 0), "14 St");
    }

    #[test]
    fn card_layout() {
        let station = union_square(vec![update("4", 2)], vec![]);
        let card = render_station(&station, now(), 40);
        let lines: Vec<&str> = card.lines().collect();
        assert_eq!(lines[0], "Union Sq - 14 St");
        assert_eq!(lines[2], "Uptown / Manhattan");
        assert_eq!(lines[3], "4: 2m");
        assert_eq!(lines[9], "Downtown / Brooklyn");
        assert_eq!(lines[10], "-");
        assert_eq!(lines.last(), Some(&"~2 min ago"));
    }

    #[test]
    fn header_uses_the_callers_clock() {
        let eastern = FixedOffset::west_opt(4 * 3600).unwrap();
        let screen = render_dashboard(&[], &now().with_timezone(&eastern), 30);
        assert_eq!(screen, "Oct 16, 2026, 3:04:05 PM\n");
    }
}
