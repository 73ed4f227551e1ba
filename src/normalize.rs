//! Projection and cleanup of the raw GTFS tables.
//!
//! Produces the working set the aggregation runs over: valid stops in feed
//! order, routes and trips keyed by id, and the deduplicated set of
//! (trip, stop) visits.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, info};

use crate::gtfs::{RouteRecord, StopRecord, StopTimeRecord, TripRecord};

/// Transit mode derived from a GTFS `route_type`.
///
/// | route_type | Mode      |
/// |------------|-----------|
/// | 0          | Streetcar |
/// | 1          | Subway    |
/// | 2          | Rail      |
/// | 3, other   | Bus       |
///
/// Variant order is the tie-break order used when a stop's trips are split
/// evenly between modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mode {
    #[default]
    Bus,
    Streetcar,
    Subway,
    Rail,
}

impl Mode {
    pub fn from_route_type(route_type: Option<i32>) -> Self {
        match route_type {
            Some(0) => Mode::Streetcar,
            Some(1) => Mode::Subway,
            Some(2) => Mode::Rail,
            _ => Mode::Bus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Bus => "Bus",
            Mode::Streetcar => "Streetcar",
            Mode::Subway => "Subway",
            Mode::Rail => "Rail",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub stop_id: String,
    pub stop_code: i64,
    pub stop_name: String,
    pub stop_lat: Option<f64>,
    pub stop_lon: Option<f64>,
    /// `wheelchair_boarding` as published: 0 unknown, 1 some access, 2 none.
    pub accessibility: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub route_id: String,
    pub short_name: String,
    pub mode: Mode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub trip_id: String,
    pub route_id: String,
    pub headsign: Option<String>,
}

/// Deduplicated (trip_id, stop_id) pairs from `stop_times.txt`.
#[derive(Debug, Default)]
pub struct StopVisits {
    pairs: HashSet<StopTimeRecord>,
    seen: usize,
}

impl StopVisits {
    /// Records one scheduled visit. Returns `false` if the pair was already known.
    pub fn insert(&mut self, visit: StopTimeRecord) -> bool {
        self.seen += 1;
        self.pairs.insert(visit)
    }

    /// Number of distinct pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of rows inserted, duplicates included.
    pub fn rows_seen(&self) -> usize {
        self.seen
    }

    pub fn iter(&self) -> impl Iterator<Item = &StopTimeRecord> {
        self.pairs.iter()
    }
}

impl FromIterator<StopTimeRecord> for StopVisits {
    fn from_iter<I: IntoIterator<Item = StopTimeRecord>>(iter: I) -> Self {
        let mut visits = StopVisits::default();
        for visit in iter {
            visits.insert(visit);
        }
        visits
    }
}

/// The four tables after projection, ready to be joined.
#[derive(Debug, Default)]
pub struct NormalizedFeed {
    pub stops: Vec<Stop>,
    pub routes: HashMap<String, Route>,
    pub trips: HashMap<String, Trip>,
    pub visits: StopVisits,
    /// Stop rows dropped for a missing or non-integer `stop_code`.
    pub rejected_stops: usize,
}

impl NormalizedFeed {
    pub fn from_tables(
        stops: impl IntoIterator<Item = StopRecord>,
        routes: impl IntoIterator<Item = RouteRecord>,
        trips: impl IntoIterator<Item = TripRecord>,
        visits: StopVisits,
    ) -> Self {
        let (stops, rejected_stops) = normalize_stops(stops);
        let feed = NormalizedFeed {
            stops,
            routes: normalize_routes(routes),
            trips: normalize_trips(trips),
            visits,
            rejected_stops,
        };

        info!(
            stops = feed.stops.len(),
            rejected_stops = feed.rejected_stops,
            routes = feed.routes.len(),
            trips = feed.trips.len(),
            visits = feed.visits.len(),
            "Feed normalized"
        );
        feed
    }
}

/// Keeps stops with a usable integer `stop_code`, in input order.
///
/// Returns the kept stops and the number of rows rejected.
pub fn normalize_stops(records: impl IntoIterator<Item = StopRecord>) -> (Vec<Stop>, usize) {
    let mut stops = Vec::new();
    let mut rejected = 0;

    for r in records {
        let Some(stop_code) = r.stop_code.as_deref().and_then(parse_stop_code) else {
            debug!(stop_id = %r.stop_id, raw = ?r.stop_code, "Dropping stop without usable stop_code");
            rejected += 1;
            continue;
        };

        stops.push(Stop {
            stop_id: r.stop_id,
            stop_code,
            stop_name: r.stop_name,
            stop_lat: r.stop_lat,
            stop_lon: r.stop_lon,
            accessibility: r.accessibility,
        });
    }

    (stops, rejected)
}

pub fn normalize_routes(records: impl IntoIterator<Item = RouteRecord>) -> HashMap<String, Route> {
    records
        .into_iter()
        .map(|r| {
            let route = Route {
                short_name: r.route_short_name.unwrap_or_default(),
                mode: Mode::from_route_type(r.route_type),
                route_id: r.route_id,
            };
            (route.route_id.clone(), route)
        })
        .collect()
}

pub fn normalize_trips(records: impl IntoIterator<Item = TripRecord>) -> HashMap<String, Trip> {
    records
        .into_iter()
        .map(|r| {
            let trip = Trip {
                headsign: r.trip_headsign.filter(|h| !h.is_empty()),
                route_id: r.route_id,
                trip_id: r.trip_id,
            };
            (trip.trip_id.clone(), trip)
        })
        .collect()
}

/// Parses a `stop_code` cell. Integral floats such as `"1234.0"` are accepted.
pub fn parse_stop_code(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(code) = raw.parse::<i64>() {
        return Some(code);
    }

    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}
