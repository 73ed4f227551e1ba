//! Join stop visits through trips to routes and reduce them per stop.
//!
//! One pass over the deduplicated visits fills a per-stop accumulator; a
//! second pass reduces each accumulator to a [`StopInfo`]. Visits whose trip
//! or route is unknown are dropped and counted.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{info, warn};

use crate::direction::{Direction, infer_direction};
use crate::normalize::{Mode, NormalizedFeed};

/// Separator between route names in [`StopInfo::routes`].
pub const ROUTE_SEPARATOR: &str = " | ";

/// Aggregated service at a stop that has at least one scheduled trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopInfo {
    /// Distinct route short names, sorted lexicographically, `" | "`-joined.
    pub routes: String,
    pub direction: Direction,
    pub mode: Mode,
}

/// Rows kept and dropped by the two inner joins.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JoinStats {
    pub joined: usize,
    pub missing_trip: usize,
    pub missing_route: usize,
}

impl JoinStats {
    /// Visits lost to either join.
    pub fn dropped(&self) -> usize {
        self.missing_trip + self.missing_route
    }
}

#[derive(Debug, Default)]
struct StopAccumulator {
    routes: BTreeSet<String>,
    headsigns: BTreeSet<String>,
    modes: BTreeMap<Mode, usize>,
}

impl StopAccumulator {
    fn reduce(self) -> StopInfo {
        let routes = self
            .routes
            .into_iter()
            .collect::<Vec<_>>()
            .join(ROUTE_SEPARATOR);

        StopInfo {
            routes,
            direction: infer_direction(&self.headsigns),
            mode: majority_mode(&self.modes),
        }
    }
}

/// Most frequent mode; an even split goes to the mode declared first.
fn majority_mode(counts: &BTreeMap<Mode, usize>) -> Mode {
    counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(mode, _)| *mode)
        .unwrap_or_default()
}

/// Builds the per-stop summary for every stop id that appears in the joined
/// data. Stops with no surviving visit are absent from the result.
pub fn aggregate(feed: &NormalizedFeed) -> (HashMap<String, StopInfo>, JoinStats) {
    let mut stats = JoinStats::default();
    let mut groups: HashMap<&str, StopAccumulator> = HashMap::new();

    for visit in feed.visits.iter() {
        let Some(trip) = feed.trips.get(&visit.trip_id) else {
            stats.missing_trip += 1;
            continue;
        };
        let Some(route) = feed.routes.get(&trip.route_id) else {
            stats.missing_route += 1;
            continue;
        };
        stats.joined += 1;

        let acc = groups.entry(visit.stop_id.as_str()).or_default();
        if !route.short_name.is_empty() {
            acc.routes.insert(route.short_name.clone());
        }
        if let Some(headsign) = &trip.headsign {
            acc.headsigns.insert(headsign.clone());
        }
        *acc.modes.entry(route.mode).or_default() += 1;
    }

    if stats.dropped() > 0 {
        warn!(
            missing_trip = stats.missing_trip,
            missing_route = stats.missing_route,
            "Dropped visits with no matching trip or route"
        );
    }

    let summary: HashMap<String, StopInfo> = groups
        .into_iter()
        .map(|(stop_id, acc)| (stop_id.to_string(), acc.reduce()))
        .collect();

    info!(
        joined = stats.joined,
        served_stops = summary.len(),
        "Aggregated routes per stop"
    );

    (summary, stats)
}
