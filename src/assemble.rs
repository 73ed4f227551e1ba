//! Left join of the aggregated service info back onto every stop.

use std::collections::HashMap;

use serde::Serialize;

use crate::aggregate::StopInfo;
use crate::normalize::{Mode, Stop};

/// One output row. Field order is the column order of the written table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopSummary {
    pub stop_id: String,
    pub stop_code: i64,
    pub stop_name: String,
    pub stop_lat: Option<f64>,
    pub stop_lon: Option<f64>,
    #[serde(rename = "Routes")]
    pub routes: String,
    /// Empty when no trip calls at the stop.
    #[serde(rename = "Direction")]
    pub direction: String,
    #[serde(rename = "Accessibility")]
    pub accessibility: Option<u8>,
    #[serde(rename = "Type")]
    pub mode: String,
}

impl StopSummary {
    fn new(stop: Stop, info: Option<&StopInfo>) -> Self {
        let (routes, direction, mode) = match info {
            Some(info) => (
                info.routes.clone(),
                info.direction.label().to_string(),
                info.mode,
            ),
            None => (String::new(), String::new(), Mode::Bus),
        };

        StopSummary {
            stop_id: stop.stop_id,
            stop_code: stop.stop_code,
            stop_name: stop.stop_name,
            stop_lat: stop.stop_lat,
            stop_lon: stop.stop_lon,
            routes,
            direction,
            accessibility: stop.accessibility,
            mode: mode.label().to_string(),
        }
    }
}

/// Produces exactly one row per stop, in stop order.
pub fn assemble(stops: Vec<Stop>, info: &HashMap<String, StopInfo>) -> Vec<StopSummary> {
    stops
        .into_iter()
        .map(|stop| {
            let found = info.get(&stop.stop_id);
            StopSummary::new(stop, found)
        })
        .collect()
}
