//! Raw GTFS rows as they come out of the feed's text files.
//!
//! Each struct declares only the columns this tool reads; any other column in
//! the file is ignored by the csv deserializer.

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct StopRecord {
    pub stop_id: String,
    pub stop_code: Option<String>,
    pub stop_name: String,
    /// Blank for generic nodes and boarding areas.
    pub stop_lat: Option<f64>,
    pub stop_lon: Option<f64>,
    #[serde(rename = "wheelchair_boarding")]
    pub accessibility: Option<u8>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub route_id: String,
    pub route_short_name: Option<String>,
    /// Unparseable codes read as missing; both fall back to bus downstream.
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub route_type: Option<i32>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub trip_id: String,
    pub route_id: String,
    pub trip_headsign: Option<String>,
}

/// Only the (trip, stop) pair; arrival and departure times are never read.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct StopTimeRecord {
    pub trip_id: String,
    pub stop_id: String,
}
