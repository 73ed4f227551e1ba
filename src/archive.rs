//! Reads the four GTFS tables out of a zipped feed.

use std::io::{Cursor, Read};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::info;
use zip::ZipArchive;

use crate::error::SummaryError;
use crate::gtfs::{RouteRecord, StopRecord, StopTimeRecord, TripRecord};
use crate::normalize::{NormalizedFeed, StopVisits};

pub const STOPS: &str = "stops.txt";
pub const ROUTES: &str = "routes.txt";
pub const TRIPS: &str = "trips.txt";
pub const STOP_TIMES: &str = "stop_times.txt";

pub const REQUIRED_TABLES: [&str; 4] = [STOPS, ROUTES, TRIPS, STOP_TIMES];

/// A GTFS zip held in memory, checked to contain every required table.
pub struct GtfsArchive {
    archive: ZipArchive<Cursor<Bytes>>,
}

impl std::fmt::Debug for GtfsArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GtfsArchive")
            .field("files", &self.archive.len())
            .finish()
    }
}

impl GtfsArchive {
    /// Opens `bytes` as a zip archive.
    ///
    /// # Errors
    ///
    /// [`SummaryError::BadArchive`] if the bytes are not a zip file,
    /// [`SummaryError::MissingTable`] if any of [`REQUIRED_TABLES`] is absent.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self, SummaryError> {
        let archive =
            ZipArchive::new(Cursor::new(bytes.into())).map_err(SummaryError::BadArchive)?;

        for table in REQUIRED_TABLES {
            if !archive.file_names().any(|name| name == table) {
                return Err(SummaryError::MissingTable(table));
            }
        }

        Ok(Self { archive })
    }

    /// Deserializes every row of `table`.
    pub fn read_table<T: DeserializeOwned>(
        &mut self,
        table: &'static str,
    ) -> Result<Vec<T>, SummaryError> {
        let mut rows = Vec::new();
        self.for_each_record(table, |row| rows.push(row))?;
        Ok(rows)
    }

    /// Streams the rows of `table` into `f` without buffering the table.
    ///
    /// Returns the number of rows read.
    pub fn for_each_record<T, F>(
        &mut self,
        table: &'static str,
        mut f: F,
    ) -> Result<usize, SummaryError>
    where
        T: DeserializeOwned,
        F: FnMut(T),
    {
        let file = self
            .archive
            .by_name(table)
            .map_err(SummaryError::BadArchive)?;

        let mut count = 0;
        for result in table_reader(file).deserialize() {
            let row: T = result.map_err(|source| SummaryError::MalformedTable { table, source })?;
            f(row);
            count += 1;
        }

        Ok(count)
    }

    /// Loads and normalizes the whole feed.
    ///
    /// `stop_times.txt` is folded straight into the deduplicated visit set so
    /// only distinct (trip, stop) pairs stay in memory.
    pub fn load_feed(&mut self) -> Result<NormalizedFeed, SummaryError> {
        info!("Loading stops...");
        let stops: Vec<StopRecord> = self.read_table(STOPS)?;

        info!("Loading routes...");
        let routes: Vec<RouteRecord> = self.read_table(ROUTES)?;

        info!("Loading trips...");
        let trips: Vec<TripRecord> = self.read_table(TRIPS)?;

        info!("Loading stop_times (this is large)...");
        let mut visits = StopVisits::default();
        let rows = self.for_each_record(STOP_TIMES, |visit: StopTimeRecord| {
            visits.insert(visit);
        })?;
        info!(rows, distinct = visits.len(), "Stop times deduplicated");

        Ok(NormalizedFeed::from_tables(stops, routes, trips, visits))
    }
}

fn table_reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(rdr)
}
