//! The four stages wired together: load, normalize, aggregate, assemble.

use bytes::Bytes;
use tracing::{info, warn};

use crate::aggregate::aggregate;
use crate::archive::GtfsArchive;
use crate::assemble::{StopSummary, assemble};
use crate::error::SummaryError;
use crate::normalize::NormalizedFeed;

/// Summarizes an already normalized feed. One row per stop, in stop order.
pub fn summarize(feed: NormalizedFeed) -> Vec<StopSummary> {
    info!("Merging data to find routes for each stop...");
    let (info, stats) = aggregate(&feed);
    if stats.joined == 0 && !feed.visits.is_empty() {
        warn!(
            dropped = stats.dropped(),
            "No stop_times row matched a trip and route; every stop will be unserved"
        );
    }

    let rows = assemble(feed.stops, &info);
    info!(stops = rows.len(), "Stop summaries assembled");
    rows
}

/// Summarizes a zipped GTFS feed held in memory.
pub fn summarize_archive(bytes: impl Into<Bytes>) -> Result<Vec<StopSummary>, SummaryError> {
    let mut archive = GtfsArchive::from_bytes(bytes)?;
    let feed = archive.load_feed()?;
    Ok(summarize(feed))
}
