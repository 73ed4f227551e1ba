//! Persistence of the stop summary table.
//!
//! The table is serialized into a temporary sibling file and renamed over the
//! destination once complete, so a failed run never leaves a truncated file.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, info};

use crate::assemble::StopSummary;
use crate::error::SummaryError;

/// Writes the summary rows as CSV to `path`, gzip-compressed when `gzip` is
/// set or the path ends in `.gz`.
///
/// Returns the number of rows written.
pub fn write_summaries(
    path: &Path,
    rows: &[StopSummary],
    gzip: bool,
) -> Result<usize, SummaryError> {
    let gzip = gzip || path.extension().is_some_and(|e| e == "gz");
    let tmp = temp_path(path);
    debug!(path = %path.display(), tmp = %tmp.display(), gzip, "Writing stop summaries");

    let io_err = |source: std::io::Error| SummaryError::Output {
        path: path.to_path_buf(),
        source,
    };

    let written = File::create(&tmp).map_err(io_err).and_then(|file| {
        let file = BufWriter::new(file);
        if gzip {
            let encoder = GzEncoder::new(file, Compression::default());
            let encoder = write_csv(encoder, rows).map_err(io_err)?;
            encoder.finish().and_then(finish).map_err(io_err)
        } else {
            write_csv(file, rows).and_then(finish).map_err(io_err)
        }
    });

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        io_err(source)
    })?;

    let shown = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    info!(rows = rows.len(), path = %shown.display(), "Saved stop summaries");
    Ok(rows.len())
}

/// Serializes `rows` with a header line into `w` and hands the writer back.
fn write_csv<W: Write>(w: W, rows: &[StopSummary]) -> std::io::Result<W> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(w);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    writer.into_inner().map_err(|e| e.into_error())
}

fn finish(mut file: BufWriter<File>) -> std::io::Result<()> {
    file.flush()?;
    file.into_inner()
        .map_err(|e| e.into_error())?
        .sync_all()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::env;
    use std::io::Read;

    fn temp_file(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_write_header_and_rows_in_column_order() {
        let path = temp_file("gtfs_stop_summary_test_rows.csv");
        let _ = fs::remove_file(&path);

        let n = write_summaries(&path, &[served(), unserved()], false).unwrap();

        assert_eq!(n, 2);
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines[0],
            "stop_id,stop_code,stop_name,stop_lat,stop_lon,Routes,Direction,Accessibility,Type"
        );
        assert_eq!(
            lines[1],
            "14238,1001,Queen St West at Spadina Ave,43.6487,-79.3958,501 | 510,Westbound,1,Streetcar"
        );
        assert_eq!(lines[2], "99,2002,Lonely Stop,,,,,,Bus");
        assert_eq!(lines.len(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let path = temp_file("gtfs_stop_summary_test_replace.csv");
        fs::write(&path, "stale contents\n").unwrap();

        write_summaries(&path, &[unserved()], false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("stale"));
        assert!(!temp_path(&path).exists());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_gzip() {
        let path = temp_file("gtfs_stop_summary_test_gzip.csv.gz");
        let _ = fs::remove_file(&path);

        write_summaries(&path, &[served()], false).unwrap();

        let mut content = String::new();
        GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.starts_with("stop_id,stop_code"));
        assert!(content.contains("501 | 510"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_failed_write_leaves_nothing_behind() {
        let path = temp_file("gtfs_stop_summary_missing_dir/stops.csv");

        let err = write_summaries(&path, &[served()], false).unwrap_err();

        assert!(matches!(err, SummaryError::Output { .. }));
        assert!(!path.exists());
        assert!(!temp_path(&path).exists());
    }

    fn served() -> StopSummary {
        StopSummary {
            stop_id: "14238".to_string(),
            stop_code: 1001,
            stop_name: "Queen St West at Spadina Ave".to_string(),
            stop_lat: Some(43.6487),
            stop_lon: Some(-79.3958),
            routes: "501 | 510".to_string(),
            direction: "Westbound".to_string(),
            accessibility: Some(1),
            mode: "Streetcar".to_string(),
        }
    }

    fn unserved() -> StopSummary {
        StopSummary {
            stop_id: "99".to_string(),
            stop_code: 2002,
            stop_name: "Lonely Stop".to_string(),
            stop_lat: None,
            stop_lon: None,
            routes: String::new(),
            direction: String::new(),
            accessibility: None,
            mode: "Bus".to_string(),
        }
    }
}
