//! Failure taxonomy for a summary run.
//!
//! Rows dropped for a missing `stop_code` and join misses are not errors;
//! they are counted and logged where they happen. Everything here aborts the
//! run before any output is written.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse failure category reported to the user when a run aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// The four GTFS tables could not be produced.
    SourceUnavailable,
    /// Anything else: malformed tables, output I/O.
    UnexpectedFailure,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCategory::SourceUnavailable => f.write_str("SourceUnavailable"),
            FailureCategory::UnexpectedFailure => f.write_str("UnexpectedFailure"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("package metadata lookup failed: {0}")]
    MetadataLookup(String),

    #[error("no ZIP resource found in package {package_id:?}")]
    NoArchiveResource { package_id: String },

    #[error("download failed: {0}")]
    Download(String),

    #[error("the downloaded file is not a valid zip file")]
    BadArchive(#[source] zip::result::ZipError),

    #[error("archive is missing required table {0:?}")]
    MissingTable(&'static str),

    #[error("malformed table {table}: {source}")]
    MalformedTable {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write output {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SummaryError {
    pub fn category(&self) -> FailureCategory {
        match self {
            SummaryError::MetadataLookup(_)
            | SummaryError::NoArchiveResource { .. }
            | SummaryError::Download(_)
            | SummaryError::BadArchive(_)
            | SummaryError::MissingTable(_) => FailureCategory::SourceUnavailable,
            SummaryError::MalformedTable { .. } | SummaryError::Output { .. } => {
                FailureCategory::UnexpectedFailure
            }
        }
    }
}
