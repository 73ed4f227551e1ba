pub mod aggregate;
pub mod archive;
pub mod assemble;
pub mod config;
pub mod direction;
pub mod error;
pub mod fetch;
pub mod gtfs;
pub mod normalize;
pub mod output;
pub mod pipeline;

pub use error::{FailureCategory, SummaryError};
