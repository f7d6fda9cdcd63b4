//! casetrack-ingest: case store readers (JSON case file, CSV export).

pub mod error;
pub mod parsers;
pub mod store;

pub use error::IngestError;
pub use parsers::{parse_cases_csv, parse_cases_csv_reader};
pub use store::{load_cases, parse_cases_json, save_cases};
