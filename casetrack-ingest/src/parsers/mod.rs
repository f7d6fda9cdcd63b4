pub mod case_csv;

pub use case_csv::{parse_cases_csv, parse_cases_csv_reader};
