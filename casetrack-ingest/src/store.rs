//! JSON case file: the array of cases the board persists.

use std::fs;
use std::path::Path;

use casetrack_core::Case;
use tracing::debug;

use crate::error::IngestError;

pub fn parse_cases_json(s: &str) -> Result<Vec<Case>, IngestError> {
    Ok(serde_json::from_str(s)?)
}

pub fn load_cases(path: impl AsRef<Path>) -> Result<Vec<Case>, IngestError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cases = parse_cases_json(&s)?;
    debug!(path = %path.display(), count = cases.len(), "loaded cases");
    Ok(cases)
}

pub fn save_cases(path: impl AsRef<Path>, cases: &[Case]) -> Result<(), IngestError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(cases)?;
    fs::write(path, json).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}
