//! Case board CSV export parser.
//!
//! Expected header (column order free, extra columns ignored):
//!   id,style,ref,base_deadline,status,requester_email,requester_phone,extensions
//!
//! The `extensions` cell holds `;`-separated grants written as
//! `<requested-on>+<days>`, e.g. `2025-01-05+30; 2025-02-10+14`.

use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use casetrack_core::{Case, CaseStatus, Extension, MAX_EXTENSIONS, parse_base_deadline};
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::IngestError;

static EXTENSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<date>\d{4}-\d{2}-\d{2})\s*\+\s*(?P<days>-?\d+)$")
        .expect("extension pattern compiles")
});

#[derive(Debug, Deserialize)]
struct CaseRow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    style: String,
    #[serde(default, rename = "ref")]
    case_ref: String,
    #[serde(default)]
    base_deadline: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    requester_email: String,
    #[serde(default)]
    requester_phone: String,
    #[serde(default)]
    extensions: String,
}

pub fn parse_cases_csv(path: impl AsRef<Path>) -> Result<Vec<Case>, IngestError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_cases_csv_reader(file)
}

/// Parse a CSV export. Rows without an id are skipped; any other bad cell is
/// an error naming the 1-based line.
pub fn parse_cases_csv_reader<R: Read>(reader: R) -> Result<Vec<Case>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut out = Vec::new();

    for (i, result) in rdr.deserialize::<CaseRow>().enumerate() {
        // header is line 1
        let row = i + 2;
        let r = result?;

        if r.id.is_empty() {
            debug!(row, "skipping row without id");
            continue;
        }

        let base = parse_base_deadline(&r.base_deadline)
            .map_err(|source| IngestError::Case { row, source })?;

        let status = if r.status.is_empty() {
            CaseStatus::Intake
        } else {
            r.status
                .parse::<CaseStatus>()
                .map_err(|source| IngestError::Case { row, source })?
        };

        let extensions = parse_extensions(&r.id, &r.extensions, row)?;
        if extensions.len() > MAX_EXTENSIONS {
            return Err(IngestError::BadRow {
                row,
                reason: format!(
                    "{} extensions, at most {MAX_EXTENSIONS} allowed",
                    extensions.len()
                ),
            });
        }

        let mut case = Case::new(r.id, base.format("%Y-%m-%d").to_string())
            .with_style(r.style, r.case_ref)
            .with_status(status);
        case.extensions = extensions;
        case.requester_email = non_empty(r.requester_email);
        case.requester_phone = non_empty(r.requester_phone);

        out.push(case);
    }

    Ok(out)
}

fn parse_extensions(
    case_id: &str,
    cell: &str,
    row: usize,
) -> Result<Vec<Extension>, IngestError> {
    let mut out = Vec::new();

    for part in cell.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let caps = EXTENSION_RE.captures(part).ok_or_else(|| IngestError::BadRow {
            row,
            reason: format!("bad extension '{part}', expected YYYY-MM-DD+DAYS"),
        })?;

        let requested_on = NaiveDate::parse_from_str(&caps["date"], "%Y-%m-%d").map_err(|e| {
            IngestError::BadRow {
                row,
                reason: format!("bad extension date '{}': {e}", &caps["date"]),
            }
        })?;
        let days_granted: i64 = caps["days"].parse().map_err(|_| IngestError::BadRow {
            row,
            reason: format!("bad extension days '{}'", &caps["days"]),
        })?;
        if days_granted < 0 {
            warn!(row, case_id, days_granted, "negative extension grant");
        }

        out.push(Extension {
            id: format!("{}-ext-{}", case_id, out.len() + 1),
            requested_on,
            days_granted,
        });
    }

    Ok(out)
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
