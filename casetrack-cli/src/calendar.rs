use anyhow::{Context, Result};
use casetrack_core::{Case, total_days_granted};
use chrono::{Days, NaiveDate};
use std::path::Path;

/// All-day calendar entry for one case's effective deadline.
pub struct DeadlineEvent {
    pub case_id: String,
    pub date: NaiveDate,
    pub summary: String,
    pub description: String,
}

/// Terminal cases are left off the calendar.
pub fn cases_to_events(cases: &[Case], today: NaiveDate) -> Vec<DeadlineEvent> {
    cases
        .iter()
        .filter(|c| !c.status.is_terminal())
        .map(|c| {
            let granted = total_days_granted(&c.extensions);
            DeadlineEvent {
                case_id: c.id.clone(),
                date: c.effective_deadline(today),
                summary: format!("Deadline: {} ({})", c.style, c.case_ref),
                description: format!(
                    "Case: {}\nStatus: {}\nBase deadline: {}\nExtensions: {} (+{} days)\n",
                    c.id,
                    c.status,
                    c.base_deadline,
                    c.extensions.len(),
                    granted
                ),
            }
        })
        .collect()
}

/// Emit a minimal ICS calendar of all-day VEVENT blocks.
///
/// UIDs derive from the case id so re-imports update rather than duplicate.
pub fn events_to_ics(events: &[DeadlineEvent]) -> String {
    let mut s = String::new();
    s.push_str("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//casetrack//EN\r\n");

    for e in events {
        let end = e.date.checked_add_days(Days::new(1)).unwrap_or(e.date);

        s.push_str("BEGIN:VEVENT\r\n");
        s.push_str(&format!("UID:deadline-{}@casetrack\r\n", escape_ics(&e.case_id)));
        s.push_str(&format!("DTSTART;VALUE=DATE:{}\r\n", e.date.format("%Y%m%d")));
        s.push_str(&format!("DTEND;VALUE=DATE:{}\r\n", end.format("%Y%m%d")));
        s.push_str(&format!("SUMMARY:{}\r\n", escape_ics(&e.summary)));
        s.push_str(&format!("DESCRIPTION:{}\r\n", escape_ics(&e.description)));
        s.push_str("END:VEVENT\r\n");
    }

    s.push_str("END:VCALENDAR\r\n");
    s
}

fn escape_ics(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

pub fn write_ics(ics: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(p) => {
            std::fs::write(p, ics).with_context(|| format!("write {}", p.display()))?;
            println!("Wrote {}", p.display());
        }
        None => print!("{ics}"),
    }
    Ok(())
}
