//! Case model for the appeals board.
//!
//! Cases are owned by the case store; the engine only reads them. Field names
//! serialize in camelCase to match the stored JSON shape.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::deadline;
use crate::error::CaseError;

/// Upper bound on extension grants per case. Enforced by callers.
pub const MAX_EXTENSIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Intake,
    Active,
    Briefing,
    AwaitingDecision,
    Completed,
    Archived,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 6] = [
        CaseStatus::Intake,
        CaseStatus::Active,
        CaseStatus::Briefing,
        CaseStatus::AwaitingDecision,
        CaseStatus::Completed,
        CaseStatus::Archived,
    ];

    /// Terminal cases never receive reminders.
    pub fn is_terminal(self) -> bool {
        matches!(self, CaseStatus::Completed | CaseStatus::Archived)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Intake => "intake",
            CaseStatus::Active => "active",
            CaseStatus::Briefing => "briefing",
            CaseStatus::AwaitingDecision => "awaiting_decision",
            CaseStatus::Completed => "completed",
            CaseStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts "awaiting_decision", "Awaiting Decision", "awaiting-decision", ...
impl FromStr for CaseStatus {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();

        CaseStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == norm)
            .ok_or_else(|| CaseError::UnknownStatus(s.trim().to_string()))
    }
}

/// A single deadline-extension grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    pub id: String,
    pub requested_on: NaiveDate,
    /// Calendar days added to the deadline. Missing means 0.
    #[serde(default)]
    pub days_granted: i64,
}

/// A tracked appeal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: String,

    /// Caption, e.g. "Smith v. Jones".
    #[serde(default)]
    pub style: String,

    /// Docket / reference number.
    #[serde(default, alias = "ref")]
    pub case_ref: String,

    /// ISO date as supplied by the store. Parsed lazily so one bad row does
    /// not poison a whole evaluation pass.
    pub base_deadline: String,

    #[serde(default)]
    pub extensions: Vec<Extension>,

    pub status: CaseStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_phone: Option<String>,
}

impl Case {
    pub fn new(id: impl Into<String>, base_deadline: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            style: String::new(),
            case_ref: String::new(),
            base_deadline: base_deadline.into(),
            extensions: Vec::new(),
            status: CaseStatus::Active,
            requester_email: None,
            requester_phone: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>, case_ref: impl Into<String>) -> Self {
        self.style = style.into();
        self.case_ref = case_ref.into();
        self
    }

    pub fn with_status(mut self, status: CaseStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_requester_email(mut self, email: impl Into<String>) -> Self {
        self.requester_email = Some(email.into());
        self
    }

    pub fn with_requester_phone(mut self, phone: impl Into<String>) -> Self {
        self.requester_phone = Some(phone.into());
        self
    }

    pub fn with_extension(mut self, ext: Extension) -> Self {
        self.extensions.push(ext);
        self
    }

    /// Append a grant, refusing once [`MAX_EXTENSIONS`] is reached.
    pub fn grant_extension(
        &mut self,
        requested_on: NaiveDate,
        days_granted: i64,
    ) -> Result<&Extension, CaseError> {
        if self.extensions.len() >= MAX_EXTENSIONS {
            return Err(CaseError::ExtensionLimit {
                case_id: self.id.clone(),
                max: MAX_EXTENSIONS,
            });
        }
        let ext = Extension {
            id: format!("{}-ext-{}", self.id, self.extensions.len() + 1),
            requested_on,
            days_granted,
        };
        self.extensions.push(ext);
        Ok(&self.extensions[self.extensions.len() - 1])
    }

    /// Effective deadline; an unparseable base date resolves to `today`.
    pub fn effective_deadline(&self, today: NaiveDate) -> NaiveDate {
        let base = deadline::resolve_base_deadline(&self.base_deadline, today);
        deadline::effective_deadline(base, &self.extensions)
    }

    pub fn days_left(&self, today: NaiveDate) -> i64 {
        deadline::days_left(self.effective_deadline(today), today)
    }
}
