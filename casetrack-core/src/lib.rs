//! casetrack-core: appeal deadlines and the reminder policy engine.

pub mod case;
pub mod deadline;
pub mod error;
pub mod notify;
pub mod policy;

pub use case::{Case, CaseStatus, Extension, MAX_EXTENSIONS};
pub use deadline::{
    days_left, effective_deadline, parse_base_deadline, resolve_base_deadline, today_in,
    total_days_granted,
};
pub use error::CaseError;
pub use notify::{
    DueNotification, evaluate_due, evaluate_due_on, evaluate_policy, format_message,
};
pub use policy::{Channel, GlobalContacts, GlobalNotificationSettings, NotificationPolicy};
