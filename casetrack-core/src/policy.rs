//! Per-channel reminder policies and the global notification settings.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When reminders fire for one channel, in days-left terms.
///
/// A policy runs in milestone mode when `specific_days` is non-empty and in
/// interval mode otherwise; with neither configured it never fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPolicy {
    pub enabled: bool,

    /// Largest days-left at which reminders may start (inclusive).
    pub start_days_before: i64,

    /// Interval mode: fire every N days counted from `start_days_before`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_every_days: Option<i64>,

    /// Smallest days-left at which reminders may still fire (inclusive).
    /// Negative values keep reminding after the deadline.
    pub until_days_before: i64,

    /// Milestone mode: fire only on these days-left values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specific_days: Vec<i64>,
}

impl NotificationPolicy {
    /// Email default: milestones at 15, 7, 3 and 1 days out.
    pub fn default_email() -> Self {
        Self {
            enabled: true,
            start_days_before: 15,
            repeat_every_days: None,
            until_days_before: 0,
            specific_days: vec![15, 7, 3, 1],
        }
    }

    /// SMS default: every other day from a week out until 3 days past.
    pub fn default_sms() -> Self {
        Self {
            enabled: false,
            start_days_before: 7,
            repeat_every_days: Some(2),
            until_days_before: -3,
            specific_days: Vec::new(),
        }
    }

    pub fn in_window(&self, days_left: i64) -> bool {
        days_left <= self.start_days_before && days_left >= self.until_days_before
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalContacts {
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
}

impl GlobalContacts {
    pub fn for_channel(&self, channel: Channel) -> &[String] {
        match channel {
            Channel::Email => &self.emails,
            Channel::Sms => &self.phones,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalNotificationSettings {
    #[serde(default = "NotificationPolicy::default_email")]
    pub email: NotificationPolicy,

    #[serde(default = "NotificationPolicy::default_sms")]
    pub sms: NotificationPolicy,

    #[serde(default)]
    pub global_contacts: GlobalContacts,
}

impl Default for GlobalNotificationSettings {
    fn default() -> Self {
        Self {
            email: NotificationPolicy::default_email(),
            sms: NotificationPolicy::default_sms(),
            global_contacts: GlobalContacts::default(),
        }
    }
}

impl GlobalNotificationSettings {
    pub fn policy(&self, channel: Channel) -> &NotificationPolicy {
        match channel {
            Channel::Email => &self.email,
            Channel::Sms => &self.sms,
        }
    }
}
