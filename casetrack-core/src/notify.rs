//! Decide which (case, channel) reminders are due today.
//!
//! Pure and deterministic: the same cases, settings and days-left values
//! always produce the same list in the same order.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::case::Case;
use crate::policy::{Channel, GlobalNotificationSettings, NotificationPolicy};

/// A reminder ready to hand to a delivery transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueNotification {
    pub case_id: String,
    pub channel: Channel,
    pub days_left: i64,
    pub message: String,
    pub recipients: Vec<String>,
}

impl DueNotification {
    /// One send per case, channel and day.
    pub fn dedupe_key(&self, today: NaiveDate) -> String {
        format!("{}:{}:{}", self.case_id, self.channel, today.format("%Y-%m-%d"))
    }
}

/// Evaluate every non-terminal case against each enabled channel.
///
/// Output order is case order, email before sms.
pub fn evaluate_due<F>(
    cases: &[Case],
    settings: &GlobalNotificationSettings,
    days_left_fn: F,
) -> Vec<DueNotification>
where
    F: Fn(&Case) -> i64,
{
    let mut out = Vec::new();

    for case in cases {
        if case.status.is_terminal() {
            continue;
        }

        let days_left = days_left_fn(case);

        for channel in [Channel::Email, Channel::Sms] {
            let policy = settings.policy(channel);
            if !policy.enabled {
                continue;
            }
            out.extend(evaluate_policy(
                case,
                policy,
                days_left,
                channel,
                settings.global_contacts.for_channel(channel),
            ));
        }
    }

    out
}

/// [`evaluate_due`] with days-left taken from each case's effective deadline.
pub fn evaluate_due_on(
    cases: &[Case],
    settings: &GlobalNotificationSettings,
    today: NaiveDate,
) -> Vec<DueNotification> {
    evaluate_due(cases, settings, |c| c.days_left(today))
}

/// Apply one channel policy to one case. Yields at most one notification.
pub fn evaluate_policy(
    case: &Case,
    policy: &NotificationPolicy,
    days_left: i64,
    channel: Channel,
    global_recipients: &[String],
) -> Option<DueNotification> {
    if !policy.in_window(days_left) {
        return None;
    }

    if !should_fire(policy, days_left) {
        return None;
    }

    Some(DueNotification {
        case_id: case.id.clone(),
        channel,
        days_left,
        message: format_message(case, days_left, channel),
        recipients: recipients_for(case, channel, global_recipients),
    })
}

/// Milestones win outright over an interval; they are never combined.
fn should_fire(policy: &NotificationPolicy, days_left: i64) -> bool {
    if !policy.specific_days.is_empty() {
        return policy.specific_days.contains(&days_left);
    }

    match policy.repeat_every_days {
        Some(every) if every > 0 => {
            // Out-of-range policy values simply never fire.
            match policy.start_days_before.checked_sub(days_left) {
                Some(since_start) => since_start >= 0 && since_start % every == 0,
                None => false,
            }
        }
        _ => false,
    }
}

/// Global contacts plus the case's own contact for `channel`, exact-match
/// deduplicated in first-seen order.
fn recipients_for(case: &Case, channel: Channel, global: &[String]) -> Vec<String> {
    let own = match channel {
        Channel::Email => case.requester_email.as_deref(),
        Channel::Sms => case.requester_phone.as_deref(),
    };

    let mut seen = HashSet::new();
    global
        .iter()
        .map(String::as_str)
        .chain(own)
        .filter(|r| seen.insert(*r))
        .map(str::to_string)
        .collect()
}

pub fn format_message(case: &Case, days_left: i64, channel: Channel) -> String {
    let urgent = if channel == Channel::Email { "URGENT: " } else { "" };
    let subject = format!("Case \"{}\" ({})", case.style, case.case_ref);

    match days_left {
        n if n < 0 => format!("{urgent}{subject} is {} days past deadline!", n.abs()),
        0 => format!("{urgent}{subject} deadline is TODAY!"),
        1 => format!("{subject} deadline is TOMORROW (1 day left)"),
        n => format!("{subject} deadline in {n} days"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CaseStatus;

    fn case() -> Case {
        Case::new("ap-1", "2025-01-31").with_style("Smith v. Jones", "CA-118")
    }

    fn milestones(days: &[i64], repeat: Option<i64>) -> NotificationPolicy {
        NotificationPolicy {
            enabled: true,
            start_days_before: 15,
            repeat_every_days: repeat,
            until_days_before: 0,
            specific_days: days.to_vec(),
        }
    }

    fn interval(start: i64, every: Option<i64>, until: i64) -> NotificationPolicy {
        NotificationPolicy {
            enabled: true,
            start_days_before: start,
            repeat_every_days: every,
            until_days_before: until,
            specific_days: Vec::new(),
        }
    }

    fn fires(policy: &NotificationPolicy, days_left: i64) -> bool {
        evaluate_policy(&case(), policy, days_left, Channel::Email, &[]).is_some()
    }

    #[test]
    fn milestone_mode_fires_only_on_listed_days() {
        let p = milestones(&[15, 7, 3, 1], None);
        assert!(fires(&p, 7));
        assert!(!fires(&p, 8));
        let fired: Vec<i64> = (-5..=20).filter(|d| fires(&p, *d)).collect();
        assert_eq!(fired, vec![1, 3, 7, 15]);
    }

    #[test]
    fn milestones_override_interval() {
        // An interval of 1 would fire every day; milestones must win.
        let p = milestones(&[15, 7, 3, 1], Some(1));
        let fired: Vec<i64> = (0..=15).filter(|d| fires(&p, *d)).collect();
        assert_eq!(fired, vec![1, 3, 7, 15]);
    }

    #[test]
    fn milestone_outside_window_does_not_fire() {
        let mut p = milestones(&[20, 7], None);
        p.start_days_before = 15;
        assert!(!fires(&p, 20));
        assert!(fires(&p, 7));
    }

    #[test]
    fn interval_counts_forward_from_window_start() {
        let p = interval(7, Some(2), -3);
        assert!(fires(&p, 5));
        assert!(!fires(&p, 4));
        let fired: Vec<i64> = (-10..=10).rev().filter(|d| fires(&p, *d)).collect();
        assert_eq!(fired, vec![7, 5, 3, 1, -1, -3]);
    }

    #[test]
    fn zero_negative_or_missing_interval_never_fires() {
        for every in [None, Some(0), Some(-2)] {
            let p = interval(7, every, -3);
            assert!((-3..=7).all(|d| !fires(&p, d)), "every={every:?}");
        }
    }

    #[test]
    fn extreme_window_start_does_not_panic() {
        let p = interval(i64::MAX, Some(2), -10);
        assert!(!fires(&p, -1));
        // i64::MAX - 1 is even, so this one does fire
        assert!(fires(&p, 1));
    }

    #[test]
    fn case_without_contact_adds_nothing() {
        let p = milestones(&[7], None);
        let global = vec!["a@x.com".to_string()];

        let n = evaluate_policy(&case(), &p, 7, Channel::Email, &global).unwrap();
        assert_eq!(n.recipients, vec!["a@x.com"]);

        let n = evaluate_policy(&case(), &p, 7, Channel::Sms, &[]).unwrap();
        assert!(n.recipients.is_empty());
    }

    #[test]
    fn recipients_merge_and_dedupe() {
        let c = case()
            .with_requester_email("b@x.com")
            .with_requester_phone("+15550100");
        let global = vec!["a@x.com".to_string(), "b@x.com".to_string()];
        let p = milestones(&[7], None);

        let n = evaluate_policy(&c, &p, 7, Channel::Email, &global).unwrap();
        assert_eq!(n.recipients, vec!["a@x.com", "b@x.com"]);

        let n = evaluate_policy(&c, &p, 7, Channel::Sms, &[]).unwrap();
        assert_eq!(n.recipients, vec!["+15550100"]);
    }

    #[test]
    fn dedupe_is_case_sensitive() {
        let c = case().with_requester_email("A@x.com");
        let global = vec!["a@x.com".to_string()];
        let n = evaluate_policy(&c, &milestones(&[7], None), 7, Channel::Email, &global).unwrap();
        assert_eq!(n.recipients, vec!["a@x.com", "A@x.com"]);
    }

    #[test]
    fn message_variants() {
        let c = case();
        assert_eq!(
            format_message(&c, -2, Channel::Email),
            "URGENT: Case \"Smith v. Jones\" (CA-118) is 2 days past deadline!"
        );
        assert_eq!(
            format_message(&c, -2, Channel::Sms),
            "Case \"Smith v. Jones\" (CA-118) is 2 days past deadline!"
        );
        assert_eq!(
            format_message(&c, 0, Channel::Email),
            "URGENT: Case \"Smith v. Jones\" (CA-118) deadline is TODAY!"
        );
        assert_eq!(
            format_message(&c, 1, Channel::Email),
            "Case \"Smith v. Jones\" (CA-118) deadline is TOMORROW (1 day left)"
        );
        assert_eq!(
            format_message(&c, 9, Channel::Sms),
            "Case \"Smith v. Jones\" (CA-118) deadline in 9 days"
        );
    }

    #[test]
    fn evaluate_due_skips_terminal_and_disabled() {
        let cases = vec![
            case(),
            Case::new("ap-2", "2025-01-31").with_status(CaseStatus::Archived),
            Case::new("ap-3", "2025-01-31").with_status(CaseStatus::Completed),
        ];
        let mut settings = GlobalNotificationSettings::default();
        settings.sms = interval(7, Some(1), 0);

        let out = evaluate_due(&cases, &settings, |_| 7);
        let keys: Vec<_> = out.iter().map(|n| (n.case_id.as_str(), n.channel)).collect();
        assert_eq!(keys, vec![("ap-1", Channel::Email), ("ap-1", Channel::Sms)]);

        settings.sms.enabled = false;
        assert_eq!(evaluate_due(&cases, &settings, |_| 7).len(), 1);
    }

    #[test]
    fn dedupe_key_is_per_day() {
        let n = evaluate_policy(&case(), &milestones(&[7], None), 7, Channel::Sms, &[]).unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 1, 24).unwrap();
        assert_eq!(n.dedupe_key(day), "ap-1:sms:2025-01-24");
    }
}
