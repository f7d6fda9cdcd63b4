use casetrack_core::{
    Case, CaseStatus, Channel, Extension, GlobalContacts, GlobalNotificationSettings,
    NotificationPolicy, effective_deadline, evaluate_due, evaluate_due_on,
};
use chrono::NaiveDate;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn grant(id: &str, days: i64) -> Extension {
    Extension {
        id: id.to_string(),
        requested_on: d(2024, 12, 15),
        days_granted: days,
    }
}

/// Base 2025-01-01 plus a 30-day grant; evaluated on 2025-01-24 (7 days out).
fn extended_case() -> Case {
    Case::new("ap-100", "2025-01-01")
        .with_style("Doe v. Acme Corp", "A-2024-0311")
        .with_extension(grant("x1", 30))
        .with_requester_email("b@x.com")
        .with_requester_phone("+15550123")
}

fn settings() -> GlobalNotificationSettings {
    GlobalNotificationSettings {
        email: NotificationPolicy {
            enabled: true,
            start_days_before: 15,
            repeat_every_days: None,
            until_days_before: 0,
            specific_days: vec![15, 7, 3, 1],
        },
        sms: NotificationPolicy {
            enabled: true,
            start_days_before: 7,
            repeat_every_days: Some(2),
            until_days_before: -3,
            specific_days: Vec::new(),
        },
        global_contacts: GlobalContacts {
            emails: vec!["a@x.com".to_string()],
            phones: Vec::new(),
        },
    }
}

#[test]
fn test_extension_and_days_left() {
    let c = extended_case();
    let today = d(2025, 1, 24);
    assert_eq!(c.effective_deadline(today), d(2025, 1, 31));
    assert_eq!(c.days_left(today), 7);
}

#[test]
fn test_zero_day_extension_changes_nothing() {
    let base = d(2025, 5, 5);
    let mut grants = vec![grant("x1", 12), grant("x2", 3)];
    let before = effective_deadline(base, &grants);
    grants.push(grant("x3", 0));
    assert_eq!(effective_deadline(base, &grants), before);
}

#[test]
fn test_seven_days_out_fires_both_channels() {
    let cases = vec![extended_case()];
    let out = evaluate_due_on(&cases, &settings(), d(2025, 1, 24));

    assert_eq!(out.len(), 2);

    let email = &out[0];
    assert_eq!(email.channel, Channel::Email);
    assert_eq!(email.days_left, 7);
    assert_eq!(email.recipients, vec!["a@x.com", "b@x.com"]);
    assert_eq!(email.message, "Case \"Doe v. Acme Corp\" (A-2024-0311) deadline in 7 days");

    // since_start = 0 for sms, first fire of the window
    let sms = &out[1];
    assert_eq!(sms.channel, Channel::Sms);
    assert_eq!(sms.recipients, vec!["+15550123"]);
}

#[test]
fn test_eight_days_out_is_quiet() {
    let cases = vec![extended_case()];
    assert!(evaluate_due_on(&cases, &settings(), d(2025, 1, 23)).is_empty());
}

#[test]
fn test_sms_interval_days() {
    let cases = vec![extended_case()];
    let s = settings();

    let sms_days: Vec<i64> = (-6..=10)
        .filter(|dl| {
            evaluate_due(&cases, &s, |_| *dl)
                .iter()
                .any(|n| n.channel == Channel::Sms)
        })
        .collect();
    assert_eq!(sms_days, vec![-3, -1, 1, 3, 5, 7]);
}

#[test]
fn test_archived_case_never_notified() {
    let mut s = settings();
    s.email.specific_days.clear();
    s.email.repeat_every_days = Some(1);
    s.sms.repeat_every_days = Some(1);

    for status in [CaseStatus::Archived, CaseStatus::Completed] {
        let cases = vec![extended_case().with_status(status)];
        for dl in -5..=20 {
            assert!(evaluate_due(&cases, &s, |_| dl).is_empty(), "{status} at {dl}");
        }
    }
}

#[test]
fn test_past_deadline_email_is_urgent() {
    let cases = vec![extended_case()];
    let mut s = settings();
    s.email.until_days_before = -5;
    s.email.specific_days = vec![-2];

    let out = evaluate_due_on(&cases, &s, d(2025, 2, 2));
    let email = out.iter().find(|n| n.channel == Channel::Email).unwrap();
    assert_eq!(
        email.message,
        "URGENT: Case \"Doe v. Acme Corp\" (A-2024-0311) is 2 days past deadline!"
    );
}

#[test]
fn test_unparseable_deadline_looks_due_today() {
    let mut broken = extended_case();
    broken.base_deadline = "31/01/2025".to_string();
    broken.extensions.clear();

    let mut s = settings();
    s.email.specific_days.push(0);

    let today = d(2025, 3, 1);
    let out = evaluate_due_on(&[broken], &s, today);
    assert!(out.iter().any(|n| n.days_left == 0 && n.message.ends_with("TODAY!")));
}

#[test]
fn test_evaluation_is_idempotent() {
    let cases = vec![
        extended_case(),
        Case::new("ap-200", "2025-01-27").with_style("In re Marsh", "B-77"),
        Case::new("ap-300", "2025-01-25").with_status(CaseStatus::Intake),
    ];
    let s = settings();
    let today = d(2025, 1, 24);

    let first = serde_json::to_string(&evaluate_due_on(&cases, &s, today)).unwrap();
    let second = serde_json::to_string(&evaluate_due_on(&cases, &s, today)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_contact_contributes_nothing() {
    let bare = Case::new("ap-200", "2025-01-31").with_style("In re Marsh", "B-77");
    let today = d(2025, 1, 24);

    let out = evaluate_due_on(&[bare], &settings(), today);
    let email = out.iter().find(|n| n.channel == Channel::Email).unwrap();
    assert_eq!(email.recipients, vec!["a@x.com"]);

    // no global phones and no case phone: the sms is due but has nobody to go to
    let sms = out.iter().find(|n| n.channel == Channel::Sms).unwrap();
    assert_eq!(sms.recipients, Vec::<String>::new());
}
