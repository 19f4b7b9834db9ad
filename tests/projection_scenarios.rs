use chrono::{DateTime, Duration, TimeZone, Utc};
use eti_signups::fields::SignupField;
use eti_signups::i18n::Catalog;
use eti_signups::projection::{DateStyle, days_between_payment, project};
use eti_signups::{Signup, SignupStatus, StatusHistoryEntry};
use serde_json::json;

fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::days(n)
}

fn history(entries: &[(SignupStatus, i64)]) -> Vec<StatusHistoryEntry> {
    entries
        .iter()
        .map(|(status, d)| StatusHistoryEntry {
            status: status.clone(),
            date: day(*d),
        })
        .collect()
}

#[test]
fn test_payment_confirmed_three_days_after_pending() {
    let mut signup = Signup::new("s1", "e1", SignupStatus::PaymentToConfirm);
    signup.status_history = history(&[
        (SignupStatus::Pending, 0),
        (SignupStatus::PaymentPending, 2),
        (SignupStatus::PaymentToConfirm, 5),
    ]);
    let record = project(&signup, &Catalog::builtin(), &DateStyle::default(), day(30));
    assert_eq!(record.days_between_payment, 3.0);
    assert_eq!(record.value(SignupField::DaysBetweenPayment), "3.0");
    assert_eq!(record.status, "Pago a confirmar");
}

#[test]
fn test_only_pending_entry_gives_zero() {
    let mut signup = Signup::new("s1", "e1", SignupStatus::Pending);
    signup.status_history = history(&[(SignupStatus::Pending, 0)]);
    assert_eq!(days_between_payment(&signup, day(30)), 0.0);
}

#[test]
fn test_stored_document_projects_with_custom_date_format() {
    let doc = json!({
        "id": "signups:abc",
        "etiEventId": "e1",
        "nameFirst": "Ana",
        "food": "VEGAN",
        "helpWith": "COOKING",
        "wantsLodging": true,
        "dateArrival": "2024-03-08T15:00:00Z",
        "status": "PAYMENT_PENDING",
        "statusHistory": [
            { "status": "PAYMENT_PENDING", "date": "2024-03-01T09:00:00Z" }
        ]
    });
    let signup: Signup = serde_json::from_value(doc).unwrap();
    let record = project(&signup, &Catalog::builtin(), &DateStyle::new("%Y-%m-%d"), day(1));
    assert_eq!(record.id, "abc");
    assert_eq!(record.date_arrival.as_deref(), Some("2024-03-08"));
    assert!(record.date_departure.is_none());
    assert_eq!(record.food.as_deref(), Some("Vegana"));
    assert_eq!(record.help_with.as_deref(), Some("Cocina"));
    assert_eq!(record.wants_lodging, "Sí");
    assert_eq!(record.is_celiac, "No");
    assert_eq!(record.days_between_payment, 1.0);
}

#[test]
fn test_display_record_serializes_camel_case() {
    let signup = Signup::new("s1", "e1", SignupStatus::Confirmed);
    let record = project(&signup, &Catalog::default(), &DateStyle::default(), day(0));
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["daysBetweenPayment"], json!(0.0));
    assert_eq!(value["status"], json!("CONFIRMED"));
    assert!(value["dateArrival"].is_null());
}

#[test]
fn test_unsupported_date_format_never_panics() {
    let mut signup = Signup::new("s1", "e1", SignupStatus::Confirmed);
    signup.date_arrival = Some(day(0));
    signup.last_modified_at = Some(day(2));
    let record = project(&signup, &Catalog::builtin(), &DateStyle::new("%Q"), day(3));
    assert_eq!(record.date_arrival.as_deref(), Some("01/03/2024"));
    assert_eq!(record.last_modified_at.as_deref(), Some("03/03/2024"));
    assert!(DateStyle::parse("%Q").is_err());
}
