//! Signup documents as stored by the registration backend.

use crate::deserializers::{de_bool_or_null, de_datetime, de_option_datetime, deserialize_record_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Lifecycle status of a signup. Unknown values from the store are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignupStatus {
    New,
    Pending,
    WaitingList,
    PaymentPending,
    PaymentToConfirm,
    PaymentDelayed,
    Confirmed,
    Flagged,
    Cancelled,
    Other(String),
}

impl SignupStatus {
    /// Wire value, which doubles as the translation key.
    pub fn as_str(&self) -> &str {
        match self {
            SignupStatus::New => "NEW",
            SignupStatus::Pending => "PENDING",
            SignupStatus::WaitingList => "WAITING_LIST",
            SignupStatus::PaymentPending => "PAYMENT_PENDING",
            SignupStatus::PaymentToConfirm => "PAYMENT_TO_CONFIRM",
            SignupStatus::PaymentDelayed => "PAYMENT_DELAYED",
            SignupStatus::Confirmed => "CONFIRMED",
            SignupStatus::Flagged => "FLAGGED",
            SignupStatus::Cancelled => "CANCELLED",
            SignupStatus::Other(s) => s.as_str(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "NEW" => SignupStatus::New,
            "PENDING" => SignupStatus::Pending,
            "WAITING_LIST" => SignupStatus::WaitingList,
            "PAYMENT_PENDING" => SignupStatus::PaymentPending,
            "PAYMENT_TO_CONFIRM" => SignupStatus::PaymentToConfirm,
            "PAYMENT_DELAYED" => SignupStatus::PaymentDelayed,
            "CONFIRMED" => SignupStatus::Confirmed,
            "FLAGGED" => SignupStatus::Flagged,
            "CANCELLED" => SignupStatus::Cancelled,
            other => SignupStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SignupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SignupStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SignupStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SignupStatus::parse(&raw))
    }
}

/// One transition in a signup's status log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: SignupStatus,
    #[serde(deserialize_with = "de_datetime")]
    pub date: DateTime<Utc>,
}

/// One person's registration for an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    #[serde(deserialize_with = "deserialize_record_id")]
    pub id: String,
    pub eti_event_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub order_number: Option<u64>,

    #[serde(default)]
    pub name_first: Option<String>,
    #[serde(default)]
    pub name_last: Option<String>,
    #[serde(default)]
    pub dni_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub city: Option<String>,

    #[serde(default, deserialize_with = "de_option_datetime")]
    pub date_arrival: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_option_datetime")]
    pub date_departure: Option<DateTime<Utc>>,
    #[serde(default)]
    pub food: Option<String>,
    #[serde(default, deserialize_with = "de_bool_or_null")]
    pub is_celiac: bool,
    #[serde(default)]
    pub disability: Option<String>,
    #[serde(default)]
    pub help_with: Option<String>,
    #[serde(default, deserialize_with = "de_bool_or_null")]
    pub wants_lodging: bool,

    pub status: SignupStatus,
    #[serde(default)]
    pub status_history: Vec<StatusHistoryEntry>,
    #[serde(default, deserialize_with = "de_option_datetime")]
    pub last_modified_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_bool_or_null")]
    pub did_attend: bool,
    #[serde(default)]
    pub receipt: Option<String>,
}

impl Signup {
    /// Minimal record, mostly useful to build fixtures.
    pub fn new(id: impl Into<String>, eti_event_id: impl Into<String>, status: SignupStatus) -> Self {
        Self {
            id: id.into(),
            eti_event_id: eti_event_id.into(),
            user_id: None,
            order_number: None,
            name_first: None,
            name_last: None,
            dni_number: None,
            email: None,
            phone_number: None,
            country: None,
            province: None,
            city: None,
            date_arrival: None,
            date_departure: None,
            food: None,
            is_celiac: false,
            disability: None,
            help_with: None,
            wants_lodging: false,
            status,
            status_history: Vec::new(),
            last_modified_at: None,
            did_attend: false,
            receipt: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.name_first.as_deref().unwrap_or_default(),
            self.name_last.as_deref().unwrap_or_default()
        )
    }

    /// Copy carrying only the attributes anonymous viewers may receive.
    pub fn public_only(&self) -> Signup {
        Signup {
            order_number: self.order_number,
            name_first: self.name_first.clone(),
            name_last: self.name_last.clone(),
            country: self.country.clone(),
            province: self.province.clone(),
            city: self.city.clone(),
            last_modified_at: self.last_modified_at,
            did_attend: self.did_attend,
            ..Signup::new(self.id.clone(), self.eti_event_id.clone(), self.status.clone())
        }
    }

    /// Most recent history entry with the given status.
    ///
    /// History is stored oldest first, so this scans from the back and
    /// returns the first match without touching the stored order.
    pub fn latest_history_entry(&self, status: &SignupStatus) -> Option<&StatusHistoryEntry> {
        self.status_history.iter().rev().find(|e| &e.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_deserialize_store_document() {
        let doc = json!({
            "id": "signups:s1",
            "etiEventId": "eti-2024",
            "orderNumber": 12,
            "nameFirst": "Ana",
            "nameLast": "Paz",
            "isCeliac": null,
            "wantsLodging": true,
            "status": "PAYMENT_TO_CONFIRM",
            "statusHistory": [
                { "status": "PENDING", "date": "2024-01-01T00:00:00Z" },
                { "status": "PAYMENT_PENDING", "date": { "seconds": 1704240000, "nanoseconds": 0 } }
            ],
            "lastModifiedAt": "2024-01-05T10:00:00Z"
        });
        let signup: Signup = serde_json::from_value(doc).unwrap();
        assert_eq!(signup.id, "s1");
        assert_eq!(signup.order_number, Some(12));
        assert!(!signup.is_celiac);
        assert!(signup.wants_lodging);
        assert!(!signup.did_attend);
        assert_eq!(signup.status, SignupStatus::PaymentToConfirm);
        assert_eq!(signup.status_history.len(), 2);
        assert!(signup.date_arrival.is_none());
    }

    #[test]
    fn test_unknown_status_kept_verbatim() {
        let status: SignupStatus = serde_json::from_value(json!("ON_HOLD")).unwrap();
        assert_eq!(status, SignupStatus::Other("ON_HOLD".into()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("ON_HOLD"));
    }

    #[test]
    fn test_latest_history_entry_prefers_most_recent() {
        let day = |d: u32| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();
        let mut signup = Signup::new("s1", "e1", SignupStatus::PaymentPending);
        signup.status_history = vec![
            StatusHistoryEntry { status: SignupStatus::PaymentPending, date: day(1) },
            StatusHistoryEntry { status: SignupStatus::Pending, date: day(2) },
            StatusHistoryEntry { status: SignupStatus::PaymentPending, date: day(3) },
        ];
        let entry = signup.latest_history_entry(&SignupStatus::PaymentPending).unwrap();
        assert_eq!(entry.date, day(3));
        // stored order untouched
        assert_eq!(signup.status_history[0].date, day(1));
        assert!(signup.latest_history_entry(&SignupStatus::Confirmed).is_none());
    }

    #[test]
    fn test_public_only_drops_private_attributes() {
        let mut signup = Signup::new("s1", "e1", SignupStatus::Confirmed);
        signup.order_number = Some(4);
        signup.city = Some("Rosario".into());
        signup.email = Some("ana@example.com".into());
        signup.dni_number = Some("30111222".into());
        signup.is_celiac = true;
        signup.receipt = Some("receipts/s1.pdf".into());
        let public = signup.public_only();
        assert_eq!(public.id, "s1");
        assert_eq!(public.eti_event_id, "e1");
        assert_eq!(public.order_number, Some(4));
        assert_eq!(public.city.as_deref(), Some("Rosario"));
        assert!(public.email.is_none());
        assert!(public.dni_number.is_none());
        assert!(!public.is_celiac);
        assert!(public.receipt.is_none());
        assert!(public.status_history.is_empty());
    }

    #[test]
    fn test_full_name() {
        let mut signup = Signup::new("s1", "e1", SignupStatus::Pending);
        signup.name_first = Some("Ana".into());
        signup.name_last = Some("Paz".into());
        assert_eq!(signup.full_name(), "Ana Paz");
    }
}
