//! Stored signup -> display record.
//!
//! `project` is pure: the clock is an explicit argument so repeated calls on
//! the same inputs give the same record.

use crate::fields::SignupField;
use crate::i18n::Translator;
use crate::signup::{Signup, SignupStatus};
use crate::error::{EtiSignupsError, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt::Write as _;

pub const MS_PER_DAY: f64 = 86_400_000.0;

const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Calendar-date rendering for the date columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateStyle {
    pub format: String,
}

impl Default for DateStyle {
    fn default() -> Self {
        Self {
            format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl DateStyle {
    /// Unchecked; a format chrono cannot render falls back to `%d/%m/%Y`.
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    /// Checked constructor: renders a sample timestamp and rejects formats
    /// chrono fails on.
    pub fn parse(format: &str) -> Result<Self> {
        let style = Self::new(format);
        let sample = Utc
            .with_ymd_and_hms(2024, 1, 31, 10, 30, 0)
            .single()
            .unwrap_or_default();
        if style.try_render(&sample).is_none() {
            return Err(EtiSignupsError::Validation {
                message: format!("invalid date format '{}'", format),
            });
        }
        Ok(style)
    }

    fn try_render(&self, date: &DateTime<Utc>) -> Option<String> {
        let mut out = String::new();
        write!(out, "{}", date.format(&self.format)).ok()?;
        Some(out)
    }

    pub fn render(&self, date: &DateTime<Utc>) -> String {
        self.try_render(date)
            .unwrap_or_else(|| date.format(DEFAULT_DATE_FORMAT).to_string())
    }
}

/// Render-only view of a signup. Absent source values stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRecord {
    pub id: String,
    pub eti_event_id: String,
    pub user_id: Option<String>,
    pub order_number: Option<u64>,
    pub name_first: Option<String>,
    pub name_last: Option<String>,
    pub dni_number: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub country: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub date_arrival: Option<String>,
    pub date_departure: Option<String>,
    pub food: Option<String>,
    pub is_celiac: String,
    pub disability: Option<String>,
    pub help_with: Option<String>,
    pub wants_lodging: String,
    pub status: String,
    pub last_modified_at: Option<String>,
    pub did_attend: bool,
    pub receipt: Option<String>,
    pub days_between_payment: f64,
}

impl DisplayRecord {
    /// Cell text for a column; absent values render empty.
    pub fn value(&self, field: SignupField) -> String {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        match field {
            SignupField::OrderNumber => self.order_number.map(|n| n.to_string()).unwrap_or_default(),
            SignupField::NameFirst => opt(&self.name_first),
            SignupField::NameLast => opt(&self.name_last),
            SignupField::DniNumber => opt(&self.dni_number),
            SignupField::Email => opt(&self.email),
            SignupField::PhoneNumber => opt(&self.phone_number),
            SignupField::Country => opt(&self.country),
            SignupField::Province => opt(&self.province),
            SignupField::City => opt(&self.city),
            SignupField::DateArrival => opt(&self.date_arrival),
            SignupField::DateDeparture => opt(&self.date_departure),
            SignupField::Food => opt(&self.food),
            SignupField::IsCeliac => self.is_celiac.clone(),
            SignupField::Disability => opt(&self.disability),
            SignupField::HelpWith => opt(&self.help_with),
            SignupField::WantsLodging => self.wants_lodging.clone(),
            SignupField::Status => self.status.clone(),
            SignupField::LastModifiedAt => opt(&self.last_modified_at),
            SignupField::DaysBetweenPayment => format!("{:.1}", self.days_between_payment),
        }
    }
}

/// Absolute distance in days, rounded to one decimal.
pub fn days_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    let ms = (b - a).num_milliseconds().abs() as f64;
    (ms / MS_PER_DAY * 10.0).round() / 10.0
}

/// Days from the latest PAYMENT_PENDING to the latest PAYMENT_TO_CONFIRM,
/// or to `now` while payment is still unconfirmed. Zero without a pending entry.
pub fn days_between_payment(signup: &Signup, now: DateTime<Utc>) -> f64 {
    let Some(pending) = signup.latest_history_entry(&SignupStatus::PaymentPending) else {
        return 0.0;
    };
    let end = signup
        .latest_history_entry(&SignupStatus::PaymentToConfirm)
        .map(|e| e.date)
        .unwrap_or(now);
    days_between(pending.date, end)
}

pub fn project(
    signup: &Signup,
    translator: &dyn Translator,
    dates: &DateStyle,
    now: DateTime<Utc>,
) -> DisplayRecord {
    let yes_no = |flag: bool| translator.t(if flag { "yes" } else { "no" });
    DisplayRecord {
        id: signup.id.clone(),
        eti_event_id: signup.eti_event_id.clone(),
        user_id: signup.user_id.clone(),
        order_number: signup.order_number,
        name_first: signup.name_first.clone(),
        name_last: signup.name_last.clone(),
        dni_number: signup.dni_number.clone(),
        email: signup.email.clone(),
        phone_number: signup.phone_number.clone(),
        country: signup.country.clone(),
        province: signup.province.clone(),
        city: signup.city.clone(),
        date_arrival: signup.date_arrival.as_ref().map(|d| dates.render(d)),
        date_departure: signup.date_departure.as_ref().map(|d| dates.render(d)),
        food: signup.food.as_deref().map(|f| translator.t(f)),
        is_celiac: yes_no(signup.is_celiac),
        disability: signup.disability.clone(),
        help_with: signup.help_with.as_deref().map(|h| translator.t(h)),
        wants_lodging: yes_no(signup.wants_lodging),
        status: translator.t(signup.status.as_str()),
        last_modified_at: signup.last_modified_at.as_ref().map(|d| dates.render(d)),
        did_attend: signup.did_attend,
        receipt: signup.receipt.clone(),
        days_between_payment: days_between_payment(signup, now),
    }
}

/// `project` against the wall clock.
pub fn project_now(signup: &Signup, translator: &dyn Translator, dates: &DateStyle) -> DisplayRecord {
    project(signup, translator, dates, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;
    use crate::signup::StatusHistoryEntry;
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn with_history(entries: &[(SignupStatus, DateTime<Utc>)]) -> Signup {
        let mut signup = Signup::new("s1", "e1", SignupStatus::Pending);
        signup.status_history = entries
            .iter()
            .map(|(status, date)| StatusHistoryEntry {
                status: status.clone(),
                date: *date,
            })
            .collect();
        signup
    }

    #[test]
    fn test_pending_to_confirm_scenario() {
        let signup = with_history(&[
            (SignupStatus::Pending, day(0)),
            (SignupStatus::PaymentPending, day(2)),
            (SignupStatus::PaymentToConfirm, day(5)),
        ]);
        assert_eq!(days_between_payment(&signup, day(100)), 3.0);
    }

    #[test]
    fn test_no_payment_pending_is_zero() {
        let signup = with_history(&[(SignupStatus::Pending, day(0))]);
        assert_eq!(days_between_payment(&signup, day(100)), 0.0);
        let empty = Signup::new("s2", "e1", SignupStatus::New);
        assert_eq!(days_between_payment(&empty, day(100)), 0.0);
    }

    #[test]
    fn test_in_progress_uses_now() {
        let signup = with_history(&[(SignupStatus::PaymentPending, day(1))]);
        let now = day(3) + Duration::hours(12);
        assert_eq!(days_between_payment(&signup, now), 2.5);
    }

    #[test]
    fn test_recurring_status_uses_latest_entry() {
        let signup = with_history(&[
            (SignupStatus::PaymentPending, day(0)),
            (SignupStatus::PaymentToConfirm, day(4)),
            (SignupStatus::PaymentPending, day(6)),
            (SignupStatus::PaymentToConfirm, day(7)),
        ]);
        assert_eq!(days_between_payment(&signup, day(100)), 1.0);
    }

    #[test]
    fn test_days_between_is_symmetric() {
        let a = day(0);
        let b = day(1) + Duration::hours(2) + Duration::minutes(24);
        assert_eq!(days_between(a, b), 1.1);
        assert_eq!(days_between(b, a), 1.1);
    }

    #[test]
    fn test_confirm_before_pending_still_positive() {
        let signup = with_history(&[
            (SignupStatus::PaymentToConfirm, day(1)),
            (SignupStatus::PaymentPending, day(4)),
        ]);
        assert_eq!(days_between_payment(&signup, day(100)), 3.0);
    }

    #[test]
    fn test_projection_formats_and_translates() {
        let mut signup = Signup::new("s1", "e1", SignupStatus::PaymentPending);
        signup.date_arrival = Some(day(30));
        signup.food = Some("VEGAN".into());
        signup.is_celiac = true;
        let record = project(&signup, &Catalog::builtin(), &DateStyle::default(), day(40));
        assert_eq!(record.date_arrival.as_deref(), Some("31/01/2024"));
        assert!(record.date_departure.is_none());
        assert!(record.last_modified_at.is_none());
        assert_eq!(record.food.as_deref(), Some("Vegana"));
        assert!(record.help_with.is_none());
        assert_eq!(record.is_celiac, "Sí");
        assert_eq!(record.wants_lodging, "No");
        assert_eq!(record.status, "Pago pendiente");
        assert_eq!(record.value(SignupField::DaysBetweenPayment), "0.0");
    }

    #[test]
    fn test_projection_is_pure() {
        let signup = with_history(&[(SignupStatus::PaymentPending, day(2))]);
        let catalog = Catalog::builtin();
        let dates = DateStyle::default();
        let first = project(&signup, &catalog, &dates, day(9));
        let second = project(&signup, &catalog, &dates, day(9));
        assert_eq!(first, second);
    }

    #[test]
    fn test_unrenderable_format_falls_back() {
        let mut signup = Signup::new("s1", "e1", SignupStatus::New);
        signup.date_arrival = Some(day(30));
        let record = project(&signup, &Catalog::builtin(), &DateStyle::new("%Q"), day(40));
        assert_eq!(record.date_arrival.as_deref(), Some("31/01/2024"));
    }

    #[test]
    fn test_parse_checks_format() {
        assert!(DateStyle::parse("%Q").is_err());
        let style = DateStyle::parse("%d/%m/%Y %H:%M").unwrap();
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap();
        assert_eq!(style.render(&date), "01/01/2024 10:30");
    }

    #[test]
    fn test_untranslated_keys_fall_back() {
        let mut signup = Signup::new("s1", "e1", SignupStatus::Other("ON_HOLD".into()));
        signup.help_with = Some("GARDENING".into());
        let record = project(&signup, &Catalog::default(), &DateStyle::default(), day(0));
        assert_eq!(record.status, "ON_HOLD");
        assert_eq!(record.help_with.as_deref(), Some("GARDENING"));
        assert_eq!(record.is_celiac, "no");
    }
}
