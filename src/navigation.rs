//! View transitions requested by the action columns.

use serde::Serialize;
use std::fmt;
use tracing::info;

pub const SENT_MAILS_ROUTE: &str = "/superadmin/sent-mails";
pub const BANK_DETAILS_ROUTE: &str = "/banks";
pub const RECEIPT_ROUTE: &str = "/receipts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum Route {
    SentMails { event_id: String, email: String },
    BankDetails { user_id: String },
    Receipt { event_id: String, signup_id: String },
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::SentMails { event_id, email } => {
                write!(f, "{}/{}?usermail={}", SENT_MAILS_ROUTE, event_id, email)
            }
            Route::BankDetails { user_id } => write!(f, "{}/{}", BANK_DETAILS_ROUTE, user_id),
            Route::Receipt {
                event_id,
                signup_id,
            } => write!(f, "{}/{}/{}", RECEIPT_ROUTE, event_id, signup_id),
        }
    }
}

/// Fire-and-forget view transition.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator for headless use: records the transition in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: Route) {
        info!("Navigate to {}", route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths() {
        let mails = Route::SentMails {
            event_id: "e1".into(),
            email: "ana@example.com".into(),
        };
        assert_eq!(mails.to_string(), "/superadmin/sent-mails/e1?usermail=ana@example.com");
        let bank = Route::BankDetails { user_id: "u9".into() };
        assert_eq!(bank.to_string(), "/banks/u9");
        let receipt = Route::Receipt {
            event_id: "e1".into(),
            signup_id: "s1".into(),
        };
        assert_eq!(receipt.to_string(), "/receipts/e1/s1");
    }
}
