//! Confirmation-gated attendance marking and row selection.

use crate::i18n::Translator;
use crate::signup::Signup;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AttendanceState {
    #[default]
    Idle,
    /// Waiting for the operator to confirm or dismiss the prompt for this signup.
    ConfirmationPending(Box<Signup>),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestRejected {
    #[error("signup {0} already attended")]
    AlreadyAttended(String),
    #[error("viewer may not mark attendance")]
    NotPermitted,
    #[error("confirmation already pending for signup {0}")]
    Busy(String),
}

/// Texts of the confirmation dialog, already translated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    pub title: String,
    pub description: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

/// Idle -> ConfirmationPending -> (confirm | cancel) -> Idle.
///
/// `confirm` is the only way to obtain the signup to mutate, so a mutation
/// can never happen without a pending confirmation.
#[derive(Debug, Default)]
pub struct AttendanceConfirmation {
    state: AttendanceState,
}

impl AttendanceConfirmation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AttendanceState {
        &self.state
    }

    pub fn pending(&self) -> Option<&Signup> {
        match &self.state {
            AttendanceState::ConfirmationPending(s) => Some(s),
            AttendanceState::Idle => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, AttendanceState::Idle)
    }

    pub fn request(&mut self, signup: &Signup, permitted: bool) -> Result<(), RequestRejected> {
        if !permitted {
            return Err(RequestRejected::NotPermitted);
        }
        if signup.did_attend {
            return Err(RequestRejected::AlreadyAttended(signup.id.clone()));
        }
        if let AttendanceState::ConfirmationPending(current) = &self.state {
            return Err(RequestRejected::Busy(current.id.clone()));
        }
        self.state = AttendanceState::ConfirmationPending(Box::new(signup.clone()));
        Ok(())
    }

    /// Leaves the pending state and hands back the signup to mark.
    pub fn confirm(&mut self) -> Option<Signup> {
        match std::mem::take(&mut self.state) {
            AttendanceState::ConfirmationPending(signup) => Some(*signup),
            AttendanceState::Idle => None,
        }
    }

    pub fn cancel(&mut self) {
        self.state = AttendanceState::Idle;
    }

    pub fn prompt(&self, translator: &dyn Translator) -> Option<ConfirmationPrompt> {
        let signup = self.pending()?;
        let full_name = signup.full_name();
        Some(ConfirmationPrompt {
            title: translator.t("alert.title"),
            description: translator.translate("alert.description", &[("fullName", &full_name)]),
            confirm_label: translator.t("alert.confirm").to_uppercase(),
            cancel_label: translator.t("alert.cancel").to_uppercase(),
        })
    }
}

/// Currently selected row ids; each change replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn replace<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
