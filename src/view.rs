//! One mounted signup list: subscription lifecycle, table state and the
//! attendance flow wired together.

use crate::attendance::{AttendanceConfirmation, ConfirmationPrompt, RequestRejected, Selection};
use crate::fields::{Column, ColumnKind, SignupField, ViewMode, ViewerContext};
use crate::i18n::Translator;
use crate::navigation::{Navigator, Route};
use crate::projection::{DateStyle, DisplayRecord, project};
use crate::roles::{Role, User};
use crate::signup::{Signup, SignupStatus};
use crate::store::{SignupStore, Subscription, SubscriptionEvent};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Case-insensitive "contains" filter on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: SignupField,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SignupField,
    pub descending: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("column {0} is not searchable here")]
    NotSearchable(SignupField),
    #[error("column {0} is not displayed here")]
    NotDisplayed(SignupField),
    #[error("no visible signup with id {0}")]
    UnknownRow(String),
    #[error(transparent)]
    Rejected(#[from] RequestRejected),
    #[error("action {column:?} unavailable for signup {id}")]
    ActionUnavailable { column: ColumnKind, id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceCheckbox {
    pub checked: bool,
    pub disabled: bool,
}

pub struct SignupListView {
    mode: ViewMode,
    role: Role,
    event_id: Option<String>,
    subscription: Option<Subscription>,
    signups: Vec<Signup>,
    loading: bool,
    selection: Selection,
    attendance: AttendanceConfirmation,
    filter: Option<Filter>,
    sort: Option<Sort>,
    small_screen: bool,
    translator: Arc<dyn Translator>,
    dates: DateStyle,
}

impl SignupListView {
    pub fn new(mode: ViewMode, translator: Arc<dyn Translator>, dates: DateStyle) -> Self {
        Self {
            mode,
            role: Role::None,
            event_id: None,
            subscription: None,
            signups: Vec::new(),
            loading: false,
            selection: Selection::default(),
            attendance: AttendanceConfirmation::new(),
            filter: None,
            sort: None,
            small_screen: false,
            translator,
            dates,
        }
    }

    pub fn context(&self) -> ViewerContext {
        ViewerContext::new(self.role, self.mode)
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    pub fn translator(&self) -> &dyn Translator {
        self.translator.as_ref()
    }

    pub fn title_key(&self) -> &'static str {
        match self.mode {
            ViewMode::Attendance => "attendanceTitle",
            ViewMode::List => "title",
        }
    }

    pub fn title(&self) -> String {
        self.translator.t(self.title_key())
    }

    /// Point the view at an event for the given viewer. A live subscription
    /// for the same event and role is kept; anything else is released first.
    pub async fn attach(&mut self, store: &dyn SignupStore, event_id: &str, user: Option<&User>) {
        let role = Role::resolve(user, Some(event_id));
        if self.is_subscribed() && self.event_id.as_deref() == Some(event_id) && self.role == role {
            debug!("Subscription for event {} already active", event_id);
            return;
        }

        self.release();
        self.signups.clear();
        self.selection.clear();
        self.attendance.cancel();
        self.event_id = Some(event_id.to_string());
        self.role = role;
        self.loading = true;

        match store.subscribe(event_id, role.is_admin()).await {
            Ok(subscription) => {
                info!("Attached signup list to event {} as {:?}", event_id, role);
                self.subscription = Some(subscription);
            }
            Err(e) => {
                error!("Failed to subscribe to signups of event {}: {}", event_id, e);
                self.loading = false;
            }
        }
    }

    /// Idempotent.
    pub fn release(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    pub fn apply(&mut self, event: SubscriptionEvent) {
        match event {
            SubscriptionEvent::Loading(loading) => self.loading = loading,
            SubscriptionEvent::Snapshot(signups) => {
                debug!("Signup list replaced with {} records", signups.len());
                self.signups = signups;
            }
        }
    }

    /// Wait for and apply the next event. False once there is nothing left to receive.
    pub async fn pump(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };
        match subscription.next().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    /// Apply everything already buffered without waiting.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.subscription.as_mut().and_then(Subscription::try_next) {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Pump until the initial load has finished.
    pub async fn wait_loaded(&mut self) {
        while self.loading {
            if !self.pump().await {
                break;
            }
        }
    }

    pub fn set_viewport_width(&mut self, width: u32, small_screen_width: u32) {
        self.small_screen = width < small_screen_width;
    }

    pub fn set_small_screen(&mut self, small_screen: bool) {
        self.small_screen = small_screen;
    }

    pub fn columns(&self) -> Vec<Column> {
        self.context().columns(self.small_screen)
    }

    pub fn searchable_fields(&self) -> Vec<SignupField> {
        self.context().searchable_fields()
    }

    /// Signups this view shows; attendance only lists confirmed ones.
    pub fn visible_signups(&self) -> impl Iterator<Item = &Signup> {
        let attendance = self.mode == ViewMode::Attendance;
        self.signups
            .iter()
            .filter(move |s| !attendance || s.status == SignupStatus::Confirmed)
    }

    pub fn signups(&self) -> &[Signup] {
        &self.signups
    }

    fn find_visible(&self, id: &str) -> Option<&Signup> {
        self.visible_signups().find(|s| s.id == id)
    }

    /// A blank value clears the filter.
    pub fn set_filter(&mut self, field: SignupField, value: impl Into<String>) -> Result<(), ViewError> {
        let value = value.into();
        if value.trim().is_empty() {
            self.filter = None;
            return Ok(());
        }
        if !self.searchable_fields().contains(&field) {
            return Err(ViewError::NotSearchable(field));
        }
        self.filter = Some(Filter { field, value });
        Ok(())
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn set_sort(&mut self, field: SignupField, descending: bool) -> Result<(), ViewError> {
        if !self.context().display_fields().contains(&field) {
            return Err(ViewError::NotDisplayed(field));
        }
        self.sort = Some(Sort { field, descending });
        Ok(())
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    /// Projected, filtered and sorted rows as of `now`.
    pub fn rows_at(&self, now: DateTime<Utc>) -> Vec<DisplayRecord> {
        let mut rows: Vec<DisplayRecord> = self
            .visible_signups()
            .map(|s| project(s, self.translator.as_ref(), &self.dates, now))
            .collect();

        if let Some(filter) = &self.filter {
            let needle = filter.value.to_lowercase();
            rows.retain(|r| r.value(filter.field).to_lowercase().contains(&needle));
        }
        if let Some(sort) = self.sort {
            rows.sort_by(|a, b| {
                let ord = compare_rows(a, b, sort.field);
                if sort.descending { ord.reverse() } else { ord }
            });
        }
        rows
    }

    pub fn rows(&self) -> Vec<DisplayRecord> {
        self.rows_at(Utc::now())
    }

    /// Replace the selected rows. Ignored unless the viewer may select.
    pub fn select<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.context().can_select_rows() {
            warn!("Row selection ignored for {:?} in {:?} mode", self.role, self.mode);
            return;
        }
        self.selection.replace(ids);
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn attendance_checkbox(&self, id: &str) -> Option<AttendanceCheckbox> {
        let signup = self.find_visible(id)?;
        Some(AttendanceCheckbox {
            checked: signup.did_attend,
            disabled: signup.did_attend || !self.context().can_mark_attendance(),
        })
    }

    pub fn request_attendance(&mut self, id: &str) -> Result<(), ViewError> {
        let permitted = self.context().can_mark_attendance();
        let attendance = self.mode == ViewMode::Attendance;
        let signup = self
            .signups
            .iter()
            .filter(|s| !attendance || s.status == SignupStatus::Confirmed)
            .find(|s| s.id == id)
            .ok_or_else(|| ViewError::UnknownRow(id.to_string()))?;
        if let Err(rejected) = self.attendance.request(signup, permitted) {
            warn!("Attendance request for {} rejected: {}", id, rejected);
            return Err(rejected.into());
        }
        Ok(())
    }

    pub fn attendance_prompt(&self) -> Option<ConfirmationPrompt> {
        self.attendance.prompt(self.translator.as_ref())
    }

    pub fn pending_attendance(&self) -> Option<&Signup> {
        self.attendance.pending()
    }

    pub fn cancel_attendance(&mut self) {
        if let Some(signup) = self.attendance.pending() {
            debug!("Attendance confirmation for {} dismissed", signup.id);
        }
        self.attendance.cancel();
    }

    /// Confirm the pending request and fire the mutation. Local state is left
    /// alone; the next snapshot carries the change.
    pub fn confirm_attendance(&mut self, store: Arc<dyn SignupStore>) -> Option<JoinHandle<()>> {
        let signup = self.attendance.confirm()?;
        info!("Marking attendance for signup {}", signup.id);
        Some(tokio::spawn(async move {
            if let Err(e) = store.mark_attendance(&signup).await {
                error!("Failed to mark attendance for signup {}: {}", signup.id, e);
            }
        }))
    }

    /// Route behind an action column for a row.
    pub fn action_route(&self, column: ColumnKind, id: &str) -> Result<Route, ViewError> {
        let unavailable = || ViewError::ActionUnavailable {
            column,
            id: id.to_string(),
        };
        if !self.columns().iter().any(|c| c.kind == column) {
            return Err(unavailable());
        }
        let signup = self
            .find_visible(id)
            .ok_or_else(|| ViewError::UnknownRow(id.to_string()))?;
        match column {
            ColumnKind::SentMails => Ok(Route::SentMails {
                event_id: signup.eti_event_id.clone(),
                email: signup.email.clone().ok_or_else(unavailable)?,
            }),
            ColumnKind::BankDetails => Ok(Route::BankDetails {
                user_id: signup.user_id.clone().ok_or_else(unavailable)?,
            }),
            ColumnKind::Receipt if signup.receipt.is_some() => Ok(Route::Receipt {
                event_id: signup.eti_event_id.clone(),
                signup_id: signup.id.clone(),
            }),
            _ => Err(unavailable()),
        }
    }

    pub fn trigger_action(
        &self,
        column: ColumnKind,
        id: &str,
        navigator: &dyn Navigator,
    ) -> Result<(), ViewError> {
        let route = self.action_route(column, id)?;
        navigator.navigate(route);
        Ok(())
    }

    /// Signup count per status among the visible rows.
    pub fn summary(&self) -> BTreeMap<SignupStatus, usize> {
        let mut counts = BTreeMap::new();
        for signup in self.visible_signups() {
            *counts.entry(signup.status.clone()).or_insert(0) += 1;
        }
        counts
    }
}

impl Drop for SignupListView {
    fn drop(&mut self) {
        self.release();
    }
}

fn compare_rows(a: &DisplayRecord, b: &DisplayRecord, field: SignupField) -> Ordering {
    match field {
        SignupField::DaysBetweenPayment => a.days_between_payment.total_cmp(&b.days_between_payment),
        SignupField::OrderNumber => a.order_number.cmp(&b.order_number),
        _ => a.value(field).cmp(&b.value(field)),
    }
}
