use async_trait::async_trait;
use eti_signups::attendance::RequestRejected;
use eti_signups::error::{EtiSignupsError, Result};
use eti_signups::fields::ViewMode;
use eti_signups::i18n::Catalog;
use eti_signups::projection::DateStyle;
use eti_signups::roles::User;
use eti_signups::store::{SignupStore, Subscription, SubscriptionEvent};
use eti_signups::view::{AttendanceCheckbox, SignupListView, ViewError};
use eti_signups::{Signup, SignupStatus};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Store double that replays a fixed snapshot and counts mutations.
#[derive(Default)]
struct RecordingStore {
    signups: Vec<Signup>,
    marked: Mutex<Vec<String>>,
    subscribe_calls: AtomicUsize,
    fail_subscribe: bool,
}

impl RecordingStore {
    fn with(signups: Vec<Signup>) -> Self {
        Self {
            signups,
            ..Self::default()
        }
    }

    fn marked(&self) -> Vec<String> {
        self.marked.lock().unwrap().clone()
    }
}

#[async_trait]
impl SignupStore for RecordingStore {
    async fn subscribe(&self, event_id: &str, _is_admin: bool) -> Result<Subscription> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_subscribe {
            return Err(EtiSignupsError::Database {
                message: "connection refused".into(),
            });
        }
        let (tx, subscription) = Subscription::channel(event_id, 8);
        let list: Vec<Signup> = self
            .signups
            .iter()
            .filter(|s| s.eti_event_id == event_id)
            .cloned()
            .collect();
        assert!(tx.loading(true).await);
        assert!(tx.snapshot(list).await);
        assert!(tx.loading(false).await);
        // keep the producer alive so the subscription stays open
        tokio::spawn(async move {
            tx.cancelled().await;
        });
        Ok(subscription)
    }

    async fn mark_attendance(&self, signup: &Signup) -> Result<()> {
        self.marked.lock().unwrap().push(signup.id.clone());
        Ok(())
    }
}

fn confirmed(id: &str, event: &str, attended: bool) -> Signup {
    let mut s = Signup::new(id, event, SignupStatus::Confirmed);
    s.name_first = Some("Ana".into());
    s.name_last = Some("Paz".into());
    s.did_attend = attended;
    s
}

fn admin_of(event: &str) -> User {
    User {
        id: "admin".into(),
        admin_of: vec![event.to_string()],
        ..User::default()
    }
}

fn attendance_view() -> SignupListView {
    SignupListView::new(
        ViewMode::Attendance,
        Arc::new(Catalog::builtin()),
        DateStyle::default(),
    )
}

#[tokio::test]
async fn test_cancel_leaves_signup_untouched() {
    let store = Arc::new(RecordingStore::with(vec![confirmed("s1", "e1", false)]));
    let admin = admin_of("e1");
    let mut view = attendance_view();
    view.attach(store.as_ref(), "e1", Some(&admin)).await;
    view.wait_loaded().await;

    assert_eq!(
        view.attendance_checkbox("s1"),
        Some(AttendanceCheckbox { checked: false, disabled: false })
    );
    view.request_attendance("s1").unwrap();
    let prompt = view.attendance_prompt().expect("prompt shown");
    assert!(prompt.description.contains("Ana Paz"));

    view.cancel_attendance();
    assert!(view.pending_attendance().is_none());
    assert!(view.confirm_attendance(store.clone()).is_none());
    assert!(store.marked().is_empty());
    assert!(!view.signups()[0].did_attend);
}

#[tokio::test]
async fn test_confirm_triggers_exactly_one_mutation() {
    let store = Arc::new(RecordingStore::with(vec![confirmed("s1", "e1", false)]));
    let admin = admin_of("e1");
    let mut view = attendance_view();
    view.attach(store.as_ref(), "e1", Some(&admin)).await;
    view.wait_loaded().await;

    view.request_attendance("s1").unwrap();
    let handle = view
        .confirm_attendance(store.clone())
        .expect("mutation spawned");
    handle.await.unwrap();
    assert!(view.confirm_attendance(store.clone()).is_none());
    assert_eq!(store.marked(), vec!["s1".to_string()]);
    // no optimistic update; the store's next snapshot carries the change
    assert!(!view.signups()[0].did_attend);
}

#[tokio::test]
async fn test_attended_row_cannot_be_requested() {
    let store = Arc::new(RecordingStore::with(vec![confirmed("s1", "e1", true)]));
    let admin = admin_of("e1");
    let mut view = attendance_view();
    view.attach(store.as_ref(), "e1", Some(&admin)).await;
    view.wait_loaded().await;

    assert_eq!(
        view.attendance_checkbox("s1"),
        Some(AttendanceCheckbox { checked: true, disabled: true })
    );
    assert_eq!(
        view.request_attendance("s1"),
        Err(ViewError::Rejected(RequestRejected::AlreadyAttended("s1".into())))
    );
    assert!(view.attendance_prompt().is_none());
}

#[tokio::test]
async fn test_anonymous_viewer_cannot_request() {
    let store = Arc::new(RecordingStore::with(vec![confirmed("s1", "e1", false)]));
    let mut view = attendance_view();
    view.attach(store.as_ref(), "e1", None).await;
    view.wait_loaded().await;
    assert_eq!(
        view.request_attendance("s1"),
        Err(ViewError::Rejected(RequestRejected::NotPermitted))
    );
}

#[tokio::test]
async fn test_reattach_releases_stale_subscription() {
    let store = RecordingStore::with(vec![confirmed("s1", "e1", false), confirmed("s2", "e2", false)]);
    let admin = admin_of("e1");
    let mut view = attendance_view();
    view.attach(&store, "e1", Some(&admin)).await;
    view.wait_loaded().await;

    // same event and role keeps the subscription
    view.attach(&store, "e1", Some(&admin)).await;
    assert_eq!(store.subscribe_calls.load(Ordering::SeqCst), 1);

    view.attach(&store, "e2", Some(&admin)).await;
    assert_eq!(store.subscribe_calls.load(Ordering::SeqCst), 2);
    assert!(view.signups().is_empty());
    view.wait_loaded().await;
    let ids: Vec<_> = view.signups().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s2"]);
    assert_eq!(view.event_id(), Some("e2"));
}

#[tokio::test]
async fn test_failed_subscription_leaves_empty_view() {
    let store = RecordingStore {
        fail_subscribe: true,
        ..RecordingStore::default()
    };
    let mut view = attendance_view();
    view.attach(&store, "e1", None).await;
    assert!(!view.is_loading());
    assert!(!view.is_subscribed());
    assert!(view.signups().is_empty());
    assert!(view.rows().is_empty());
    assert!(!view.pump().await);
}

#[tokio::test]
async fn test_events_after_release_are_not_applied() {
    let (tx, subscription) = Subscription::channel("e1", 4);
    assert!(tx.snapshot(vec![confirmed("s1", "e1", false)]).await);
    let mut subscription = subscription;
    subscription.unsubscribe();
    assert!(subscription.next().await.is_none());
    assert!(!tx.send(SubscriptionEvent::Loading(false)).await);
}

#[tokio::test]
async fn test_drain_applies_buffered_events() {
    let store = RecordingStore::with(vec![confirmed("s1", "e1", false)]);
    let mut view = attendance_view();
    view.attach(&store, "e1", None).await;
    assert!(view.is_loading());
    assert_eq!(view.drain(), 3);
    assert!(!view.is_loading());
    assert_eq!(view.signups().len(), 1);
    assert_eq!(view.drain(), 0);
}
