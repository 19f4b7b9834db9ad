pub mod attendance;
pub mod config;
pub mod contact;
pub mod deserializers;
pub mod error;
pub mod fields;
pub mod i18n;
pub mod navigation;
pub mod projection;
pub mod roles;
pub mod signup;
pub mod store;
pub mod view;

pub use error::{EtiSignupsError, Result};
pub use fields::{SignupField, ViewMode, ViewerContext};
pub use signup::{Signup, SignupStatus, StatusHistoryEntry};
pub use store::{SignupStore, Subscription, SubscriptionEvent};
pub use view::SignupListView;
