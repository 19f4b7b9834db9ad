//! Viewer roles resolved from the signed-in user's profile.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SUPERADMIN_ROLE: &str = "superadmin";

/// Signed-in user as far as role resolution is concerned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Role name -> granted
    #[serde(default)]
    pub roles: BTreeMap<String, bool>,
    /// Events this user administers
    #[serde(default)]
    pub admin_of: Vec<String>,
}

pub fn is_super_admin(user: Option<&User>) -> bool {
    user.is_some_and(|u| u.roles.get(SUPERADMIN_ROLE).copied().unwrap_or(false))
}

/// Super admins administer every event.
pub fn is_event_admin(user: Option<&User>, event_id: Option<&str>) -> bool {
    if is_super_admin(user) {
        return true;
    }
    match (user, event_id) {
        (Some(u), Some(id)) => u.admin_of.iter().any(|e| e == id),
        _ => false,
    }
}

/// Role of the viewer for field visibility purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    None,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn resolve(user: Option<&User>, event_id: Option<&str>) -> Self {
        if is_super_admin(user) {
            Role::SuperAdmin
        } else if is_event_admin(user, event_id) {
            Role::Admin
        } else {
            Role::None
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}
