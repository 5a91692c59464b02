use serde::{Deserialize, Serialize};

use erpguard_core::UserId;

/// Message pushed to a user's live connections.
///
/// Serialized as `{ "type": "permissionUpdate", "userId": ..., "permissions": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    #[serde(rename = "permissionUpdate", rename_all = "camelCase")]
    PermissionUpdate {
        user_id: UserId,
        permissions: Vec<String>,
    },
}

impl Notification {
    pub fn permission_update(user_id: UserId, permissions: Vec<String>) -> Self {
        Notification::PermissionUpdate {
            user_id,
            permissions,
        }
    }

    /// Event name used by streaming transports.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::PermissionUpdate { .. } => "permissionUpdate",
        }
    }
}
