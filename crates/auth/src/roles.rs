use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use erpguard_core::{Entity, EntityScope, RoleId, UserId, UserRoleId};

use crate::Permission;

/// Named bundle of permission labels.
///
/// Roles are system-wide: any role can be assigned to any user regardless of
/// the user's company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub permissions: BTreeSet<Permission>,
    pub created_at: DateTime<Utc>,
}

impl Role {
    pub fn new(name: impl Into<String>, description: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            description: description.into(),
            permissions: BTreeSet::new(),
            created_at: now,
        }
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    pub fn grants(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }
}

impl Entity for Role {
    type Id = RoleId;

    const SCOPE: EntityScope = EntityScope::Global;
    const RESOURCE: &'static str = "Role";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Join row linking one user to one role.
///
/// The `(user_id, role_id)` pair is unique; stores must reject duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: UserRoleId,
    pub user_id: UserId,
    pub role_id: RoleId,
    pub assigned_at: DateTime<Utc>,
}

impl UserRole {
    pub fn new(user_id: UserId, role_id: RoleId, now: DateTime<Utc>) -> Self {
        Self {
            id: UserRoleId::new(),
            user_id,
            role_id,
            assigned_at: now,
        }
    }
}

impl Entity for UserRole {
    type Id = UserRoleId;

    const SCOPE: EntityScope = EntityScope::Unscoped;
    const RESOURCE: &'static str = "UserRole";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
