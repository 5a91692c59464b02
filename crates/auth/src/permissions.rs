use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use erpguard_core::{Entity, EntityScope, PermissionId};

/// Permission label.
///
/// Permissions are modeled as opaque upper-case strings (e.g. `VIEW_USERS`).
/// The set of valid labels is the seeded catalog; see [`labels::CATALOG`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog entry: the persisted form of a permission label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    pub id: PermissionId,
    pub name: Permission,
    pub description: String,
}

impl PermissionDefinition {
    pub fn new(name: Permission, description: impl Into<String>) -> Self {
        Self {
            id: PermissionId::new(),
            name,
            description: description.into(),
        }
    }
}

impl Entity for PermissionDefinition {
    type Id = PermissionId;

    const SCOPE: EntityScope = EntityScope::Global;
    const RESOURCE: &'static str = "Permission";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Well-known permission labels seeded at deployment time.
pub mod labels {
    use super::Permission;

    pub const VIEW_COMPANIES: Permission = Permission::from_static("VIEW_COMPANIES");
    pub const CREATE_COMPANY: Permission = Permission::from_static("CREATE_COMPANY");
    pub const UPDATE_COMPANY: Permission = Permission::from_static("UPDATE_COMPANY");
    pub const DELETE_COMPANY: Permission = Permission::from_static("DELETE_COMPANY");
    pub const VIEW_USERS: Permission = Permission::from_static("VIEW_USERS");
    pub const CREATE_USER: Permission = Permission::from_static("CREATE_USER");
    pub const UPDATE_USER: Permission = Permission::from_static("UPDATE_USER");
    pub const DELETE_USER: Permission = Permission::from_static("DELETE_USER");
    pub const VIEW_ROLES: Permission = Permission::from_static("VIEW_ROLES");
    pub const CREATE_ROLE: Permission = Permission::from_static("CREATE_ROLE");
    pub const UPDATE_ROLE: Permission = Permission::from_static("UPDATE_ROLE");
    pub const DELETE_ROLE: Permission = Permission::from_static("DELETE_ROLE");
    pub const VIEW_PERMISSIONS: Permission = Permission::from_static("VIEW_PERMISSIONS");
    pub const ASSIGN_PERMISSIONS: Permission = Permission::from_static("ASSIGN_PERMISSIONS");
    pub const ASSIGN_ROLES: Permission = Permission::from_static("ASSIGN_ROLES");
    pub const VIEW_AUDIT_LOGS: Permission = Permission::from_static("VIEW_AUDIT_LOGS");

    /// Seed catalog: `(label, description)`.
    pub const CATALOG: &[(Permission, &str)] = &[
        (VIEW_COMPANIES, "Can view companies"),
        (CREATE_COMPANY, "Can create companies"),
        (UPDATE_COMPANY, "Can update companies"),
        (DELETE_COMPANY, "Can delete companies"),
        (VIEW_USERS, "Can view users"),
        (CREATE_USER, "Can create users"),
        (UPDATE_USER, "Can update users"),
        (DELETE_USER, "Can delete users"),
        (VIEW_ROLES, "Can view roles"),
        (CREATE_ROLE, "Can create roles"),
        (UPDATE_ROLE, "Can update roles"),
        (DELETE_ROLE, "Can delete roles"),
        (VIEW_PERMISSIONS, "Can view permissions"),
        (ASSIGN_PERMISSIONS, "Can assign permissions to roles"),
        (ASSIGN_ROLES, "Can assign roles to users"),
        (VIEW_AUDIT_LOGS, "Can view audit logs"),
    ];
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalog_labels_are_unique() {
        let names: HashSet<&str> = labels::CATALOG.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(names.len(), labels::CATALOG.len());
    }

    #[test]
    fn static_and_owned_labels_compare_equal() {
        assert_eq!(labels::VIEW_USERS, Permission::new("VIEW_USERS".to_string()));
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&labels::ASSIGN_ROLES).unwrap();
        assert_eq!(json, "\"ASSIGN_ROLES\"");
    }
}
