//! Permission resolution: roles → effective permission set.

use std::collections::BTreeSet;
use std::sync::Arc;

use erpguard_core::UserId;

use crate::{Permission, PermissionDefinition, Principal, Role};

/// Effective permission set of a principal (ordered for stable output).
pub type PermissionSet = BTreeSet<Permission>;

/// Read-only view of role assignments and the permission catalog.
///
/// Implemented by the entity store; the resolver never writes.
pub trait RoleDirectory: Send + Sync {
    /// All roles currently assigned to `user_id` (empty if none).
    fn roles_for_user(&self, user_id: UserId) -> Vec<Role>;

    /// The full permission catalog as currently persisted.
    fn permission_catalog(&self) -> Vec<PermissionDefinition>;
}

impl<D> RoleDirectory for Arc<D>
where
    D: RoleDirectory + ?Sized,
{
    fn roles_for_user(&self, user_id: UserId) -> Vec<Role> {
        (**self).roles_for_user(user_id)
    }

    fn permission_catalog(&self) -> Vec<PermissionDefinition> {
        (**self).permission_catalog()
    }
}

/// Union of the permission labels of `roles`.
pub fn effective_permissions<'a>(roles: impl IntoIterator<Item = &'a Role>) -> PermissionSet {
    roles
        .into_iter()
        .flat_map(|role| role.permissions.iter().cloned())
        .collect()
}

/// Computes a principal's effective permission set.
///
/// Superusers resolve to the whole catalog, read fresh on every call so that
/// labels added after the account was created are included.
#[derive(Debug, Clone)]
pub struct PermissionResolver<D> {
    directory: D,
}

impl<D: RoleDirectory> PermissionResolver<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn resolve(&self, principal: &Principal) -> PermissionSet {
        if principal.is_superuser {
            return self
                .directory
                .permission_catalog()
                .into_iter()
                .map(|def| def.name)
                .collect();
        }

        let roles = self.directory.roles_for_user(principal.user_id);
        effective_permissions(&roles)
    }
}
