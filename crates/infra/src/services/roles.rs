use std::collections::BTreeSet;

use serde::Deserialize;

use erpguard_auth::{
    AuditAction, AuditEvent, Permission, PermissionDefinition, Principal, Role, RoleDirectory,
    SourceContext, labels,
};
use erpguard_core::{Entity, RoleId};
use erpguard_events::ChannelLayer;

use super::{AccessEngine, ServiceError, ServiceResult};
use crate::store::EntityStore;

/// Create/update payload. Absent fields are left unchanged on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

fn role_name(name: Option<&str>) -> ServiceResult<String> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ServiceError::validation("name must not be empty")),
    }
}

impl<S, L> AccessEngine<S, L>
where
    S: EntityStore,
    L: ChannelLayer,
{
    pub fn list_roles(&self, principal: &Principal) -> ServiceResult<Vec<Role>> {
        self.require(principal, &labels::VIEW_ROLES)?;
        Ok(self.store.list_roles())
    }

    /// Roles are global: any authenticated principal may retrieve one.
    pub fn get_role(&self, _principal: &Principal, id: RoleId) -> ServiceResult<Role> {
        self.store.get_role(id).ok_or(ServiceError::NotFound(Role::RESOURCE))
    }

    pub fn create_role(&self, principal: &Principal, input: RoleInput, ctx: &SourceContext) -> ServiceResult<Role> {
        self.require(principal, &labels::CREATE_ROLE)?;

        let role = Role::new(
            role_name(input.name.as_deref())?,
            input.description.unwrap_or_default(),
            self.now(),
        );
        self.store.insert_role(role.clone())?;

        self.record(
            principal,
            AuditEvent::new(AuditAction::Create, Role::RESOURCE, role.id, format!("Created role: {}", role.name)),
            ctx,
        );
        Ok(role)
    }

    pub fn update_role(
        &self,
        principal: &Principal,
        id: RoleId,
        input: RoleInput,
        ctx: &SourceContext,
    ) -> ServiceResult<Role> {
        self.require(principal, &labels::UPDATE_ROLE)?;
        let mut role = self.store.get_role(id).ok_or(ServiceError::NotFound(Role::RESOURCE))?;

        if input.name.is_some() {
            role.name = role_name(input.name.as_deref())?;
        }
        if let Some(description) = input.description {
            role.description = description;
        }
        self.store.update_role(role.clone())?;

        self.record(
            principal,
            AuditEvent::new(AuditAction::Update, Role::RESOURCE, role.id, format!("Updated role: {}", role.name)),
            ctx,
        );
        Ok(role)
    }

    /// Deleting a role drops its assignments; former holders are notified.
    pub fn delete_role(&self, principal: &Principal, id: RoleId, ctx: &SourceContext) -> ServiceResult<()> {
        self.require(principal, &labels::DELETE_ROLE)?;

        let (role, holders) = self.store.delete_role(id)?;
        self.record(
            principal,
            AuditEvent::new(AuditAction::Delete, Role::RESOURCE, role.id, format!("Deleted role: {}", role.name)),
            ctx,
        );
        tracing::info!(role = %role.name, holders = holders.len(), "role deleted");
        self.notify_users(holders);
        Ok(())
    }

    /// Replace the role's permission set with the catalog entries named in
    /// `names`. Names outside the catalog are ignored.
    pub fn assign_permissions(
        &self,
        principal: &Principal,
        id: RoleId,
        names: &[String],
        ctx: &SourceContext,
    ) -> ServiceResult<Role> {
        self.require(principal, &labels::ASSIGN_PERMISSIONS)?;
        let mut role = self.store.get_role(id).ok_or(ServiceError::NotFound(Role::RESOURCE))?;

        let requested: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        let granted: BTreeSet<Permission> = self
            .store
            .permission_catalog()
            .into_iter()
            .map(|def| def.name)
            .filter(|p| requested.contains(p.as_str()))
            .collect();
        if granted.len() < requested.len() {
            tracing::debug!(role = %role.name, "ignoring permission names outside the catalog");
        }

        role.permissions = granted;
        self.store.update_role(role.clone())?;

        self.record(
            principal,
            AuditEvent::new(
                AuditAction::Update,
                Role::RESOURCE,
                role.id,
                format!("Updated permissions for role: {}", role.name),
            ),
            ctx,
        );
        self.notify_users(self.store.holders_of(role.id));
        Ok(role)
    }

    pub fn list_permissions(&self, principal: &Principal) -> ServiceResult<Vec<PermissionDefinition>> {
        self.require(principal, &labels::VIEW_PERMISSIONS)?;
        Ok(self.store.permission_catalog())
    }
}
