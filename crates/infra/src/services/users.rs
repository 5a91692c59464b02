use serde::{Deserialize, Serialize};

use erpguard_auth::{
    AuditAction, AuditEvent, Principal, Role, SourceContext, UserAccount, UserRole, labels, tenancy,
};
use erpguard_core::{CompanyId, Entity, RoleId, UserId};
use erpguard_events::ChannelLayer;

use super::{AccessEngine, ServiceError, ServiceResult};
use crate::store::{EntityStore, StoreError};

/// Create/update payload. Absent fields are left unchanged on update.
///
/// `company` is honoured for superusers only; everyone else has their own
/// company stamped on create and cannot move users on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub company: Option<CompanyId>,
}

/// Result of an idempotent role-assignment change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentOutcome {
    Assigned,
    AlreadyAssigned,
    Removed,
    NotAssigned,
}

impl AssignmentOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            AssignmentOutcome::Assigned => "Role assigned successfully",
            AssignmentOutcome::AlreadyAssigned => "Role already assigned",
            AssignmentOutcome::Removed => "Role removed successfully",
            AssignmentOutcome::NotAssigned => "Role not assigned to user",
        }
    }

    /// Whether a row was written or deleted.
    pub fn changed(&self) -> bool {
        matches!(self, AssignmentOutcome::Assigned | AssignmentOutcome::Removed)
    }
}

fn validate_new_user(input: &UserInput) -> ServiceResult<(String, String, String)> {
    let mut problems = Vec::new();

    let username = input.username.as_deref().map(str::trim).unwrap_or_default();
    if username.is_empty() {
        problems.push("username must not be empty".to_string());
    }
    let email = input.email.as_deref().map(str::trim).unwrap_or_default();
    if !email.contains('@') {
        problems.push("email must be a valid address".to_string());
    }
    let password = input.password.as_deref().unwrap_or_default();
    if password.is_empty() {
        problems.push("password must not be empty".to_string());
    }

    if problems.is_empty() {
        Ok((username.to_string(), email.to_string(), password.to_string()))
    } else {
        Err(ServiceError::Validation(problems))
    }
}

impl<S, L> AccessEngine<S, L>
where
    S: EntityStore,
    L: ChannelLayer,
{
    pub fn list_users(&self, principal: &Principal) -> ServiceResult<Vec<UserAccount>> {
        self.require(principal, &labels::VIEW_USERS)?;
        Ok(self.store.list_users(tenancy::scope_for::<UserAccount>(principal)))
    }

    /// Retrieval needs no label, only tenant access.
    pub fn get_user(&self, principal: &Principal, id: UserId) -> ServiceResult<UserAccount> {
        self.visible(principal, self.store.get_user(id))
    }

    /// Roles currently held by a user the principal can see.
    pub fn roles_of(&self, principal: &Principal, id: UserId) -> ServiceResult<Vec<Role>> {
        let user = self.get_user(principal, id)?;
        Ok(erpguard_auth::RoleDirectory::roles_for_user(self.store.as_ref(), user.id))
    }

    pub fn create_user(
        &self,
        principal: &Principal,
        input: UserInput,
        ctx: &SourceContext,
    ) -> ServiceResult<UserAccount> {
        self.require(principal, &labels::CREATE_USER)?;
        let (username, email, password) = validate_new_user(&input)?;

        let mut account = UserAccount::new(username, email, self.now());
        account.first_name = input.first_name.unwrap_or_default();
        account.last_name = input.last_name.unwrap_or_default();
        account.is_active = input.is_active.unwrap_or(true);
        account.company = input.company;

        let mut account = tenancy::authorize_create(principal, account)?;
        if let Some(company) = account.company {
            self.store.get_company(company).ok_or(ServiceError::NotFound("Company"))?;
        }
        account.password_hash = self.credentials.hash_secret(&password)?;
        self.store.insert_user(account.clone())?;

        self.record(
            principal,
            AuditEvent::new(AuditAction::Create, UserAccount::RESOURCE, account.id, "Created user"),
            ctx,
        );
        Ok(account)
    }

    pub fn update_user(
        &self,
        principal: &Principal,
        id: UserId,
        input: UserInput,
        ctx: &SourceContext,
    ) -> ServiceResult<UserAccount> {
        self.require(principal, &labels::UPDATE_USER)?;
        let mut account = self.visible(principal, self.store.get_user(id))?;

        if let Some(username) = input.username {
            let username = username.trim();
            if username.is_empty() {
                return Err(ServiceError::validation("username must not be empty"));
            }
            account.username = username.to_string();
        }
        if let Some(email) = input.email {
            if !email.contains('@') {
                return Err(ServiceError::validation("email must be a valid address"));
            }
            account.email = email.trim().to_lowercase();
        }
        if let Some(first_name) = input.first_name {
            account.first_name = first_name;
        }
        if let Some(last_name) = input.last_name {
            account.last_name = last_name;
        }
        if let Some(active) = input.is_active {
            account.is_active = active;
        }
        if principal.is_superuser {
            if let Some(company) = input.company {
                self.store.get_company(company).ok_or(ServiceError::NotFound("Company"))?;
                account.company = Some(company);
            }
        } else if input.company.is_some_and(|c| Some(c) != account.company) {
            tracing::debug!(user_id = %account.id, "ignoring company change by non-superuser");
        }
        if let Some(password) = input.password.filter(|p| !p.is_empty()) {
            account.password_hash = self.credentials.hash_secret(&password)?;
        }
        account.updated_at = self.now();
        self.store.update_user(account.clone())?;

        self.record(
            principal,
            AuditEvent::new(
                AuditAction::Update,
                UserAccount::RESOURCE,
                account.id,
                format!("Updated user: {}", account.username),
            ),
            ctx,
        );
        Ok(account)
    }

    pub fn delete_user(&self, principal: &Principal, id: UserId, ctx: &SourceContext) -> ServiceResult<()> {
        self.require(principal, &labels::DELETE_USER)?;
        let account = self.visible(principal, self.store.get_user(id))?;

        self.store.delete_user(account.id)?;
        self.record(
            principal,
            AuditEvent::new(
                AuditAction::Delete,
                UserAccount::RESOURCE,
                account.id,
                format!("Deleted user: {}", account.username),
            ),
            ctx,
        );
        Ok(())
    }

    /// Move a user into a company. Superusers only.
    pub fn assign_company(
        &self,
        principal: &Principal,
        user_id: UserId,
        company_id: CompanyId,
        ctx: &SourceContext,
    ) -> ServiceResult<UserAccount> {
        if !principal.is_superuser {
            return Err(ServiceError::PermissionDenied);
        }
        let mut account = self.visible(principal, self.store.get_user(user_id))?;
        let company = self
            .store
            .get_company(company_id)
            .ok_or(ServiceError::NotFound("Company"))?;

        account.company = Some(company.id);
        account.updated_at = self.now();
        self.store.update_user(account.clone())?;

        self.record(
            principal,
            AuditEvent::new(
                AuditAction::Update,
                UserAccount::RESOURCE,
                account.id,
                format!("Assigned company {} to user {}", company.name, account.username),
            ),
            ctx,
        );
        Ok(account)
    }

    /// Give `role_id` to `user_id`. Assigning a held role is a no-op.
    pub fn assign_role(
        &self,
        principal: &Principal,
        user_id: UserId,
        role_id: RoleId,
        ctx: &SourceContext,
    ) -> ServiceResult<AssignmentOutcome> {
        self.require(principal, &labels::ASSIGN_ROLES)?;
        let account = self.visible(principal, self.store.get_user(user_id))?;
        let role = self.store.get_role(role_id).ok_or(ServiceError::NotFound(Role::RESOURCE))?;

        let row = UserRole::new(account.id, role.id, self.now());
        let row_id = row.id;
        match self.store.insert_user_role(row) {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(_)) => return Ok(AssignmentOutcome::AlreadyAssigned),
            Err(e) => return Err(e.into()),
        }

        self.record(
            principal,
            AuditEvent::new(
                AuditAction::Update,
                UserRole::RESOURCE,
                row_id,
                format!("Assigned role {} to user {}", role.name, account.username),
            ),
            ctx,
        );
        tracing::info!(user_id = %account.id, role = %role.name, "role assigned");
        self.notify_users([account.id]);
        Ok(AssignmentOutcome::Assigned)
    }

    /// Take `role_id` away from `user_id`. Removing an unheld role changes nothing.
    pub fn remove_role(
        &self,
        principal: &Principal,
        user_id: UserId,
        role_id: RoleId,
        ctx: &SourceContext,
    ) -> ServiceResult<AssignmentOutcome> {
        self.require(principal, &labels::ASSIGN_ROLES)?;
        let account = self.visible(principal, self.store.get_user(user_id))?;
        let role = self.store.get_role(role_id).ok_or(ServiceError::NotFound(Role::RESOURCE))?;

        let Some(row) = self.store.delete_user_role(account.id, role.id) else {
            return Ok(AssignmentOutcome::NotAssigned);
        };

        self.record(
            principal,
            AuditEvent::new(
                AuditAction::Update,
                UserRole::RESOURCE,
                row.id,
                format!("Removed role {} from user {}", role.name, account.username),
            ),
            ctx,
        );
        tracing::info!(user_id = %account.id, role = %role.name, "role removed");
        self.notify_users([account.id]);
        Ok(AssignmentOutcome::Removed)
    }
}
