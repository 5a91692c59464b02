use serde::Serialize;

use erpguard_auth::{
    AuditAction, AuditEvent, LockoutStatus, Principal, Role, RoleDirectory, SourceContext,
    UserAccount,
};
use erpguard_core::{Entity, UserId};
use erpguard_events::ChannelLayer;

use super::{AccessEngine, ServiceError, ServiceResult};
use crate::store::EntityStore;

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub account: UserAccount,
    pub principal: Principal,
    /// Effective permission labels, sorted.
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub user: UserAccount,
    pub permissions: Vec<String>,
    pub roles: Vec<Role>,
}

impl<S, L> AccessEngine<S, L>
where
    S: EntityStore,
    L: ChannelLayer,
{
    /// Authenticate by email and secret, applying lockout and audit policy.
    ///
    /// Unknown email, wrong secret and inactive account are indistinguishable
    /// to the caller. An active lockout is reported distinctly and refuses
    /// authentication even when the secret is correct.
    pub fn login(&self, email: &str, password: &str, ctx: &SourceContext) -> ServiceResult<LoginResult> {
        let now = self.now();

        let Some(mut account) = self.store.find_user_by_email(email) else {
            let event = AuditEvent::new(AuditAction::Login, UserAccount::RESOURCE, "unknown", "Failed login attempt");
            if self.audit.record(None, event, Some(ctx), now).is_none() {
                tracing::warn!("login attempt for unknown account not recorded");
            }
            return Err(ServiceError::AuthenticationFailure);
        };
        let actor = Principal::from_account(&account);

        if let LockoutStatus::Locked { until } = self.guard.check_lockout(&account, now) {
            self.record(
                &actor,
                AuditEvent::new(
                    AuditAction::Login,
                    UserAccount::RESOURCE,
                    account.id,
                    "Failed login attempt - account locked",
                ),
                ctx,
            );
            tracing::debug!(user_id = %account.id, %until, "login refused: account locked");
            return Err(ServiceError::AccountLocked { until });
        }

        // The row may have changed during verification; write back counters only.
        if !account.is_active || !self.credentials.verify(&account, password) {
            let outcome = self.guard.record_failure(&mut account, now);
            self.store
                .apply_login_counters(account.id, outcome.attempts, outcome.locked_until, now)?;
            self.record(
                &actor,
                AuditEvent::new(
                    AuditAction::Login,
                    UserAccount::RESOURCE,
                    account.id,
                    format!("Failed login attempt #{}", outcome.attempts),
                ),
                ctx,
            );
            if outcome.newly_locked {
                tracing::info!(
                    user_id = %account.id,
                    attempts = outcome.attempts,
                    locked_until = ?outcome.locked_until,
                    "account locked after repeated login failures"
                );
            }
            return Err(ServiceError::AuthenticationFailure);
        }

        if self.guard.record_success(&mut account, now) {
            self.store.apply_login_counters(account.id, 0, None, now)?;
            if let Some(current) = self.store.get_user(account.id) {
                account = current;
            }
        }
        self.record(
            &actor,
            AuditEvent::new(AuditAction::Login, UserAccount::RESOURCE, account.id, "Successful login"),
            ctx,
        );

        let permissions = self.permission_labels(&actor);
        tracing::info!(user_id = %account.id, "login succeeded");
        Ok(LoginResult {
            account,
            principal: actor,
            permissions,
        })
    }

    pub fn logout(&self, principal: &Principal, ctx: &SourceContext) -> ServiceResult<()> {
        self.record(
            principal,
            AuditEvent::new(AuditAction::Logout, UserAccount::RESOURCE, principal.user_id, "User logged out"),
            ctx,
        );
        Ok(())
    }

    pub fn current_user(&self, principal: &Principal) -> ServiceResult<CurrentUser> {
        let user = self
            .store
            .get_user(principal.user_id)
            .ok_or(ServiceError::Unauthenticated)?;
        Ok(CurrentUser {
            permissions: self.permission_labels(principal),
            roles: self.store.roles_for_user(user.id),
            user,
        })
    }

    /// Resolve the principal behind a verified token.
    ///
    /// Runs on every request, so role and company changes apply without a new
    /// login and an account locked mid-session is refused immediately.
    pub fn principal_for(&self, user_id: UserId) -> ServiceResult<Principal> {
        let account = self
            .store
            .get_user(user_id)
            .filter(|a| a.is_active)
            .ok_or(ServiceError::Unauthenticated)?;

        if let LockoutStatus::Locked { until } = self.guard.check_lockout(&account, self.now()) {
            return Err(ServiceError::AccountLocked { until });
        }

        Ok(Principal::from_account(&account))
    }
}
