//! Engine services: every administrative operation, composed from the
//! authorization primitives in `erpguard-auth`.
//!
//! Each operation follows the same shape:
//!
//! ```text
//! principal + source context
//!   ↓
//! 1. Access Decision Gate (required permission label)
//!   ↓
//! 2. Tenant Isolation Filter (scope / stamp / access)
//!   ↓
//! 3. Entity store read or write
//!   ↓
//! 4. Audit Recorder (one entry per mutation)
//!   ↓
//! 5. Change Notifier (role-assignment changes only)
//! ```

mod audit_log;
mod auth;
mod companies;
mod error;
mod roles;
mod users;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use erpguard_auth::{
    AccessGate, AccountGuard, AuditEvent, AuditRecorder, CredentialVerifier, LockoutPolicy,
    Permission, Principal, SourceContext, TenancyError,
};
use erpguard_core::{Entity, UserId};
use erpguard_events::{ChangeNotifier, ChannelLayer};

use crate::store::EntityStore;

pub use audit_log::AuditQuery;
pub use auth::{CurrentUser, LoginResult};
pub use companies::CompanyInput;
pub use error::{ServiceError, ServiceResult};
pub use roles::RoleInput;
pub use users::{AssignmentOutcome, UserInput};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The authorization and tenant-isolation engine.
///
/// Cheap to clone; all collaborators are shared.
pub struct AccessEngine<S, L> {
    store: Arc<S>,
    gate: AccessGate<Arc<S>>,
    guard: AccountGuard,
    audit: AuditRecorder<Arc<S>>,
    notifier: ChangeNotifier<Arc<L>>,
    credentials: Arc<dyn CredentialVerifier>,
    clock: Arc<dyn Clock>,
}

impl<S, L> Clone for AccessEngine<S, L> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gate: self.gate.clone(),
            guard: self.guard,
            audit: self.audit.clone(),
            notifier: self.notifier.clone(),
            credentials: self.credentials.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S, L> core::fmt::Debug for AccessEngine<S, L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccessEngine")
            .field("lockout", self.guard.policy())
            .finish_non_exhaustive()
    }
}

impl<S, L> AccessEngine<S, L>
where
    S: EntityStore,
    L: ChannelLayer,
{
    pub fn new(store: Arc<S>, channels: Arc<L>, credentials: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            gate: AccessGate::new(store.clone()),
            audit: AuditRecorder::new(store.clone()),
            store,
            guard: AccountGuard::default(),
            notifier: ChangeNotifier::new(channels),
            credentials,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_lockout(mut self, policy: LockoutPolicy) -> Self {
        self.guard = AccountGuard::new(policy);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn notifier(&self) -> &ChangeNotifier<Arc<L>> {
        &self.notifier
    }

    pub fn credentials(&self) -> &dyn CredentialVerifier {
        self.credentials.as_ref()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn require(&self, principal: &Principal, label: &Permission) -> ServiceResult<()> {
        self.gate.authorize(Some(principal), label)?;
        Ok(())
    }

    fn record(&self, actor: &Principal, event: AuditEvent, ctx: &SourceContext) {
        self.audit.record(Some(actor), event, Some(ctx), self.now());
    }

    /// Effective permission labels of `principal`, sorted.
    fn permission_labels(&self, principal: &Principal) -> Vec<String> {
        self.gate
            .resolver()
            .resolve(principal)
            .into_iter()
            .map(|p| p.as_str().to_string())
            .collect()
    }

    /// Apply the single-object tenant check to a lookup result.
    ///
    /// Non-superusers get the same denial for a missing object as for a
    /// foreign one, so ids in other tenants cannot be probed.
    fn visible<E: Entity>(&self, principal: &Principal, found: Option<E>) -> ServiceResult<E> {
        match found {
            Some(object) => {
                erpguard_auth::tenancy::authorize_access(principal, &object)?;
                Ok(object)
            }
            None if principal.is_superuser => Err(ServiceError::NotFound(E::RESOURCE)),
            None if principal.company_id.is_some() => {
                Err(ServiceError::TenantViolation(TenancyError::CrossTenant))
            }
            None => Err(ServiceError::TenantViolation(TenancyError::NoTenant)),
        }
    }

    /// Push a freshly resolved permission set to each user's live connections.
    fn notify_users(&self, users: impl IntoIterator<Item = UserId>) {
        for user_id in users {
            let Some(account) = self.store.get_user(user_id) else {
                continue;
            };
            let principal = Principal::from_account(&account);
            self.notifier
                .notify_permission_change(user_id, self.permission_labels(&principal));
        }
    }
}
