//! User account record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use erpguard_core::{CompanyId, Entity, EntityScope, UserId};

use crate::tenancy::TenantStamped;

/// A user account as held by the entity store.
///
/// # Invariants
/// - `company == None` means the account is tenant-less.
/// - `failed_login_attempts` and `locked_until` are only mutated through
///   [`crate::AccountGuard`].
/// - `password_hash` is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<CompanyId>,
    pub is_superuser: bool,
    pub is_active: bool,
    #[serde(skip)]
    pub password_hash: String,
    pub failed_login_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(username: impl Into<String>, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            email: email.into().trim().to_lowercase(),
            first_name: String::new(),
            last_name: String::new(),
            company: None,
            is_superuser: false,
            is_active: true,
            password_hash: String::new(),
            failed_login_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn in_company(mut self, company: CompanyId) -> Self {
        self.company = Some(company);
        self
    }

    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }
}

impl Entity for UserAccount {
    type Id = UserId;

    const SCOPE: EntityScope = EntityScope::Tenant;
    const RESOURCE: &'static str = "User";

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn company(&self) -> Option<CompanyId> {
        self.company
    }
}

impl TenantStamped for UserAccount {
    fn stamp_company(&mut self, company: Option<CompanyId>) {
        self.company = company;
    }
}
