//! Entity store abstraction.
//!
//! The engine treats persistence as a collaborator: it issues
//! query-by-filter reads (tenant filtering is a plain company equality
//! predicate expressed as a [`CollectionScope`]) and create/update/delete
//! writes. Unique-constraint violations surface as
//! [`StoreError::AlreadyExists`].

pub mod in_memory;

use chrono::{DateTime, Utc};
use thiserror::Error;

use erpguard_auth::{
    AuditEntry, AuditSink, CollectionScope, Company, PermissionDefinition, Role, RoleDirectory,
    UserAccount, UserRole,
};
use erpguard_core::{CompanyId, RoleId, UserId};

pub use in_memory::InMemoryEntityStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unique constraint violation.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence collaborator for every entity the engine touches.
///
/// Reads are infallible (an unavailable store reads as empty); writes report
/// constraint violations. The store is also the engine's [`RoleDirectory`]
/// and [`AuditSink`].
pub trait EntityStore: RoleDirectory + AuditSink + Send + Sync {
    // Companies
    fn list_companies(&self, scope: CollectionScope) -> Vec<Company>;
    fn get_company(&self, id: CompanyId) -> Option<Company>;
    fn insert_company(&self, company: Company) -> Result<(), StoreError>;
    fn update_company(&self, company: Company) -> Result<(), StoreError>;
    /// Deleting a company cascades to its users and their role assignments.
    fn delete_company(&self, id: CompanyId) -> Result<Company, StoreError>;

    // Users
    fn list_users(&self, scope: CollectionScope) -> Vec<UserAccount>;
    fn get_user(&self, id: UserId) -> Option<UserAccount>;
    /// Case-insensitive email lookup.
    fn find_user_by_email(&self, email: &str) -> Option<UserAccount>;
    /// Email and username are unique.
    fn insert_user(&self, user: UserAccount) -> Result<(), StoreError>;
    fn update_user(&self, user: UserAccount) -> Result<(), StoreError>;
    /// Writes only the lockout counters (and `updated_at`) of the current row,
    /// leaving every other field as the latest writer left it.
    fn apply_login_counters(
        &self,
        id: UserId,
        failed_login_attempts: u32,
        locked_until: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    fn delete_user(&self, id: UserId) -> Result<UserAccount, StoreError>;

    // Roles
    fn list_roles(&self) -> Vec<Role>;
    fn get_role(&self, id: RoleId) -> Option<Role>;
    /// Role names are unique.
    fn insert_role(&self, role: Role) -> Result<(), StoreError>;
    fn update_role(&self, role: Role) -> Result<(), StoreError>;
    /// Removes the role and its assignments; returns the former holders.
    fn delete_role(&self, id: RoleId) -> Result<(Role, Vec<UserId>), StoreError>;

    // Permission catalog
    /// Permission names are unique.
    fn insert_permission(&self, permission: PermissionDefinition) -> Result<(), StoreError>;

    // Role assignments
    fn holders_of(&self, role_id: RoleId) -> Vec<UserId>;
    /// The `(user, role)` pair is unique.
    fn insert_user_role(&self, row: UserRole) -> Result<(), StoreError>;
    fn delete_user_role(&self, user_id: UserId, role_id: RoleId) -> Option<UserRole>;

    // Audit log (append through `AuditSink`)
    fn list_audit(&self, scope: CollectionScope) -> Vec<AuditEntry>;
}
