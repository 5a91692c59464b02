//! `erpguard-auth` — pure authorization and tenant-isolation engine.
//!
//! This crate is intentionally decoupled from HTTP and storage. Collaborators
//! plug in through small traits: [`RoleDirectory`] for role lookups,
//! [`AuditSink`] for persisting audit entries and [`CredentialVerifier`] for
//! secret verification.

pub mod audit;
pub mod authorize;
pub mod claims;
pub mod company;
pub mod credentials;
pub mod jwt;
pub mod lockout;
pub mod permissions;
pub mod principal;
pub mod resolver;
pub mod roles;
pub mod tenancy;
pub mod user;

pub use audit::{AuditAction, AuditEntry, AuditEvent, AuditRecorder, AuditSink, SourceContext};
pub use authorize::{AccessGate, AuthzError};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use company::Company;
pub use credentials::{CredentialError, CredentialVerifier};
pub use jwt::{Hs256Jwt, JwtValidator};
pub use lockout::{AccountGuard, FailureOutcome, LockoutPolicy, LockoutStatus};
pub use permissions::{Permission, PermissionDefinition, labels};
pub use principal::Principal;
pub use resolver::{PermissionResolver, PermissionSet, RoleDirectory, effective_permissions};
pub use roles::{Role, UserRole};
pub use tenancy::{CollectionScope, TenancyError, TenantStamped};
pub use user::UserAccount;
