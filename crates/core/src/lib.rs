//! `erpguard-core` — shared building blocks for the authorization engine.
//!
//! This crate contains **pure** primitives (no storage, no transport): typed
//! identifiers, the domain error model and the entity classification used by
//! tenant isolation.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::{Entity, EntityScope};
pub use error::DomainError;
pub use id::{AuditEntryId, CompanyId, PermissionId, RoleId, UserId, UserRoleId};
