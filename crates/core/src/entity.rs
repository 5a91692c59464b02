//! Entity trait: identity plus the tenant classification of the entity type.

use crate::id::CompanyId;

/// How an entity type relates to the company (tenant) boundary.
///
/// The classification is a property of the *type*, fixed at compile time, so
/// the isolation filter never has to probe values for a company attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntityScope {
    /// Carries a company reference and is filtered by it.
    Tenant,
    /// System-wide catalog data (roles, permissions); never tenant-filtered.
    Global,
    /// Carries no company reference but is not part of the global catalog
    /// (e.g. join rows). Company members see nothing; tenant-less users fall
    /// back to an unfiltered view.
    Unscoped,
}

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Tenant classification of this entity type.
    const SCOPE: EntityScope;

    /// Short resource name used in audit entries and error messages.
    const RESOURCE: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Owning company. Only meaningful for [`EntityScope::Tenant`] types.
    fn company(&self) -> Option<CompanyId> {
        None
    }
}
