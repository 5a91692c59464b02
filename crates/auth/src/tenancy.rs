//! Tenant isolation filter.
//!
//! Decides which part of a collection a principal may observe, stamps the
//! principal's company onto new records and checks single-object access.
//! Entity types declare their [`EntityScope`] at compile time; nothing here
//! inspects values to discover whether a company attribute exists.

use serde::Serialize;
use thiserror::Error;

use erpguard_core::{CompanyId, Entity, EntityScope};

use crate::Principal;

/// Equality predicate a store applies when listing a collection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "company_id", rename_all = "snake_case")]
pub enum CollectionScope {
    /// No filtering.
    All,
    /// Only records owned by this company.
    Company(CompanyId),
    /// The empty collection.
    Nothing,
}

impl CollectionScope {
    /// Whether a record owned by `company` falls inside this scope.
    pub fn admits(&self, company: Option<CompanyId>) -> bool {
        match self {
            CollectionScope::All => true,
            CollectionScope::Company(id) => company == Some(*id),
            CollectionScope::Nothing => false,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TenancyError {
    #[error("cross-tenant access")]
    CrossTenant,

    #[error("user has no tenant")]
    NoTenant,

    #[error("user must belong to a company")]
    MissingCompany,
}

/// Records whose owning company is assigned on creation.
pub trait TenantStamped {
    fn stamp_company(&mut self, company: Option<CompanyId>);
}

/// Collection scope of entity type `E` for `principal`.
pub fn scope_for<E: Entity>(principal: &Principal) -> CollectionScope {
    if principal.is_superuser {
        return CollectionScope::All;
    }

    match (E::SCOPE, principal.company_id) {
        (EntityScope::Global, _) => CollectionScope::All,
        (EntityScope::Tenant, Some(company)) => CollectionScope::Company(company),
        (EntityScope::Tenant, None) => CollectionScope::Nothing,
        (EntityScope::Unscoped, Some(_)) => CollectionScope::Nothing,
        (EntityScope::Unscoped, None) => {
            // Known gap: tenant-less principals see unscoped collections in full.
            tracing::warn!(
                user_id = %principal.user_id,
                resource = E::RESOURCE,
                "tenant-less principal granted unfiltered view of unscoped collection"
            );
            CollectionScope::All
        }
    }
}

/// Prepare a payload for creation on behalf of `principal`.
///
/// Superusers keep whatever company the payload carries (including none).
/// Everyone else has their own company stamped over any supplied value.
pub fn authorize_create<P: TenantStamped>(
    principal: &Principal,
    mut payload: P,
) -> Result<P, TenancyError> {
    if principal.is_superuser {
        return Ok(payload);
    }

    match principal.company_id {
        Some(company) => {
            payload.stamp_company(Some(company));
            Ok(payload)
        }
        None => Err(TenancyError::MissingCompany),
    }
}

/// Check whether `principal` may read or mutate `object`.
pub fn authorize_access<E: Entity>(principal: &Principal, object: &E) -> Result<(), TenancyError> {
    if principal.is_superuser || E::SCOPE != EntityScope::Tenant {
        return Ok(());
    }

    let Some(company) = principal.company_id else {
        return Err(TenancyError::NoTenant);
    };

    if object.company() == Some(company) {
        Ok(())
    } else {
        Err(TenancyError::CrossTenant)
    }
}
