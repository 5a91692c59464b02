use thiserror::Error;

use crate::{Permission, PermissionResolver, Principal, RoleDirectory};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,

    /// Deliberately carries no label: denials never reveal which permission
    /// was checked.
    #[error("permission denied")]
    Forbidden,
}

/// Access decision gate: does the principal hold a required permission label?
///
/// - No IO beyond the resolver's directory reads
/// - No panics
/// - Independent of tenant scoping; callers compose both checks
#[derive(Debug, Clone)]
pub struct AccessGate<D> {
    resolver: PermissionResolver<D>,
}

impl<D: RoleDirectory> AccessGate<D> {
    pub fn new(directory: D) -> Self {
        Self {
            resolver: PermissionResolver::new(directory),
        }
    }

    pub fn resolver(&self) -> &PermissionResolver<D> {
        &self.resolver
    }

    pub fn authorize(
        &self,
        principal: Option<&Principal>,
        required: &Permission,
    ) -> Result<(), AuthzError> {
        let Some(principal) = principal else {
            return Err(AuthzError::Unauthenticated);
        };

        if principal.is_superuser {
            return Ok(());
        }

        if self.resolver.resolve(principal).contains(required) {
            Ok(())
        } else {
            tracing::debug!(
                user_id = %principal.user_id,
                permission = %required,
                "permission check failed"
            );
            Err(AuthzError::Forbidden)
        }
    }
}
