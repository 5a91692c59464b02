use chrono::{DateTime, Utc};
use thiserror::Error;

use erpguard_auth::{AuthzError, CredentialError, TenancyError};

use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Every rejection an engine operation can produce.
///
/// All variants are recoverable at the boundary; the API maps each one to a
/// status code. Messages are deliberately generic where detail would leak
/// credential or cross-tenant information.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Bad secret or unknown identity; never says which.
    #[error("invalid credentials")]
    AuthenticationFailure,

    #[error("account locked until {until}")]
    AccountLocked { until: DateTime<Utc> },

    #[error("authentication required")]
    Unauthenticated,

    #[error("permission denied")]
    PermissionDenied,

    /// The reason is kept for logs only.
    #[error("access denied")]
    TenantViolation(TenancyError),

    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(vec![msg.into()])
    }
}

impl From<AuthzError> for ServiceError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Unauthenticated => ServiceError::Unauthenticated,
            AuthzError::Forbidden => ServiceError::PermissionDenied,
        }
    }
}

impl From<TenancyError> for ServiceError {
    fn from(value: TenancyError) -> Self {
        match value {
            TenancyError::MissingCompany => ServiceError::validation(value.to_string()),
            other => ServiceError::TenantViolation(other),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => ServiceError::NotFound(what),
            StoreError::AlreadyExists(what) => ServiceError::Conflict(format!("{what} already exists")),
            StoreError::Unavailable(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<CredentialError> for ServiceError {
    fn from(value: CredentialError) -> Self {
        match value {
            CredentialError::EmptySecret => ServiceError::validation("password must not be empty"),
            CredentialError::Hashing(msg) => ServiceError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_violation_does_not_leak_reason() {
        let err = ServiceError::from(TenancyError::CrossTenant);
        assert_eq!(err.to_string(), "access denied");
    }

    #[test]
    fn missing_company_is_a_validation_failure() {
        let err = ServiceError::from(TenancyError::MissingCompany);
        assert_eq!(
            err,
            ServiceError::Validation(vec!["user must belong to a company".to_string()])
        );
    }

    #[test]
    fn duplicate_rows_surface_as_conflicts() {
        let err = ServiceError::from(StoreError::AlreadyExists("role Admin".to_string()));
        assert!(matches!(err, ServiceError::Conflict(_)));
    }
}
