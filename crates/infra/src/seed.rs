//! Deployment-time bootstrap: permission catalog and first superuser.

use chrono::{DateTime, Utc};

use erpguard_auth::{CredentialVerifier, PermissionDefinition, UserAccount, labels};

use crate::services::{ServiceError, ServiceResult};
use crate::store::{EntityStore, StoreError};

/// Get-or-create every catalog label. Returns how many were created.
pub fn seed_permission_catalog<S: EntityStore + ?Sized>(store: &S) -> ServiceResult<usize> {
    let existing = store.permission_catalog();
    let mut created = 0;

    for (label, description) in labels::CATALOG {
        if existing.iter().any(|def| &def.name == label) {
            continue;
        }
        match store.insert_permission(PermissionDefinition::new(label.clone(), *description)) {
            Ok(()) => created += 1,
            Err(StoreError::AlreadyExists(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    if created > 0 {
        tracing::info!(created, "permission catalog seeded");
    }
    Ok(created)
}

/// Make sure a superuser with `email` exists and return it.
///
/// An existing account is promoted if needed; its secret is left alone.
pub fn ensure_superuser<S: EntityStore + ?Sized>(
    store: &S,
    credentials: &dyn CredentialVerifier,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> ServiceResult<UserAccount> {
    if let Some(mut account) = store.find_user_by_email(email) {
        if !account.is_superuser {
            account.is_superuser = true;
            account.updated_at = now;
            store.update_user(account.clone())?;
            tracing::info!(user_id = %account.id, "existing account promoted to superuser");
        }
        return Ok(account);
    }

    let username = match email.trim().split_once('@') {
        Some((local, _)) if !local.is_empty() => local,
        _ => return Err(ServiceError::validation("email must be a valid address")),
    };

    let mut account = UserAccount::new(username, email, now).superuser();
    account.password_hash = credentials.hash_secret(password)?;
    store.insert_user(account.clone())?;
    tracing::info!(user_id = %account.id, "bootstrap superuser created");
    Ok(account)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use erpguard_auth::{CredentialError, RoleDirectory};

    use super::*;
    use crate::store::InMemoryEntityStore;

    struct PlainText;

    impl CredentialVerifier for PlainText {
        fn hash_secret(&self, secret: &str) -> Result<String, CredentialError> {
            Ok(secret.to_string())
        }

        fn verify(&self, account: &UserAccount, secret: &str) -> bool {
            account.password_hash == secret
        }
    }

    #[test]
    fn seeding_is_idempotent() {
        let store = InMemoryEntityStore::new();

        assert_eq!(seed_permission_catalog(&store).unwrap(), labels::CATALOG.len());
        assert_eq!(seed_permission_catalog(&store).unwrap(), 0);
        assert_eq!(store.permission_catalog().len(), 16);
    }

    #[test]
    fn ensure_superuser_creates_once() {
        let store = InMemoryEntityStore::new();

        let first = ensure_superuser(&store, &PlainText, "root@example.com", "pw", Utc::now()).unwrap();
        let second = ensure_superuser(&store, &PlainText, "ROOT@example.com", "other", Utc::now()).unwrap();

        assert!(first.is_superuser);
        assert_eq!(first.id, second.id);
        assert_eq!(first.username, "root");
        assert_eq!(store.list_users(erpguard_auth::CollectionScope::All).len(), 1);
    }

    #[test]
    fn ensure_superuser_rejects_malformed_email() {
        let store = InMemoryEntityStore::new();
        assert!(matches!(
            ensure_superuser(&store, &PlainText, "nobody", "pw", Utc::now()),
            Err(ServiceError::Validation(_))
        ));
    }
}
