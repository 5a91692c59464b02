//! Argon2 authentication collaborator.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use erpguard_auth::{CredentialError, CredentialVerifier, UserAccount};

/// Stores secrets as PHC-formatted argon2id hashes.
#[derive(Debug, Clone, Default)]
pub struct Argon2Credentials;

impl Argon2Credentials {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialVerifier for Argon2Credentials {
    fn hash_secret(&self, secret: &str) -> Result<String, CredentialError> {
        if secret.is_empty() {
            return Err(CredentialError::EmptySecret);
        }
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CredentialError::Hashing(e.to_string()))
    }

    fn verify(&self, account: &UserAccount, secret: &str) -> bool {
        if account.password_hash.is_empty() {
            return false;
        }
        match PasswordHash::new(&account.password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(secret.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(user_id = %account.id, error = %e, "stored credential is not a valid hash");
                false
            }
        }
    }
}
