//! Authentication collaborator seam.
//!
//! The engine owns lockout and audit policy around authentication but not the
//! secret hashing itself.

use thiserror::Error;

use crate::UserAccount;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("secret must not be empty")]
    EmptySecret,

    #[error("failed to hash secret: {0}")]
    Hashing(String),
}

pub trait CredentialVerifier: Send + Sync {
    /// Produce the stored representation of `secret`.
    fn hash_secret(&self, secret: &str) -> Result<String, CredentialError>;

    /// Whether `secret` matches the account's stored credential.
    fn verify(&self, account: &UserAccount, secret: &str) -> bool;
}
