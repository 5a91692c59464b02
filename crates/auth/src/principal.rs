use serde::Serialize;

use erpguard_core::{CompanyId, UserId};

use crate::UserAccount;

/// The authenticated actor of an operation.
///
/// A snapshot of the account fields the engine decides on. It is rebuilt from
/// the store on every request so role and company changes take effect without
/// re-login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub company_id: Option<CompanyId>,
    pub is_superuser: bool,
}

impl Principal {
    pub fn from_account(account: &UserAccount) -> Self {
        Self {
            user_id: account.id,
            username: account.username.clone(),
            company_id: account.company,
            is_superuser: account.is_superuser,
        }
    }
}

impl From<&UserAccount> for Principal {
    fn from(account: &UserAccount) -> Self {
        Self::from_account(account)
    }
}
