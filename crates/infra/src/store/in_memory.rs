use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use erpguard_auth::{
    AuditEntry, AuditSink, CollectionScope, Company, PermissionDefinition, Role, RoleDirectory,
    UserAccount, UserRole,
};
use erpguard_core::{CompanyId, Entity, RoleId, UserId};

use super::{EntityStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    companies: HashMap<CompanyId, Company>,
    users: HashMap<UserId, UserAccount>,
    roles: HashMap<RoleId, Role>,
    /// Insertion order is the catalog order.
    permissions: Vec<PermissionDefinition>,
    user_roles: HashMap<(UserId, RoleId), UserRole>,
    audit: Vec<AuditEntry>,
}

/// In-memory entity store for tests/dev.
///
/// A single `RwLock` guards all tables, so each write (including the
/// check-then-insert of unique pairs) is atomic with respect to other writes.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    inner: RwLock<Tables>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Option<T> {
        self.inner.read().ok().map(|t| f(&t))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut tables = self
            .inner
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        f(&mut tables)
    }
}

fn scoped<E: Entity + Clone>(items: impl Iterator<Item = E>, scope: CollectionScope) -> Vec<E> {
    items.filter(|item| scope.admits(item.company())).collect()
}

impl RoleDirectory for InMemoryEntityStore {
    fn roles_for_user(&self, user_id: UserId) -> Vec<Role> {
        self.read(|t| {
            let mut roles: Vec<Role> = t
                .user_roles
                .values()
                .filter(|row| row.user_id == user_id)
                .filter_map(|row| t.roles.get(&row.role_id).cloned())
                .collect();
            roles.sort_by(|a, b| a.name.cmp(&b.name));
            roles
        })
        .unwrap_or_default()
    }

    fn permission_catalog(&self) -> Vec<PermissionDefinition> {
        self.read(|t| t.permissions.clone()).unwrap_or_default()
    }
}

impl AuditSink for InMemoryEntityStore {
    fn append(&self, entry: AuditEntry) {
        if let Ok(mut t) = self.inner.write() {
            t.audit.push(entry);
        }
    }
}

impl EntityStore for InMemoryEntityStore {
    fn list_companies(&self, scope: CollectionScope) -> Vec<Company> {
        self.read(|t| {
            let mut out = scoped(t.companies.values().cloned(), scope);
            out.sort_by(|a, b| a.name.cmp(&b.name));
            out
        })
        .unwrap_or_default()
    }

    fn get_company(&self, id: CompanyId) -> Option<Company> {
        self.read(|t| t.companies.get(&id).cloned()).flatten()
    }

    fn insert_company(&self, company: Company) -> Result<(), StoreError> {
        self.write(|t| {
            if t.companies.contains_key(&company.id) {
                return Err(StoreError::AlreadyExists(format!("company {}", company.id)));
            }
            t.companies.insert(company.id, company);
            Ok(())
        })
    }

    fn update_company(&self, company: Company) -> Result<(), StoreError> {
        self.write(|t| match t.companies.get_mut(&company.id) {
            Some(slot) => {
                *slot = company;
                Ok(())
            }
            None => Err(StoreError::NotFound("company")),
        })
    }

    fn delete_company(&self, id: CompanyId) -> Result<Company, StoreError> {
        self.write(|t| {
            let company = t.companies.remove(&id).ok_or(StoreError::NotFound("company"))?;
            let members: Vec<UserId> = t
                .users
                .values()
                .filter(|u| u.company == Some(id))
                .map(|u| u.id)
                .collect();
            for user_id in &members {
                t.users.remove(user_id);
            }
            t.user_roles.retain(|(user_id, _), _| !members.contains(user_id));
            Ok(company)
        })
    }

    fn list_users(&self, scope: CollectionScope) -> Vec<UserAccount> {
        self.read(|t| {
            let mut out = scoped(t.users.values().cloned(), scope);
            out.sort_by(|a, b| a.username.cmp(&b.username));
            out
        })
        .unwrap_or_default()
    }

    fn get_user(&self, id: UserId) -> Option<UserAccount> {
        self.read(|t| t.users.get(&id).cloned()).flatten()
    }

    fn find_user_by_email(&self, email: &str) -> Option<UserAccount> {
        let needle = email.trim().to_lowercase();
        self.read(|t| t.users.values().find(|u| u.email == needle).cloned())
            .flatten()
    }

    fn insert_user(&self, user: UserAccount) -> Result<(), StoreError> {
        self.write(|t| {
            if t.users.values().any(|u| u.email == user.email) {
                return Err(StoreError::AlreadyExists(format!("email {}", user.email)));
            }
            if t.users.values().any(|u| u.username == user.username) {
                return Err(StoreError::AlreadyExists(format!("username {}", user.username)));
            }
            t.users.insert(user.id, user);
            Ok(())
        })
    }

    fn update_user(&self, user: UserAccount) -> Result<(), StoreError> {
        self.write(|t| {
            if !t.users.contains_key(&user.id) {
                return Err(StoreError::NotFound("user"));
            }
            let clash = t.users.values().any(|u| {
                u.id != user.id && (u.email == user.email || u.username == user.username)
            });
            if clash {
                return Err(StoreError::AlreadyExists(format!("user {}", user.username)));
            }
            t.users.insert(user.id, user);
            Ok(())
        })
    }

    fn apply_login_counters(
        &self,
        id: UserId,
        failed_login_attempts: u32,
        locked_until: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.write(|t| {
            let user = t.users.get_mut(&id).ok_or(StoreError::NotFound("user"))?;
            user.failed_login_attempts = failed_login_attempts;
            user.locked_until = locked_until;
            user.updated_at = at;
            Ok(())
        })
    }

    fn delete_user(&self, id: UserId) -> Result<UserAccount, StoreError> {
        self.write(|t| {
            let user = t.users.remove(&id).ok_or(StoreError::NotFound("user"))?;
            t.user_roles.retain(|(user_id, _), _| *user_id != id);
            Ok(user)
        })
    }

    fn list_roles(&self) -> Vec<Role> {
        self.read(|t| {
            let mut out: Vec<Role> = t.roles.values().cloned().collect();
            out.sort_by(|a, b| a.name.cmp(&b.name));
            out
        })
        .unwrap_or_default()
    }

    fn get_role(&self, id: RoleId) -> Option<Role> {
        self.read(|t| t.roles.get(&id).cloned()).flatten()
    }

    fn insert_role(&self, role: Role) -> Result<(), StoreError> {
        self.write(|t| {
            if t.roles.values().any(|r| r.name == role.name) {
                return Err(StoreError::AlreadyExists(format!("role {}", role.name)));
            }
            t.roles.insert(role.id, role);
            Ok(())
        })
    }

    fn update_role(&self, role: Role) -> Result<(), StoreError> {
        self.write(|t| {
            if !t.roles.contains_key(&role.id) {
                return Err(StoreError::NotFound("role"));
            }
            if t.roles.values().any(|r| r.id != role.id && r.name == role.name) {
                return Err(StoreError::AlreadyExists(format!("role {}", role.name)));
            }
            t.roles.insert(role.id, role);
            Ok(())
        })
    }

    fn delete_role(&self, id: RoleId) -> Result<(Role, Vec<UserId>), StoreError> {
        self.write(|t| {
            let role = t.roles.remove(&id).ok_or(StoreError::NotFound("role"))?;
            let mut holders = Vec::new();
            t.user_roles.retain(|(user_id, role_id), _| {
                if *role_id == id {
                    holders.push(*user_id);
                    false
                } else {
                    true
                }
            });
            Ok((role, holders))
        })
    }

    fn insert_permission(&self, permission: PermissionDefinition) -> Result<(), StoreError> {
        self.write(|t| {
            if t.permissions.iter().any(|p| p.name == permission.name) {
                return Err(StoreError::AlreadyExists(format!("permission {}", permission.name)));
            }
            t.permissions.push(permission);
            Ok(())
        })
    }

    fn holders_of(&self, role_id: RoleId) -> Vec<UserId> {
        self.read(|t| {
            t.user_roles
                .keys()
                .filter(|(_, r)| *r == role_id)
                .map(|(u, _)| *u)
                .collect()
        })
        .unwrap_or_default()
    }

    fn insert_user_role(&self, row: UserRole) -> Result<(), StoreError> {
        self.write(|t| {
            let key = (row.user_id, row.role_id);
            if t.user_roles.contains_key(&key) {
                return Err(StoreError::AlreadyExists("user role".to_string()));
            }
            t.user_roles.insert(key, row);
            Ok(())
        })
    }

    fn delete_user_role(&self, user_id: UserId, role_id: RoleId) -> Option<UserRole> {
        self.inner
            .write()
            .ok()
            .and_then(|mut t| t.user_roles.remove(&(user_id, role_id)))
    }

    fn list_audit(&self, scope: CollectionScope) -> Vec<AuditEntry> {
        self.read(|t| scoped(t.audit.iter().cloned(), scope))
            .unwrap_or_default()
    }
}
