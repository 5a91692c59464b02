use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use erpguard_core::{CompanyId, Entity, EntityScope};

/// A tenant. Every tenant-scoped record points at exactly one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: impl Into<String>, description: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: CompanyId::new(),
            name: name.into(),
            description: description.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Company {
    type Id = CompanyId;

    const SCOPE: EntityScope = EntityScope::Tenant;
    const RESOURCE: &'static str = "Company";

    fn id(&self) -> &Self::Id {
        &self.id
    }

    /// A company is owned by itself: members only ever see their own company.
    fn company(&self) -> Option<CompanyId> {
        Some(self.id)
    }
}
