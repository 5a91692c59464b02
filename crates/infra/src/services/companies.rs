use serde::Deserialize;

use erpguard_auth::{AuditAction, AuditEvent, Company, Principal, SourceContext, labels, tenancy};
use erpguard_core::{CompanyId, Entity};
use erpguard_events::ChannelLayer;

use super::{AccessEngine, ServiceError, ServiceResult};
use crate::store::EntityStore;

/// Create/update payload. Absent fields are left unchanged on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl CompanyInput {
    fn validate_name(name: Option<&str>) -> ServiceResult<String> {
        match name.map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name.to_string()),
            _ => Err(ServiceError::validation("name must not be empty")),
        }
    }
}

impl<S, L> AccessEngine<S, L>
where
    S: EntityStore,
    L: ChannelLayer,
{
    pub fn list_companies(&self, principal: &Principal) -> ServiceResult<Vec<Company>> {
        self.require(principal, &labels::VIEW_COMPANIES)?;
        Ok(self.store.list_companies(tenancy::scope_for::<Company>(principal)))
    }

    /// Retrieval needs no label, only tenant access.
    pub fn get_company(&self, principal: &Principal, id: CompanyId) -> ServiceResult<Company> {
        self.visible(principal, self.store.get_company(id))
    }

    pub fn create_company(
        &self,
        principal: &Principal,
        input: CompanyInput,
        ctx: &SourceContext,
    ) -> ServiceResult<Company> {
        self.require(principal, &labels::CREATE_COMPANY)?;

        let name = CompanyInput::validate_name(input.name.as_deref())?;
        let mut company = Company::new(name, input.description.unwrap_or_default(), self.now());
        if let Some(active) = input.is_active {
            company.is_active = active;
        }
        self.store.insert_company(company.clone())?;

        self.record(
            principal,
            AuditEvent::new(
                AuditAction::Create,
                Company::RESOURCE,
                company.id,
                format!("Created company: {}", company.name),
            ),
            ctx,
        );
        Ok(company)
    }

    pub fn update_company(
        &self,
        principal: &Principal,
        id: CompanyId,
        input: CompanyInput,
        ctx: &SourceContext,
    ) -> ServiceResult<Company> {
        self.require(principal, &labels::UPDATE_COMPANY)?;
        let mut company = self.visible(principal, self.store.get_company(id))?;

        if input.name.is_some() {
            company.name = CompanyInput::validate_name(input.name.as_deref())?;
        }
        if let Some(description) = input.description {
            company.description = description;
        }
        if let Some(active) = input.is_active {
            company.is_active = active;
        }
        company.updated_at = self.now();
        self.store.update_company(company.clone())?;

        self.record(
            principal,
            AuditEvent::new(
                AuditAction::Update,
                Company::RESOURCE,
                company.id,
                format!("Updated company: {}", company.name),
            ),
            ctx,
        );
        Ok(company)
    }

    pub fn delete_company(&self, principal: &Principal, id: CompanyId, ctx: &SourceContext) -> ServiceResult<()> {
        self.require(principal, &labels::DELETE_COMPANY)?;
        let company = self.visible(principal, self.store.get_company(id))?;

        self.store.delete_company(company.id)?;
        self.record(
            principal,
            AuditEvent::new(
                AuditAction::Delete,
                Company::RESOURCE,
                company.id,
                format!("Deleted company: {}", company.name),
            ),
            ctx,
        );
        Ok(())
    }
}
