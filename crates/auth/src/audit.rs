//! Audit recording.
//!
//! Every security-relevant decision and mutation is recorded as an immutable
//! [`AuditEntry`]. The recorder attributes the entry to the acting principal
//! and its company; persistence is delegated to an [`AuditSink`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use erpguard_core::{AuditEntryId, CompanyId, Entity, EntityScope, UserId};

use crate::Principal;

/// Value recorded when the request context does not supply a source field.
pub const UNKNOWN_SOURCE: &str = "unknown";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Login,
    Logout,
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for AuditAction {
    type Err = erpguard_core::DomainError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOGIN" => Ok(AuditAction::Login),
            "LOGOUT" => Ok(AuditAction::Logout),
            "CREATE" => Ok(AuditAction::Create),
            "UPDATE" => Ok(AuditAction::Update),
            "DELETE" => Ok(AuditAction::Delete),
            other => Err(erpguard_core::DomainError::validation(format!(
                "unknown audit action '{other}'"
            ))),
        }
    }
}

/// Where a request came from. Both fields are optional at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl SourceContext {
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }
}

/// What happened, independent of who did it and from where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub resource_type: &'static str,
    pub resource_id: String,
    pub details: String,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        resource_type: &'static str,
        resource_id: impl ToString,
        details: impl Into<String>,
    ) -> Self {
        Self {
            action,
            resource_type,
            resource_id: resource_id.to_string(),
            details: details.into(),
        }
    }
}

/// Immutable, append-only audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub actor: Option<UserId>,
    pub actor_username: Option<String>,
    pub company: Option<CompanyId>,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub details: String,
    pub ip_address: String,
    pub user_agent: String,
    pub timestamp: DateTime<Utc>,
}

impl Entity for AuditEntry {
    type Id = AuditEntryId;

    const SCOPE: EntityScope = EntityScope::Tenant;
    const RESOURCE: &'static str = "AuditLog";

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn company(&self) -> Option<CompanyId> {
        self.company
    }
}

/// Append-only destination for audit entries.
pub trait AuditSink: Send + Sync {
    fn append(&self, entry: AuditEntry);
}

impl<S> AuditSink for Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn append(&self, entry: AuditEntry) {
        (**self).append(entry)
    }
}

/// Builds audit entries and hands them to the sink.
#[derive(Debug, Clone)]
pub struct AuditRecorder<S> {
    sink: S,
}

impl<S: AuditSink> AuditRecorder<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Record `event` on behalf of `actor`.
    ///
    /// Returns `None` without writing anything when there is no actor: events
    /// that cannot be attributed to an account are not persisted.
    pub fn record(
        &self,
        actor: Option<&Principal>,
        event: AuditEvent,
        source: Option<&SourceContext>,
        now: DateTime<Utc>,
    ) -> Option<AuditEntry> {
        let Some(actor) = actor else {
            tracing::debug!(
                action = %event.action,
                resource = event.resource_type,
                "dropping audit event without an attributable actor"
            );
            return None;
        };

        let source = source.cloned().unwrap_or_default();
        let entry = AuditEntry {
            id: AuditEntryId::new(),
            actor: Some(actor.user_id),
            actor_username: Some(actor.username.clone()),
            company: actor.company_id,
            action: event.action,
            resource_type: event.resource_type.to_string(),
            resource_id: event.resource_id,
            details: event.details,
            ip_address: or_unknown(source.ip_address),
            user_agent: or_unknown(source.user_agent),
            timestamp: now,
        };

        self.sink.append(entry.clone());
        Some(entry)
    }
}

fn or_unknown(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => UNKNOWN_SOURCE.to_string(),
    }
}

#[cfg(test)]
impl AuditEntry {
    pub(crate) fn sample(action: AuditAction) -> Self {
        Self {
            id: AuditEntryId::new(),
            actor: None,
            actor_username: None,
            company: None,
            action,
            resource_type: "User".to_string(),
            resource_id: "unknown".to_string(),
            details: String::new(),
            ip_address: UNKNOWN_SOURCE.to_string(),
            user_agent: UNKNOWN_SOURCE.to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct VecSink(Mutex<Vec<AuditEntry>>);

    impl AuditSink for VecSink {
        fn append(&self, entry: AuditEntry) {
            self.0.lock().unwrap().push(entry);
        }
    }

    fn principal(company_id: Option<CompanyId>) -> Principal {
        Principal {
            user_id: UserId::new(),
            username: "carol".to_string(),
            company_id,
            is_superuser: false,
        }
    }

    fn login_event() -> AuditEvent {
        AuditEvent::new(AuditAction::Login, "User", "42", "Successful login")
    }

    #[test]
    fn anonymous_events_are_dropped() {
        let sink = Arc::new(VecSink::default());
        let recorder = AuditRecorder::new(sink.clone());

        assert!(recorder.record(None, login_event(), None, Utc::now()).is_none());
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn entry_carries_actor_company() {
        let sink = Arc::new(VecSink::default());
        let recorder = AuditRecorder::new(sink.clone());
        let company = CompanyId::new();
        let actor = principal(Some(company));

        let entry = recorder.record(Some(&actor), login_event(), None, Utc::now()).unwrap();
        assert_eq!(entry.actor, Some(actor.user_id));
        assert_eq!(entry.company, Some(company));
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn tenantless_actor_yields_null_company() {
        let recorder = AuditRecorder::new(Arc::new(VecSink::default()));
        let entry = recorder
            .record(Some(&principal(None)), login_event(), None, Utc::now())
            .unwrap();
        assert_eq!(entry.company, None);
    }

    #[test]
    fn missing_source_maps_to_unknown() {
        let recorder = AuditRecorder::new(Arc::new(VecSink::default()));
        let actor = principal(None);

        let entry = recorder.record(Some(&actor), login_event(), None, Utc::now()).unwrap();
        assert_eq!(entry.ip_address, UNKNOWN_SOURCE);
        assert_eq!(entry.user_agent, UNKNOWN_SOURCE);

        let partial = SourceContext::new(Some("10.0.0.7".to_string()), Some(String::new()));
        let entry = recorder
            .record(Some(&actor), login_event(), Some(&partial), Utc::now())
            .unwrap();
        assert_eq!(entry.ip_address, "10.0.0.7");
        assert_eq!(entry.user_agent, UNKNOWN_SOURCE);
    }

    #[test]
    fn action_parsing_is_case_insensitive() {
        assert_eq!("login".parse::<AuditAction>().unwrap(), AuditAction::Login);
        assert_eq!("Delete".parse::<AuditAction>().unwrap(), AuditAction::Delete);
        assert!("EXPORT".parse::<AuditAction>().is_err());
    }
}
