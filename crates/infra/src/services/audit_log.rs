use chrono::NaiveDate;
use serde::Deserialize;

use erpguard_auth::{AuditAction, AuditEntry, Principal, UserAccount, labels, tenancy};
use erpguard_events::ChannelLayer;

use super::{AccessEngine, ServiceError, ServiceResult};
use crate::store::EntityStore;

/// Optional audit-log filters. All present filters must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    /// Action verb, case-insensitive. Unknown verbs are rejected.
    pub action: Option<String>,
    /// Case-insensitive substring of the actor's username, email or names.
    pub user: Option<String>,
    /// Inclusive lower bound on the entry date.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the entry date.
    pub end_date: Option<NaiveDate>,
}

impl AuditQuery {
    /// The parsed action filter.
    pub fn action(&self) -> ServiceResult<Option<AuditAction>> {
        self.action
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| raw.parse::<AuditAction>())
            .transpose()
            .map_err(|e| ServiceError::validation(e.to_string()))
    }

    fn matches(&self, action: Option<AuditAction>, entry: &AuditEntry, actor: Option<&UserAccount>) -> bool {
        if action.is_some_and(|action| entry.action != action) {
            return false;
        }

        let day = entry.timestamp.date_naive();
        if self.start_date.is_some_and(|start| day < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| day > end) {
            return false;
        }

        if let Some(needle) = self.user.as_deref().map(str::to_lowercase) {
            let haystack: Vec<&str> = match actor {
                Some(a) => vec![
                    a.username.as_str(),
                    a.email.as_str(),
                    a.first_name.as_str(),
                    a.last_name.as_str(),
                ],
                None => entry.actor_username.as_deref().into_iter().collect(),
            };
            if !haystack.iter().any(|s| s.to_lowercase().contains(&needle)) {
                return false;
            }
        }

        true
    }
}

impl<S, L> AccessEngine<S, L>
where
    S: EntityStore,
    L: ChannelLayer,
{
    /// Tenant-scoped audit entries, newest first.
    pub fn list_audit_logs(&self, principal: &Principal, query: &AuditQuery) -> ServiceResult<Vec<AuditEntry>> {
        self.require(principal, &labels::VIEW_AUDIT_LOGS)?;
        let action = query.action()?;

        let mut entries: Vec<AuditEntry> = self
            .store
            .list_audit(tenancy::scope_for::<AuditEntry>(principal))
            .into_iter()
            .filter(|entry| {
                let actor = query
                    .user
                    .as_ref()
                    .and(entry.actor)
                    .and_then(|id| self.store.get_user(id));
                query.matches(action, entry, actor.as_ref())
            })
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use erpguard_auth::{AuditAction, AuditEvent, AuditRecorder, AuditSink};

    use super::*;

    #[derive(Default)]
    struct Capture(std::sync::Mutex<Vec<AuditEntry>>);

    impl AuditSink for Capture {
        fn append(&self, entry: AuditEntry) {
            self.0.lock().unwrap().push(entry);
        }
    }

    fn entry(action: AuditAction, day: u32) -> AuditEntry {
        let actor = Principal {
            user_id: erpguard_core::UserId::new(),
            username: "Grace".to_string(),
            company_id: None,
            is_superuser: false,
        };
        let at = Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap();
        AuditRecorder::new(Capture::default())
            .record(Some(&actor), AuditEvent::new(action, "User", "1", ""), None, at)
            .unwrap()
    }

    fn with_action(raw: &str) -> AuditQuery {
        AuditQuery {
            action: Some(raw.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn action_filter_ignores_case() {
        let q = with_action(" login");
        let action = q.action().unwrap();
        assert_eq!(action, Some(AuditAction::Login));
        assert!(q.matches(action, &entry(AuditAction::Login, 1), None));
        assert!(!q.matches(action, &entry(AuditAction::Logout, 1), None));
    }

    #[test]
    fn unknown_action_is_a_validation_error() {
        let err = with_action("PURGE").action().unwrap_err();
        assert_eq!(err, ServiceError::Validation(vec!["unknown audit action 'PURGE'".to_string()]));
    }

    #[test]
    fn blank_action_means_no_filter() {
        assert_eq!(with_action("  ").action().unwrap(), None);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let q = AuditQuery {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 2),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 4),
            ..Default::default()
        };
        assert!(!q.matches(None, &entry(AuditAction::Create, 1), None));
        assert!(q.matches(None, &entry(AuditAction::Create, 2), None));
        assert!(q.matches(None, &entry(AuditAction::Create, 4), None));
        assert!(!q.matches(None, &entry(AuditAction::Create, 5), None));
    }

    #[test]
    fn user_filter_matches_account_fields() {
        let mut grace = UserAccount::new("ghopper", "grace@navy.mil", Utc::now());
        grace.last_name = "Hopper".to_string();
        let q = AuditQuery {
            user: Some("HOPP".to_string()),
            ..Default::default()
        };

        assert!(q.matches(None, &entry(AuditAction::Update, 1), Some(&grace)));
        assert!(!q.matches(None, &entry(AuditAction::Update, 1), None));
    }
}
