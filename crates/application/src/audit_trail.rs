use atelier_core::{AppError, UserIdentity};
use atelier_domain::{AuditAction, AuditEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AccessResult;

/// Who, when, why and how many: shared by every entry of one mutation.
pub(crate) struct AuditContext<'a> {
    actor: &'a UserIdentity,
    timestamp: DateTime<Utc>,
    reason: Option<String>,
    affected_users_count: u64,
}

impl<'a> AuditContext<'a> {
    pub(crate) fn new(
        actor: &'a UserIdentity,
        reason: Option<String>,
        affected_users_count: u64,
    ) -> Self {
        Self {
            actor,
            timestamp: Utc::now(),
            reason,
            affected_users_count,
        }
    }

    pub(crate) fn entry<T: Serialize>(
        &self,
        action: AuditAction,
        field_changed: &str,
        old_value: &T,
        new_value: &T,
    ) -> AccessResult<AuditEntry> {
        Ok(AuditEntry {
            changed_by_user_id: self.actor.user_id().to_owned(),
            changed_by_email: self.actor.email().map(ToOwned::to_owned),
            timestamp: self.timestamp,
            action,
            field_changed: field_changed.to_owned(),
            old_value: serialize_value(old_value)?,
            new_value: serialize_value(new_value)?,
            reason: self.reason.clone(),
            affected_users_count: self.affected_users_count,
        })
    }
}

fn serialize_value<T: Serialize>(value: &T) -> AccessResult<String> {
    serde_json::to_string(value).map_err(|error| {
        AppError::Internal(format!("failed to serialize audit value: {error}")).into()
    })
}

/// Trims a free-text reason; blank becomes `None`.
pub(crate) fn normalize_reason(reason: Option<&str>) -> Option<String> {
    reason
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .map(ToOwned::to_owned)
}
