//! Automation audit log — append-only ledger of every automation attempt.
//!
//! Appending is the last step of every lifecycle operation. A failed append
//! is caught here and never re-thrown: losing an audit row must not mask or
//! reverse the primary operation's outcome. Callers learn about the loss
//! through the returned flag and surface it as `degraded` in aggregate
//! results.

use billhub_domain::audit::{AuditEntry, AutomationKind};
use billhub_domain::error::BillHubError;
use billhub_domain::id::TenantId;
use billhub_domain::time::{self, Timestamp};

use crate::ports::AuditLogRepository;

/// Append-only automation ledger and idempotency oracle.
pub struct AutomationAuditLog<R> {
    repo: R,
}

impl<R: AuditLogRepository> AutomationAuditLog<R> {
    /// Create a new ledger backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Append one entry. Returns `false` when the write failed; the failure
    /// is logged and swallowed.
    pub async fn record(&self, entry: AuditEntry) -> bool {
        let kind = entry.kind;
        match self.repo.append(entry).await {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(kind = kind.as_str(), error = %err, "audit append failed");
                false
            }
        }
    }

    /// Whether a success entry of `kind` already exists for `tenant_id`
    /// on the calendar day containing `now`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository. Unlike a
    /// failed append, a failed idempotency *read* must propagate — guessing
    /// "not handled yet" could duplicate side effects.
    pub async fn already_succeeded_today(
        &self,
        kind: AutomationKind,
        tenant_id: TenantId,
        now: Timestamp,
    ) -> Result<bool, BillHubError> {
        self.repo
            .exists_success_between(kind, tenant_id, time::start_of_day(now), time::end_of_day(now))
            .await
    }
}
