//! Transition engine — the subscription state machine.
//!
//! The persisted state is `Tenant::status`. Transitions:
//!
//! | current            | trigger              | next    |
//! |--------------------|----------------------|---------|
//! | active             | deactivate           | expired |
//! | expired/suspended  | reactivate           | active (end extended) |
//! | active             | reactivate           | active (no-op, reported) |
//!
//! This service is the only writer of `status` and `subscription_end`.
//! Each transition notifies the tenant admin and, for suspensions, the
//! platform operator, then appends an audit entry as its final step.

use billhub_domain::audit::{AuditEntry, AuditStatus, AutomationKind};
use billhub_domain::error::{BillHubError, NotFoundError};
use billhub_domain::id::TenantId;
use billhub_domain::notification::Channel;
use billhub_domain::tenant::{SubscriptionStatus, Tenant};
use billhub_domain::time::{add_months, Timestamp};

use crate::ports::{Clock, Messenger, NotificationRepository, PackageRepository, TenantRepository};
use crate::report::TransitionOutcome;
use crate::services::audit_log::AutomationAuditLog;
use crate::services::dispatcher::{NotificationDispatcher, Outgoing};

fn short_date(ts: Timestamp) -> String {
    ts.format("%b %d, %Y").to_string()
}

/// Drives a single tenant's subscription status between `active` and
/// `expired`/`suspended`.
pub struct TransitionEngine<TR, PR, NR, M, AR, C> {
    tenants: TR,
    packages: PR,
    dispatcher: NotificationDispatcher<NR, M>,
    audit: AutomationAuditLog<AR>,
    clock: C,
}

impl<TR, PR, NR, M, AR, C> TransitionEngine<TR, PR, NR, M, AR, C>
where
    TR: TenantRepository,
    PR: PackageRepository,
    NR: NotificationRepository,
    M: Messenger,
    AR: crate::ports::AuditLogRepository,
    C: Clock,
{
    /// Create a new engine.
    pub fn new(
        tenants: TR,
        packages: PR,
        dispatcher: NotificationDispatcher<NR, M>,
        audit: AutomationAuditLog<AR>,
        clock: C,
    ) -> Self {
        Self {
            tenants,
            packages,
            dispatcher,
            audit,
            clock,
        }
    }

    /// Move an active tenant to `expired`, notify, and log.
    ///
    /// Re-invoking on an already-lapsed tenant is a no-op reported through
    /// `TransitionOutcome::changed == false`, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`BillHubError::NotFound`] for an unknown tenant, or a
    /// storage error from the tenant update. Failures append a `failed`
    /// audit entry before propagating.
    #[tracing::instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn deactivate(
        &self,
        tenant_id: TenantId,
        triggered_by: &str,
    ) -> Result<TransitionOutcome, BillHubError> {
        match self.deactivate_inner(tenant_id, triggered_by).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.record_failure(AutomationKind::Suspend, tenant_id, triggered_by, &err)
                    .await;
                Err(err)
            }
        }
    }

    async fn deactivate_inner(
        &self,
        tenant_id: TenantId,
        triggered_by: &str,
    ) -> Result<TransitionOutcome, BillHubError> {
        let now = self.clock.now();
        let mut tenant = self.get_tenant(tenant_id).await?;

        if tenant.status != SubscriptionStatus::Active {
            tracing::debug!(status = tenant.status.as_str(), "tenant already lapsed, no action");
            return Ok(TransitionOutcome {
                tenant,
                changed: false,
                degraded: false,
            });
        }

        tenant.status = SubscriptionStatus::Expired;
        let tenant = self.tenants.update(tenant).await?;

        let end_text = tenant.subscription_end.map_or_else(|| "n/a".to_string(), short_date);
        let admin_outcome = self
            .dispatcher
            .dispatch(
                Outgoing {
                    tenant_id: Some(tenant.id),
                    customer_id: None,
                    invoice_id: None,
                    title: "Subscription Expired - Account Suspended".to_string(),
                    message: format!(
                        "Your subscription expired on {end_text}. Your account has been suspended. Please renew to reactivate."
                    ),
                    channel: Channel::Both,
                    email_to: Some(tenant.email.clone()),
                    sms_to: None,
                },
                now,
            )
            .await;

        // Platform operator gets an in-app notice; it rides the same
        // best-effort rules and never fails the transition.
        self.dispatcher
            .dispatch(
                Outgoing::in_app(
                    None,
                    format!("Tenant Suspended: {}", tenant.name),
                    format!(
                        "Tenant {} subscription expired on {end_text} and has been suspended.",
                        tenant.name
                    ),
                ),
                now,
            )
            .await;

        let (status, message) = if admin_outcome.succeeded() {
            (
                AuditStatus::Success,
                format!("tenant {} suspended after subscription expiry", tenant.name),
            )
        } else {
            (
                AuditStatus::Failed,
                format!(
                    "tenant {} suspended but the admin notification could not be stored",
                    tenant.name
                ),
            )
        };
        let written = self
            .audit
            .record(
                AuditEntry::builder(AutomationKind::Suspend, status)
                    .tenant(tenant.id)
                    .message(message)
                    .triggered_by(triggered_by)
                    .metadata(serde_json::json!({
                        "subscription_end": tenant.subscription_end,
                    }))
                    .build(now),
            )
            .await;

        Ok(TransitionOutcome {
            tenant,
            changed: true,
            degraded: !written,
        })
    }

    /// Return a lapsed tenant to `active`, extending the subscription end
    /// by the package duration in calendar months.
    ///
    /// Calling this on an already-active tenant returns
    /// `TransitionOutcome::changed == false` — "no action taken", not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`BillHubError::NotFound`] for an unknown tenant, or a
    /// storage error from the tenant update. Failures append a `failed`
    /// audit entry before propagating.
    #[tracing::instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn reactivate(
        &self,
        tenant_id: TenantId,
        triggered_by: &str,
    ) -> Result<TransitionOutcome, BillHubError> {
        match self.reactivate_inner(tenant_id, triggered_by).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.record_failure(AutomationKind::Reactivate, tenant_id, triggered_by, &err)
                    .await;
                Err(err)
            }
        }
    }

    async fn reactivate_inner(
        &self,
        tenant_id: TenantId,
        triggered_by: &str,
    ) -> Result<TransitionOutcome, BillHubError> {
        let now = self.clock.now();
        let mut tenant = self.get_tenant(tenant_id).await?;

        if !tenant.status.is_lapsed() {
            tracing::debug!(status = tenant.status.as_str(), "tenant not lapsed, no action");
            return Ok(TransitionOutcome {
                tenant,
                changed: false,
                degraded: false,
            });
        }

        let duration = self.package_duration(&tenant).await?;
        let new_end = match tenant.subscription_end {
            // Extension is calendar-month arithmetic from the old end when
            // it is still ahead, otherwise from now.
            Some(end) if end >= now => add_months(end, duration),
            _ => add_months(now, duration),
        };

        tenant.status = SubscriptionStatus::Active;
        tenant.subscription_start = tenant.subscription_start.or(Some(now));
        tenant.subscription_end = Some(new_end);
        let tenant = self.tenants.update(tenant).await?;

        let admin_outcome = self
            .dispatcher
            .dispatch(
                Outgoing {
                    tenant_id: Some(tenant.id),
                    customer_id: None,
                    invoice_id: None,
                    title: "Account Reactivated".to_string(),
                    message: format!(
                        "Your account has been reactivated. Subscription valid until {}.",
                        short_date(new_end)
                    ),
                    channel: Channel::Both,
                    email_to: Some(tenant.email.clone()),
                    sms_to: None,
                },
                now,
            )
            .await;

        let (status, message) = if admin_outcome.succeeded() {
            (
                AuditStatus::Success,
                format!("tenant {} reactivated after renewal", tenant.name),
            )
        } else {
            (
                AuditStatus::Failed,
                format!(
                    "tenant {} reactivated but the admin notification could not be stored",
                    tenant.name
                ),
            )
        };
        let written = self
            .audit
            .record(
                AuditEntry::builder(AutomationKind::Reactivate, status)
                    .tenant(tenant.id)
                    .message(message)
                    .triggered_by(triggered_by)
                    .metadata(serde_json::json!({ "new_end_date": new_end }))
                    .build(now),
            )
            .await;

        Ok(TransitionOutcome {
            tenant,
            changed: true,
            degraded: !written,
        })
    }

    async fn get_tenant(&self, tenant_id: TenantId) -> Result<Tenant, BillHubError> {
        self.tenants.get_by_id(tenant_id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Tenant",
                id: tenant_id.to_string(),
            }
            .into()
        })
    }

    /// Renewal length in months; tenants without an assigned package fall
    /// back to one month.
    async fn package_duration(&self, tenant: &Tenant) -> Result<u32, BillHubError> {
        let Some(package_id) = tenant.package_id else {
            return Ok(1);
        };
        let duration = self
            .packages
            .get_by_id(package_id)
            .await?
            .map_or(1, |p| p.duration_months);
        Ok(duration)
    }

    async fn record_failure(
        &self,
        kind: AutomationKind,
        tenant_id: TenantId,
        triggered_by: &str,
        err: &BillHubError,
    ) {
        self.audit
            .record(
                AuditEntry::builder(kind, AuditStatus::Failed)
                    .tenant(tenant_id)
                    .message(err.to_string())
                    .triggered_by(triggered_by)
                    .build(self.clock.now()),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        FixedClock, InMemoryAuditLog, InMemoryNotifications, InMemoryPackages, InMemoryTenants,
        RecordingMessenger,
    };
    use billhub_domain::package::SubscriptionPackage;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    struct Harness {
        tenants: Arc<InMemoryTenants>,
        notifications: Arc<InMemoryNotifications>,
        audit: Arc<InMemoryAuditLog>,
        engine: TransitionEngine<
            Arc<InMemoryTenants>,
            Arc<InMemoryPackages>,
            Arc<InMemoryNotifications>,
            Arc<RecordingMessenger>,
            Arc<InMemoryAuditLog>,
            FixedClock,
        >,
    }

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    fn harness(tenants: Vec<Tenant>, packages: Vec<SubscriptionPackage>, now: Timestamp) -> Harness {
        let tenants = Arc::new(InMemoryTenants::with(tenants));
        let packages = Arc::new(InMemoryPackages::with(packages));
        let notifications = Arc::new(InMemoryNotifications::default());
        let messenger = Arc::new(RecordingMessenger::default());
        let audit = Arc::new(InMemoryAuditLog::default());
        let engine = TransitionEngine::new(
            Arc::clone(&tenants),
            Arc::clone(&packages),
            NotificationDispatcher::new(Arc::clone(&notifications), messenger),
            AutomationAuditLog::new(Arc::clone(&audit)),
            FixedClock(now),
        );
        Harness {
            tenants,
            notifications,
            audit,
            engine,
        }
    }

    fn active_tenant(end: Timestamp, package_id: Option<billhub_domain::id::PackageId>) -> Tenant {
        let mut builder = Tenant::builder()
            .name("Acme ISP")
            .email("admin@acme.test")
            .status(SubscriptionStatus::Active)
            .subscription_start(at(2024, 1, 1))
            .subscription_end(end);
        if let Some(id) = package_id {
            builder = builder.package_id(id);
        }
        builder.build().unwrap()
    }

    #[tokio::test]
    async fn should_expire_active_tenant_and_notify_admin_and_operator() {
        let now = at(2024, 6, 15);
        let tenant = active_tenant(at(2024, 6, 1), None);
        let tenant_id = tenant.id;
        let h = harness(vec![tenant], vec![], now);

        let outcome = h.engine.deactivate(tenant_id, "cron").await.unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.tenant.status, SubscriptionStatus::Expired);
        assert_eq!(
            h.tenants.get(tenant_id).unwrap().status,
            SubscriptionStatus::Expired
        );
        // Admin notice plus operator notice.
        let stored = h.notifications.all();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().any(|n| n.tenant_id == Some(tenant_id)));
        assert!(stored.iter().any(|n| n.tenant_id.is_none()));
        // One success audit row.
        let entries = h.audit.all();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, AutomationKind::Suspend);
        assert_eq!(entries[0].status, AuditStatus::Success);
        assert_eq!(entries[0].triggered_by, "cron");
    }

    #[tokio::test]
    async fn should_report_no_action_when_deactivating_lapsed_tenant() {
        let now = at(2024, 6, 15);
        let mut tenant = active_tenant(at(2024, 6, 1), None);
        tenant.status = SubscriptionStatus::Expired;
        let tenant_id = tenant.id;
        let h = harness(vec![tenant], vec![], now);

        let outcome = h.engine.deactivate(tenant_id, "cron").await.unwrap();

        assert!(!outcome.changed);
        assert!(h.audit.all().is_empty());
        assert!(h.notifications.all().is_empty());
    }

    #[tokio::test]
    async fn should_fail_with_not_found_for_unknown_tenant_and_log_failure() {
        let h = harness(vec![], vec![], at(2024, 6, 15));
        let missing = TenantId::new();

        let result = h.engine.deactivate(missing, "cron").await;

        assert!(matches!(result, Err(BillHubError::NotFound(_))));
        let entries = h.audit.all();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, AuditStatus::Failed);
        assert_eq!(entries[0].tenant_id, Some(missing));
    }

    #[tokio::test]
    async fn should_extend_from_now_when_end_date_is_past() {
        // Expired 2024-01-01, one-month package, reactivated 2024-03-15:
        // the new end is 2024-04-15.
        let now = at(2024, 3, 15);
        let package = SubscriptionPackage::new("Starter", 49.0, 1);
        let package_id = package.id;
        let mut tenant = active_tenant(at(2024, 1, 1), Some(package_id));
        tenant.status = SubscriptionStatus::Expired;
        let tenant_id = tenant.id;
        let h = harness(vec![tenant], vec![package], now);

        let outcome = h.engine.reactivate(tenant_id, "webhook").await.unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.tenant.status, SubscriptionStatus::Active);
        assert_eq!(outcome.tenant.subscription_end, Some(at(2024, 4, 15)));
        let entries = h.audit.all();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, AutomationKind::Reactivate);
        assert_eq!(entries[0].status, AuditStatus::Success);
    }

    #[tokio::test]
    async fn should_extend_from_old_end_when_end_date_is_ahead() {
        let now = at(2024, 3, 15);
        let package = SubscriptionPackage::new("Quarterly", 120.0, 3);
        let package_id = package.id;
        let mut tenant = active_tenant(at(2024, 4, 1), Some(package_id));
        tenant.status = SubscriptionStatus::Suspended;
        let tenant_id = tenant.id;
        let h = harness(vec![tenant], vec![package], now);

        let outcome = h.engine.reactivate(tenant_id, "webhook").await.unwrap();

        assert_eq!(outcome.tenant.subscription_end, Some(at(2024, 7, 1)));
    }

    #[tokio::test]
    async fn should_report_no_action_when_reactivating_active_tenant() {
        let now = at(2024, 3, 15);
        let tenant = active_tenant(at(2024, 6, 1), None);
        let tenant_id = tenant.id;
        let end_before = tenant.subscription_end;
        let h = harness(vec![tenant], vec![], now);

        let outcome = h.engine.reactivate(tenant_id, "webhook").await.unwrap();

        assert!(!outcome.changed);
        assert_eq!(outcome.tenant.status, SubscriptionStatus::Active);
        assert_eq!(outcome.tenant.subscription_end, end_before);
        assert!(h.audit.all().is_empty());
    }

    #[tokio::test]
    async fn should_set_start_date_when_previously_unset() {
        let now = at(2024, 3, 15);
        let mut tenant = Tenant::builder()
            .name("Fresh Tenant")
            .email("admin@fresh.test")
            .status(SubscriptionStatus::Expired)
            .build()
            .unwrap();
        tenant.subscription_start = None;
        let tenant_id = tenant.id;
        let h = harness(vec![tenant], vec![], now);

        let outcome = h.engine.reactivate(tenant_id, "manual").await.unwrap();

        assert_eq!(outcome.tenant.subscription_start, Some(now));
        // No package assigned: falls back to a one-month extension.
        assert_eq!(outcome.tenant.subscription_end, Some(at(2024, 4, 15)));
    }

    #[tokio::test]
    async fn should_flag_degraded_when_audit_append_fails() {
        let now = at(2024, 6, 15);
        let tenant = active_tenant(at(2024, 6, 1), None);
        let tenant_id = tenant.id;
        let h = harness(vec![tenant], vec![], now);
        h.audit.fail_appends();

        let outcome = h.engine.deactivate(tenant_id, "cron").await.unwrap();

        // The transition itself committed; only the ledger is incomplete.
        assert!(outcome.changed);
        assert!(outcome.degraded);
        assert_eq!(
            h.tenants.get(tenant_id).unwrap().status,
            SubscriptionStatus::Expired
        );
    }
}
