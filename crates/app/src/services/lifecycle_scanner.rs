//! Lifecycle scanner — batch sweeps over the tenant population.
//!
//! Two sweeps exist: a reminder pass over subscriptions expiring within a
//! window, and a suspension pass over subscriptions already past their end.
//! Both isolate tenants from each other: one tenant's failure becomes a
//! `failed` line in the report while its siblings proceed. A failed batch
//! *query* still fails the whole scan, since there is nothing to iterate.

use billhub_domain::audit::{AuditEntry, AuditStatus, AutomationKind};
use billhub_domain::error::BillHubError;
use billhub_domain::id::TenantId;
use billhub_domain::notification::Channel;
use billhub_domain::tenant::Tenant;
use billhub_domain::time::{add_days, end_of_day, Timestamp};

use crate::ports::{
    AuditLogRepository, Clock, CustomerRepository, InvoiceRepository, Messenger,
    NotificationRepository, PackageRepository, Renderer, TenantRepository,
};
use crate::report::{Disposition, EndSubscriptionOutcome, ScanReport};
use crate::services::audit_log::AutomationAuditLog;
use crate::services::dispatcher::{NotificationDispatcher, Outgoing};
use crate::services::invoice_generator::InvoiceGenerator;
use crate::services::transition_engine::TransitionEngine;

fn short_date(ts: Timestamp) -> String {
    ts.format("%b %d, %Y").to_string()
}

/// Sweeps the tenant population for expiring and expired subscriptions.
pub struct LifecycleScanner<TR, CR, PR, IR, RD, NR, M, AR, C> {
    tenants: TR,
    engine: TransitionEngine<TR, PR, NR, M, AR, C>,
    generator: InvoiceGenerator<TR, CR, PR, IR, RD, NR, M, AR, C>,
    dispatcher: NotificationDispatcher<NR, M>,
    audit: AutomationAuditLog<AR>,
    clock: C,
}

impl<TR, CR, PR, IR, RD, NR, M, AR, C> LifecycleScanner<TR, CR, PR, IR, RD, NR, M, AR, C>
where
    TR: TenantRepository,
    CR: CustomerRepository,
    PR: PackageRepository,
    IR: InvoiceRepository,
    RD: Renderer,
    NR: NotificationRepository,
    M: Messenger,
    AR: AuditLogRepository,
    C: Clock,
{
    /// Create a new scanner.
    pub fn new(
        tenants: TR,
        engine: TransitionEngine<TR, PR, NR, M, AR, C>,
        generator: InvoiceGenerator<TR, CR, PR, IR, RD, NR, M, AR, C>,
        dispatcher: NotificationDispatcher<NR, M>,
        audit: AutomationAuditLog<AR>,
        clock: C,
    ) -> Self {
        Self {
            tenants,
            engine,
            generator,
            dispatcher,
            audit,
            clock,
        }
    }

    /// Remind every active tenant whose subscription ends between now and
    /// the end of the day `window_days` from now. At most one reminder per
    /// tenant per calendar day, enforced through the audit log.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the batch query itself fails.
    /// Per-tenant failures do not propagate; they appear as `failed` lines
    /// in the report.
    #[tracing::instrument(skip(self))]
    pub async fn scan_expiring(
        &self,
        window_days: i64,
        triggered_by: &str,
    ) -> Result<ScanReport, BillHubError> {
        let now = self.clock.now();
        // The window covers the whole last day, not just up to the scan hour.
        let until = end_of_day(add_days(now, window_days));
        let candidates = self.tenants.find_expiring(now, until).await?;

        let mut report = ScanReport {
            total: candidates.len() as u64,
            ..ScanReport::default()
        };
        for tenant in &candidates {
            let (disposition, degraded) = self.remind_one(tenant, now, triggered_by).await;
            report.degraded |= degraded;
            report.record(tenant, disposition);
        }
        tracing::info!(
            total = report.total,
            succeeded = report.succeeded,
            skipped = report.skipped,
            failed = report.failed,
            "expiry reminder scan finished"
        );
        Ok(report)
    }

    async fn remind_one(
        &self,
        tenant: &Tenant,
        now: Timestamp,
        triggered_by: &str,
    ) -> (Disposition, bool) {
        match self.try_remind(tenant, now, triggered_by).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(tenant_id = %tenant.id, error = %err, "expiry reminder failed");
                let written = self
                    .audit
                    .record(
                        AuditEntry::builder(AutomationKind::ExpiryReminder, AuditStatus::Failed)
                            .tenant(tenant.id)
                            .message(err.to_string())
                            .triggered_by(triggered_by)
                            .build(now),
                    )
                    .await;
                (
                    Disposition::Failed {
                        reason: err.to_string(),
                    },
                    !written,
                )
            }
        }
    }

    async fn try_remind(
        &self,
        tenant: &Tenant,
        now: Timestamp,
        triggered_by: &str,
    ) -> Result<(Disposition, bool), BillHubError> {
        if self
            .audit
            .already_succeeded_today(AutomationKind::ExpiryReminder, tenant.id, now)
            .await?
        {
            tracing::debug!(tenant_id = %tenant.id, "already reminded today");
            return Ok((Disposition::Skipped, false));
        }

        // Candidates come from the expiring query, so the end date is set.
        let end = tenant.subscription_end.unwrap_or(now);
        let days_left = (end - now).num_days().max(0);
        let dispatched = self
            .dispatcher
            .dispatch(
                Outgoing {
                    tenant_id: Some(tenant.id),
                    customer_id: None,
                    invoice_id: None,
                    title: "Subscription Expiring Soon".to_string(),
                    message: format!(
                        "Your subscription expires on {} ({days_left} day(s) left). Please renew to avoid service interruption.",
                        short_date(end)
                    ),
                    channel: Channel::Both,
                    email_to: Some(tenant.email.clone()),
                    sms_to: None,
                },
                now,
            )
            .await;

        if dispatched.succeeded() {
            let written = self
                .audit
                .record(
                    AuditEntry::builder(AutomationKind::ExpiryReminder, AuditStatus::Success)
                        .tenant(tenant.id)
                        .message(format!(
                            "expiry reminder sent to {} ({days_left} day(s) left)",
                            tenant.name
                        ))
                        .triggered_by(triggered_by)
                        .metadata(serde_json::json!({
                            "subscription_end": end,
                            "days_left": days_left,
                        }))
                        .build(now),
                )
                .await;
            Ok((Disposition::Processed, !written))
        } else {
            let written = self
                .audit
                .record(
                    AuditEntry::builder(AutomationKind::ExpiryReminder, AuditStatus::Failed)
                        .tenant(tenant.id)
                        .message(format!(
                            "expiry reminder for {} could not be stored",
                            tenant.name
                        ))
                        .triggered_by(triggered_by)
                        .build(now),
                )
                .await;
            Ok((
                Disposition::Failed {
                    reason: "reminder notification could not be stored".to_string(),
                },
                !written,
            ))
        }
    }

    /// Suspend every active tenant whose subscription end is already in the
    /// past.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the batch query itself fails.
    /// Per-tenant failures do not propagate; they appear as `failed` lines
    /// in the report.
    #[tracing::instrument(skip(self))]
    pub async fn scan_expired(&self, triggered_by: &str) -> Result<ScanReport, BillHubError> {
        let now = self.clock.now();
        let candidates = self.tenants.find_expired(now).await?;

        let mut report = ScanReport {
            total: candidates.len() as u64,
            ..ScanReport::default()
        };
        for tenant in &candidates {
            let disposition = match self.engine.deactivate(tenant.id, triggered_by).await {
                Ok(outcome) => {
                    report.degraded |= outcome.degraded;
                    if outcome.changed {
                        Disposition::Processed
                    } else {
                        // A concurrent trigger got there first.
                        Disposition::Skipped
                    }
                }
                Err(err) => {
                    tracing::warn!(tenant_id = %tenant.id, error = %err, "suspension failed");
                    Disposition::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            report.record(tenant, disposition);
        }
        tracing::info!(
            total = report.total,
            succeeded = report.succeeded,
            skipped = report.skipped,
            failed = report.failed,
            "expired subscription scan finished"
        );
        Ok(report)
    }

    /// Close out a single tenant's subscription: suspend the account and
    /// issue the terminal invoice for the closing period.
    ///
    /// Safe to replay: the suspension is a no-op on a lapsed tenant and the
    /// end invoice is reused per period.
    ///
    /// # Errors
    ///
    /// Returns [`BillHubError::NotFound`] for an unknown tenant, or any
    /// error from the two composed steps. Each step appends its own audit
    /// entry on failure.
    #[tracing::instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn end_subscription(
        &self,
        tenant_id: TenantId,
        triggered_by: &str,
    ) -> Result<EndSubscriptionOutcome, BillHubError> {
        let transition = self.engine.deactivate(tenant_id, triggered_by).await?;
        let invoice = self
            .generator
            .subscription_end_invoice(tenant_id, triggered_by)
            .await?;
        Ok(EndSubscriptionOutcome { transition, invoice })
    }
}
