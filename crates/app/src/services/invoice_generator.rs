//! Invoice generator — turns lifecycle events into pending invoices.
//!
//! Three shapes are produced: a subscription invoice when a period starts,
//! a terminal subscription-end invoice when a period closes, and an
//! installation invoice when a customer connection completes. End invoices
//! are deduplicated per `(tenant, period_end)`: a pre-insert lookup catches
//! replays cheaply, and the storage unique index catches the race two
//! concurrent triggers can still hit.

use billhub_domain::audit::{AuditEntry, AuditStatus, AutomationKind};
use billhub_domain::customer::Customer;
use billhub_domain::error::{BillHubError, NotFoundError, ValidationError};
use billhub_domain::id::{CustomerId, InvoiceId, TenantId};
use billhub_domain::invoice::{Invoice, InvoiceKind, InvoiceStatus};
use billhub_domain::notification::Channel;
use billhub_domain::package::SubscriptionPackage;
use billhub_domain::tenant::Tenant;
use billhub_domain::time::{add_days, add_months, Timestamp};

use crate::ports::{
    AuditLogRepository, Clock, CustomerRepository, InsertOutcome, InvoiceRepository, Messenger,
    NotificationRepository, PackageRepository, Renderer, TenantRepository,
};
use crate::report::InvoiceOutcome;
use crate::services::audit_log::AutomationAuditLog;
use crate::services::dispatcher::{NotificationDispatcher, Outgoing};

const DUE_DAYS: i64 = 7;

fn short_date(ts: Timestamp) -> String {
    ts.format("%b %d, %Y").to_string()
}

/// Generates invoices for subscription periods and installations.
pub struct InvoiceGenerator<TR, CR, PR, IR, RD, NR, M, AR, C> {
    tenants: TR,
    customers: CR,
    packages: PR,
    invoices: IR,
    renderer: RD,
    dispatcher: NotificationDispatcher<NR, M>,
    audit: AutomationAuditLog<AR>,
    clock: C,
}

impl<TR, CR, PR, IR, RD, NR, M, AR, C> InvoiceGenerator<TR, CR, PR, IR, RD, NR, M, AR, C>
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
    /// Create a new generator.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenants: TR,
        customers: CR,
        packages: PR,
        invoices: IR,
        renderer: RD,
        dispatcher: NotificationDispatcher<NR, M>,
        audit: AutomationAuditLog<AR>,
        clock: C,
    ) -> Self {
        Self {
            tenants,
            customers,
            packages,
            invoices,
            renderer,
            dispatcher,
            audit,
            clock,
        }
    }

    /// Issue the subscription invoice for the tenant's current period.
    ///
    /// A duplicate insert (same tenant, same period end) returns the
    /// existing invoice with `reused == true` instead of a second row.
    ///
    /// # Errors
    ///
    /// Returns [`BillHubError::NotFound`] for an unknown tenant,
    /// [`BillHubError::Validation`] when the tenant has no package, or a
    /// storage error. Failures append a `failed` audit entry first.
    #[tracing::instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn subscription_invoice(
        &self,
        tenant_id: TenantId,
        triggered_by: &str,
    ) -> Result<InvoiceOutcome, BillHubError> {
        match self.subscription_invoice_inner(tenant_id, triggered_by).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.record_failure(
                    AutomationKind::SubscriptionInvoice,
                    Some(tenant_id),
                    None,
                    triggered_by,
                    &err,
                )
                .await;
                Err(err)
            }
        }
    }

    async fn subscription_invoice_inner(
        &self,
        tenant_id: TenantId,
        triggered_by: &str,
    ) -> Result<InvoiceOutcome, BillHubError> {
        let now = self.clock.now();
        let tenant = self.get_tenant(tenant_id).await?;
        let package = self.tenant_package(&tenant).await?;

        let period_start = tenant.subscription_start.unwrap_or(now);
        let period_end = tenant
            .subscription_end
            .unwrap_or_else(|| add_months(period_start, package.duration_months));

        let invoice = Invoice {
            id: InvoiceId::new(),
            bill_number: Invoice::bill_number_for(InvoiceKind::Subscription, tenant.id, now),
            tenant_id: tenant.id,
            customer_id: None,
            kind: InvoiceKind::Subscription,
            amount: package.price,
            status: InvoiceStatus::Pending,
            period_start,
            period_end,
            due_date: add_days(now, DUE_DAYS),
            note: format!(
                "Subscription invoice for {} ({} - {})",
                package.name,
                short_date(period_start),
                short_date(period_end)
            ),
            created_at: now,
        };

        let invoice = match self.invoices.insert(invoice).await? {
            InsertOutcome::Inserted(invoice) => invoice,
            InsertOutcome::Duplicate => {
                return self
                    .reuse_existing(tenant.id, InvoiceKind::Subscription, period_end)
                    .await;
            }
        };

        self.render_artifact(&invoice, &tenant, &package).await;
        let dispatched = self
            .dispatcher
            .dispatch(
                Outgoing {
                    tenant_id: Some(tenant.id),
                    customer_id: None,
                    invoice_id: Some(invoice.id),
                    title: "New Subscription Invoice".to_string(),
                    message: format!(
                        "Invoice {} for {:.2} has been generated. Payment is due by {}.",
                        invoice.bill_number,
                        invoice.amount,
                        short_date(invoice.due_date)
                    ),
                    channel: Channel::Both,
                    email_to: Some(tenant.email.clone()),
                    sms_to: None,
                },
                now,
            )
            .await;

        let written = self
            .record_generated(
                AutomationKind::SubscriptionInvoice,
                &tenant,
                None,
                &invoice,
                dispatched.succeeded(),
                triggered_by,
                now,
            )
            .await;

        Ok(InvoiceOutcome {
            invoice,
            reused: false,
            degraded: !written,
        })
    }

    /// Issue the terminal invoice that closes the tenant's current period.
    ///
    /// Idempotent per `(tenant, period_end)`: a repeat call finds the prior
    /// invoice and returns it with `reused == true` and no new side
    /// effects.
    ///
    /// # Errors
    ///
    /// Returns [`BillHubError::NotFound`] for an unknown tenant,
    /// [`BillHubError::Validation`] when the tenant has no package or no
    /// subscription end date, or a storage error. Failures append a
    /// `failed` audit entry first.
    #[tracing::instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn subscription_end_invoice(
        &self,
        tenant_id: TenantId,
        triggered_by: &str,
    ) -> Result<InvoiceOutcome, BillHubError> {
        match self
            .subscription_end_invoice_inner(tenant_id, triggered_by)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.record_failure(
                    AutomationKind::SubscriptionEndInvoice,
                    Some(tenant_id),
                    None,
                    triggered_by,
                    &err,
                )
                .await;
                Err(err)
            }
        }
    }

    async fn subscription_end_invoice_inner(
        &self,
        tenant_id: TenantId,
        triggered_by: &str,
    ) -> Result<InvoiceOutcome, BillHubError> {
        let now = self.clock.now();
        let tenant = self.get_tenant(tenant_id).await?;
        let period_end = tenant
            .subscription_end
            .ok_or(ValidationError::MissingId("subscription_end"))?;

        if let Some(existing) = self
            .invoices
            .find_tenant_invoice(tenant.id, InvoiceKind::SubscriptionEnd, period_end)
            .await?
        {
            tracing::debug!(bill_number = %existing.bill_number, "end invoice already exists for period");
            return Ok(InvoiceOutcome {
                invoice: existing,
                reused: true,
                degraded: false,
            });
        }

        let package = self.tenant_package(&tenant).await?;
        let period_start = tenant.subscription_start.unwrap_or(period_end);

        let invoice = Invoice {
            id: InvoiceId::new(),
            bill_number: Invoice::bill_number_for(InvoiceKind::SubscriptionEnd, tenant.id, now),
            tenant_id: tenant.id,
            customer_id: None,
            kind: InvoiceKind::SubscriptionEnd,
            amount: package.price,
            status: InvoiceStatus::Pending,
            period_start,
            period_end,
            due_date: add_days(now, DUE_DAYS),
            note: format!(
                "Final invoice for subscription period ending {}",
                short_date(period_end)
            ),
            created_at: now,
        };

        let invoice = match self.invoices.insert(invoice).await? {
            InsertOutcome::Inserted(invoice) => invoice,
            // Lost the race against a concurrent trigger; the winner's row
            // is the invoice for this period.
            InsertOutcome::Duplicate => {
                return self
                    .reuse_existing(tenant.id, InvoiceKind::SubscriptionEnd, period_end)
                    .await;
            }
        };

        self.render_artifact(&invoice, &tenant, &package).await;
        let dispatched = self
            .dispatcher
            .dispatch(
                Outgoing {
                    tenant_id: Some(tenant.id),
                    customer_id: None,
                    invoice_id: Some(invoice.id),
                    title: "Subscription End Invoice".to_string(),
                    message: format!(
                        "Final invoice {} for the period ending {} has been generated.",
                        invoice.bill_number,
                        short_date(period_end)
                    ),
                    channel: Channel::Both,
                    email_to: Some(tenant.email.clone()),
                    sms_to: None,
                },
                now,
            )
            .await;

        let written = self
            .record_generated(
                AutomationKind::SubscriptionEndInvoice,
                &tenant,
                None,
                &invoice,
                dispatched.succeeded(),
                triggered_by,
                now,
            )
            .await;

        Ok(InvoiceOutcome {
            invoice,
            reused: false,
            degraded: !written,
        })
    }

    /// Issue an installation invoice for a customer whose connection was
    /// completed.
    ///
    /// # Errors
    ///
    /// Returns [`BillHubError::NotFound`] for an unknown customer or
    /// tenant, [`BillHubError::Validation`] when the customer has no
    /// package, or a storage error. Failures append a `failed` audit entry
    /// first.
    #[tracing::instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn installation_invoice(
        &self,
        customer_id: CustomerId,
        triggered_by: &str,
    ) -> Result<InvoiceOutcome, BillHubError> {
        match self
            .installation_invoice_inner(customer_id, triggered_by)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.record_failure(
                    AutomationKind::InstallationInvoice,
                    None,
                    Some(customer_id),
                    triggered_by,
                    &err,
                )
                .await;
                Err(err)
            }
        }
    }

    async fn installation_invoice_inner(
        &self,
        customer_id: CustomerId,
        triggered_by: &str,
    ) -> Result<InvoiceOutcome, BillHubError> {
        let now = self.clock.now();
        let customer = self.get_customer(customer_id).await?;
        let tenant = self.get_tenant(customer.tenant_id).await?;
        let package = self.customer_package(&customer).await?;

        let invoice = Invoice {
            id: InvoiceId::new(),
            bill_number: Invoice::bill_number_for(InvoiceKind::Installation, tenant.id, now),
            tenant_id: tenant.id,
            customer_id: Some(customer.id),
            kind: InvoiceKind::Installation,
            amount: package.price,
            status: InvoiceStatus::Pending,
            period_start: now,
            period_end: now,
            due_date: add_days(now, DUE_DAYS),
            note: format!("Installation invoice for {}", customer.name),
            created_at: now,
        };

        let invoice = match self.invoices.insert(invoice).await? {
            InsertOutcome::Inserted(invoice) => invoice,
            // The unique index covers tenant-level invoices only; storage
            // reporting a duplicate here is a constraint misconfiguration.
            InsertOutcome::Duplicate => {
                return Err(BillHubError::Storage(
                    "unexpected duplicate for installation invoice".into(),
                ));
            }
        };

        self.render_artifact(&invoice, &tenant, &package).await;
        let dispatched = self
            .dispatcher
            .dispatch(
                Outgoing {
                    tenant_id: Some(tenant.id),
                    customer_id: Some(customer.id),
                    invoice_id: Some(invoice.id),
                    title: "Installation Invoice".to_string(),
                    message: format!(
                        "Invoice {} for your installation has been generated. Payment is due by {}.",
                        invoice.bill_number,
                        short_date(invoice.due_date)
                    ),
                    channel: Channel::Both,
                    email_to: Some(customer.email.clone()),
                    sms_to: customer.phone.clone(),
                },
                now,
            )
            .await;

        let written = self
            .record_generated(
                AutomationKind::InstallationInvoice,
                &tenant,
                Some(customer.id),
                &invoice,
                dispatched.succeeded(),
                triggered_by,
                now,
            )
            .await;

        Ok(InvoiceOutcome {
            invoice,
            reused: false,
            degraded: !written,
        })
    }

    async fn reuse_existing(
        &self,
        tenant_id: TenantId,
        kind: InvoiceKind,
        period_end: Timestamp,
    ) -> Result<InvoiceOutcome, BillHubError> {
        let existing = self
            .invoices
            .find_tenant_invoice(tenant_id, kind, period_end)
            .await?
            .ok_or_else(|| {
                BillHubError::Storage("duplicate reported but existing invoice not found".into())
            })?;
        tracing::debug!(bill_number = %existing.bill_number, "reusing invoice after duplicate insert");
        Ok(InvoiceOutcome {
            invoice: existing,
            reused: true,
            degraded: false,
        })
    }

    /// Rendering is best-effort; the invoice row is authoritative and a
    /// failed artifact never blocks notification or audit.
    async fn render_artifact(
        &self,
        invoice: &Invoice,
        tenant: &Tenant,
        package: &SubscriptionPackage,
    ) {
        if let Err(err) = self.renderer.render(invoice, tenant, package).await {
            tracing::warn!(
                bill_number = %invoice.bill_number,
                error = %err,
                "failed to render invoice artifact"
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_generated(
        &self,
        kind: AutomationKind,
        tenant: &Tenant,
        customer_id: Option<CustomerId>,
        invoice: &Invoice,
        notified: bool,
        triggered_by: &str,
        now: Timestamp,
    ) -> bool {
        let (status, message) = if notified {
            (
                AuditStatus::Success,
                format!("invoice {} generated for {}", invoice.bill_number, tenant.name),
            )
        } else {
            (
                AuditStatus::Failed,
                format!(
                    "invoice {} generated for {} but the notification could not be stored",
                    invoice.bill_number, tenant.name
                ),
            )
        };
        let mut builder = AuditEntry::builder(kind, status)
            .tenant(tenant.id)
            .invoice(invoice.id)
            .message(message)
            .triggered_by(triggered_by)
            .metadata(serde_json::json!({
                "bill_number": invoice.bill_number,
                "amount": invoice.amount,
                "period_end": invoice.period_end,
            }));
        if let Some(customer_id) = customer_id {
            builder = builder.customer(customer_id);
        }
        self.audit.record(builder.build(now)).await
    }

    async fn record_failure(
        &self,
        kind: AutomationKind,
        tenant_id: Option<TenantId>,
        customer_id: Option<CustomerId>,
        triggered_by: &str,
        err: &BillHubError,
    ) {
        let mut builder = AuditEntry::builder(kind, AuditStatus::Failed)
            .message(err.to_string())
            .triggered_by(triggered_by);
        if let Some(tenant_id) = tenant_id {
            builder = builder.tenant(tenant_id);
        }
        if let Some(customer_id) = customer_id {
            builder = builder.customer(customer_id);
        }
        self.audit.record(builder.build(self.clock.now())).await;
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

    async fn get_customer(&self, customer_id: CustomerId) -> Result<Customer, BillHubError> {
        self.customers.get_by_id(customer_id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Customer",
                id: customer_id.to_string(),
            }
            .into()
        })
    }

    async fn tenant_package(&self, tenant: &Tenant) -> Result<SubscriptionPackage, BillHubError> {
        let package_id = tenant.package_id.ok_or(ValidationError::NoPackage)?;
        self.packages
            .get_by_id(package_id)
            .await?
            .ok_or_else(|| {
                NotFoundError {
                    entity: "SubscriptionPackage",
                    id: package_id.to_string(),
                }
                .into()
            })
    }

    async fn customer_package(
        &self,
        customer: &Customer,
    ) -> Result<SubscriptionPackage, BillHubError> {
        let package_id = customer.package_id.ok_or(ValidationError::NoPackage)?;
        self.packages
            .get_by_id(package_id)
            .await?
            .ok_or_else(|| {
                NotFoundError {
                    entity: "SubscriptionPackage",
                    id: package_id.to_string(),
                }
                .into()
            })
    }
}
