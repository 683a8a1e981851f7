//! Storage ports — repository traits for persistence.
//!
//! The shared-resource discipline lives in these signatures: only
//! [`TenantRepository::update`] can change a tenant row, invoices are
//! insert-only, and [`AuditLogRepository`] exposes no update or delete at
//! all — the automation log is append-only.

use std::future::Future;
use std::sync::Arc;

use billhub_domain::audit::{AuditEntry, AuditStatus, AutomationKind};
use billhub_domain::customer::Customer;
use billhub_domain::error::BillHubError;
use billhub_domain::id::{CustomerId, PackageId, TenantId};
use billhub_domain::invoice::{Invoice, InvoiceKind};
use billhub_domain::notification::Notification;
use billhub_domain::package::SubscriptionPackage;
use billhub_domain::tenant::Tenant;
use billhub_domain::time::Timestamp;

/// Repository for tenants and their subscription timeline.
pub trait TenantRepository {
    /// Get a tenant by its unique identifier.
    fn get_by_id(
        &self,
        id: TenantId,
    ) -> impl Future<Output = Result<Option<Tenant>, BillHubError>> + Send;

    /// Active tenants whose subscription end falls within `[from, until]`.
    fn find_expiring(
        &self,
        from: Timestamp,
        until: Timestamp,
    ) -> impl Future<Output = Result<Vec<Tenant>, BillHubError>> + Send;

    /// Active tenants whose subscription end is strictly before `before`.
    fn find_expired(
        &self,
        before: Timestamp,
    ) -> impl Future<Output = Result<Vec<Tenant>, BillHubError>> + Send;

    /// Persist a changed tenant. The transition engine is the only caller.
    fn update(&self, tenant: Tenant)
    -> impl Future<Output = Result<Tenant, BillHubError>> + Send;
}

/// Read access to a tenant's end customers.
pub trait CustomerRepository {
    /// Get a customer by its unique identifier.
    fn get_by_id(
        &self,
        id: CustomerId,
    ) -> impl Future<Output = Result<Option<Customer>, BillHubError>> + Send;
}

/// Read access to subscription packages (reference data).
pub trait PackageRepository {
    /// Get a package by its unique identifier.
    fn get_by_id(
        &self,
        id: PackageId,
    ) -> impl Future<Output = Result<Option<SubscriptionPackage>, BillHubError>> + Send;
}

/// Result of an invoice insert.
///
/// The storage layer enforces a unique index on
/// `(tenant, period_end, kind)` for tenant-level invoices; a lost race
/// between two concurrent triggers surfaces as [`InsertOutcome::Duplicate`]
/// rather than a second row.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// The invoice row was written.
    Inserted(Invoice),
    /// A row for the same `(tenant, period_end, kind)` already exists.
    Duplicate,
}

/// Repository for invoices. Insert-only from this subsystem's perspective.
pub trait InvoiceRepository {
    /// Insert a new invoice.
    fn insert(
        &self,
        invoice: Invoice,
    ) -> impl Future<Output = Result<InsertOutcome, BillHubError>> + Send;

    /// Find an existing tenant-level invoice of `kind` for the period.
    fn find_tenant_invoice(
        &self,
        tenant_id: TenantId,
        kind: InvoiceKind,
        period_end: Timestamp,
    ) -> impl Future<Output = Result<Option<Invoice>, BillHubError>> + Send;
}

/// Repository for queued notifications.
pub trait NotificationRepository {
    /// Insert a new notification row.
    fn insert(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<Notification, BillHubError>> + Send;
}

/// Filter for the audit-viewing surface.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub kind: Option<AutomationKind>,
    pub status: Option<AuditStatus>,
    pub tenant_id: Option<TenantId>,
}

/// One page of audit entries plus the unfiltered-total for pagination.
#[derive(Debug, Clone)]
pub struct AuditPage {
    pub entries: Vec<AuditEntry>,
    pub total: u64,
}

/// Repository for the append-only automation log.
///
/// Deliberately exposes no update or delete: every attempt, success or
/// failure, is a new row.
pub trait AuditLogRepository {
    /// Append one entry.
    fn append(
        &self,
        entry: AuditEntry,
    ) -> impl Future<Output = Result<AuditEntry, BillHubError>> + Send;

    /// Whether a success entry of `kind` for `tenant_id` exists with
    /// `created_at` within `[from, until]`.
    fn exists_success_between(
        &self,
        kind: AutomationKind,
        tenant_id: TenantId,
        from: Timestamp,
        until: Timestamp,
    ) -> impl Future<Output = Result<bool, BillHubError>> + Send;

    /// Page through entries, newest first.
    fn find_page(
        &self,
        filter: AuditFilter,
        page: u64,
        per_page: u64,
    ) -> impl Future<Output = Result<AuditPage, BillHubError>> + Send;
}

impl<T: TenantRepository + Send + Sync> TenantRepository for Arc<T> {
    fn get_by_id(
        &self,
        id: TenantId,
    ) -> impl Future<Output = Result<Option<Tenant>, BillHubError>> + Send {
        (**self).get_by_id(id)
    }
    fn find_expiring(
        &self,
        from: Timestamp,
        until: Timestamp,
    ) -> impl Future<Output = Result<Vec<Tenant>, BillHubError>> + Send {
        (**self).find_expiring(from, until)
    }
    fn find_expired(
        &self,
        before: Timestamp,
    ) -> impl Future<Output = Result<Vec<Tenant>, BillHubError>> + Send {
        (**self).find_expired(before)
    }
    fn update(
        &self,
        tenant: Tenant,
    ) -> impl Future<Output = Result<Tenant, BillHubError>> + Send {
        (**self).update(tenant)
    }
}

impl<T: CustomerRepository + Send + Sync> CustomerRepository for Arc<T> {
    fn get_by_id(
        &self,
        id: CustomerId,
    ) -> impl Future<Output = Result<Option<Customer>, BillHubError>> + Send {
        (**self).get_by_id(id)
    }
}

impl<T: PackageRepository + Send + Sync> PackageRepository for Arc<T> {
    fn get_by_id(
        &self,
        id: PackageId,
    ) -> impl Future<Output = Result<Option<SubscriptionPackage>, BillHubError>> + Send {
        (**self).get_by_id(id)
    }
}

impl<T: InvoiceRepository + Send + Sync> InvoiceRepository for Arc<T> {
    fn insert(
        &self,
        invoice: Invoice,
    ) -> impl Future<Output = Result<InsertOutcome, BillHubError>> + Send {
        (**self).insert(invoice)
    }
    fn find_tenant_invoice(
        &self,
        tenant_id: TenantId,
        kind: InvoiceKind,
        period_end: Timestamp,
    ) -> impl Future<Output = Result<Option<Invoice>, BillHubError>> + Send {
        (**self).find_tenant_invoice(tenant_id, kind, period_end)
    }
}

impl<T: NotificationRepository + Send + Sync> NotificationRepository for Arc<T> {
    fn insert(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<Notification, BillHubError>> + Send {
        (**self).insert(notification)
    }
}

impl<T: AuditLogRepository + Send + Sync> AuditLogRepository for Arc<T> {
    fn append(
        &self,
        entry: AuditEntry,
    ) -> impl Future<Output = Result<AuditEntry, BillHubError>> + Send {
        (**self).append(entry)
    }
    fn exists_success_between(
        &self,
        kind: AutomationKind,
        tenant_id: TenantId,
        from: Timestamp,
        until: Timestamp,
    ) -> impl Future<Output = Result<bool, BillHubError>> + Send {
        (**self).exists_success_between(kind, tenant_id, from, until)
    }
    fn find_page(
        &self,
        filter: AuditFilter,
        page: u64,
        per_page: u64,
    ) -> impl Future<Output = Result<AuditPage, BillHubError>> + Send {
        (**self).find_page(filter, page, per_page)
    }
}
