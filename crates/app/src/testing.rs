//! In-memory fakes shared by the service test modules.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use billhub_domain::audit::{AuditEntry, AuditStatus, AutomationKind};
use billhub_domain::customer::Customer;
use billhub_domain::error::BillHubError;
use billhub_domain::id::{CustomerId, PackageId, TenantId};
use billhub_domain::invoice::{Invoice, InvoiceKind};
use billhub_domain::notification::Notification;
use billhub_domain::package::SubscriptionPackage;
use billhub_domain::tenant::{SubscriptionStatus, Tenant};
use billhub_domain::time::Timestamp;

use crate::ports::{
    AuditFilter, AuditLogRepository, AuditPage, BoxError, Clock, CustomerRepository, InsertOutcome,
    InvoiceRepository, Messenger, NotificationRepository, PackageRepository, Renderer,
    TenantRepository,
};

fn storage_err(msg: &str) -> BillHubError {
    BillHubError::Storage(msg.to_string().into())
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

// ── Tenants ────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryTenants {
    store: Mutex<HashMap<TenantId, Tenant>>,
}

impl InMemoryTenants {
    pub fn with(tenants: Vec<Tenant>) -> Self {
        let map: HashMap<_, _> = tenants.into_iter().map(|t| (t.id, t)).collect();
        Self {
            store: Mutex::new(map),
        }
    }

    pub fn get(&self, id: TenantId) -> Option<Tenant> {
        self.store.lock().unwrap().get(&id).cloned()
    }
}

impl TenantRepository for InMemoryTenants {
    async fn get_by_id(&self, id: TenantId) -> Result<Option<Tenant>, BillHubError> {
        Ok(self.store.lock().unwrap().get(&id).cloned())
    }

    async fn find_expiring(
        &self,
        from: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<Tenant>, BillHubError> {
        let store = self.store.lock().unwrap();
        let mut found: Vec<Tenant> = store
            .values()
            .filter(|t| {
                t.status == SubscriptionStatus::Active
                    && t.subscription_end
                        .is_some_and(|end| end >= from && end <= until)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn find_expired(&self, before: Timestamp) -> Result<Vec<Tenant>, BillHubError> {
        let store = self.store.lock().unwrap();
        let mut found: Vec<Tenant> = store
            .values()
            .filter(|t| {
                t.status == SubscriptionStatus::Active
                    && t.subscription_end.is_some_and(|end| end < before)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn update(&self, tenant: Tenant) -> Result<Tenant, BillHubError> {
        self.store.lock().unwrap().insert(tenant.id, tenant.clone());
        Ok(tenant)
    }
}

// ── Customers ──────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryCustomers {
    store: Mutex<HashMap<CustomerId, Customer>>,
}

impl InMemoryCustomers {
    pub fn with(customers: Vec<Customer>) -> Self {
        let map: HashMap<_, _> = customers.into_iter().map(|c| (c.id, c)).collect();
        Self {
            store: Mutex::new(map),
        }
    }
}

impl CustomerRepository for InMemoryCustomers {
    async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, BillHubError> {
        Ok(self.store.lock().unwrap().get(&id).cloned())
    }
}

// ── Packages ───────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryPackages {
    store: Mutex<HashMap<PackageId, SubscriptionPackage>>,
}

impl InMemoryPackages {
    pub fn with(packages: Vec<SubscriptionPackage>) -> Self {
        let map: HashMap<_, _> = packages.into_iter().map(|p| (p.id, p)).collect();
        Self {
            store: Mutex::new(map),
        }
    }
}

impl PackageRepository for InMemoryPackages {
    async fn get_by_id(&self, id: PackageId) -> Result<Option<SubscriptionPackage>, BillHubError> {
        Ok(self.store.lock().unwrap().get(&id).cloned())
    }
}

// ── Invoices ───────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryInvoices {
    rows: Mutex<Vec<Invoice>>,
}

impl InMemoryInvoices {
    pub fn all(&self) -> Vec<Invoice> {
        self.rows.lock().unwrap().clone()
    }

    pub fn count_for(&self, tenant_id: TenantId, kind: InvoiceKind) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.tenant_id == tenant_id && i.kind == kind)
            .count()
    }
}

impl InvoiceRepository for InMemoryInvoices {
    async fn insert(&self, invoice: Invoice) -> Result<InsertOutcome, BillHubError> {
        let mut rows = self.rows.lock().unwrap();
        // Mirrors the storage-level unique index on tenant-level invoices.
        let duplicate = invoice.customer_id.is_none()
            && rows.iter().any(|i| {
                i.customer_id.is_none()
                    && i.tenant_id == invoice.tenant_id
                    && i.kind == invoice.kind
                    && i.period_end == invoice.period_end
            });
        if duplicate {
            return Ok(InsertOutcome::Duplicate);
        }
        rows.push(invoice.clone());
        Ok(InsertOutcome::Inserted(invoice))
    }

    async fn find_tenant_invoice(
        &self,
        tenant_id: TenantId,
        kind: InvoiceKind,
        period_end: Timestamp,
    ) -> Result<Option<Invoice>, BillHubError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|i| {
                i.customer_id.is_none()
                    && i.tenant_id == tenant_id
                    && i.kind == kind
                    && i.period_end == period_end
            })
            .cloned())
    }
}

// ── Notifications ──────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryNotifications {
    rows: Mutex<Vec<Notification>>,
    fail_for: Mutex<HashSet<TenantId>>,
}

impl InMemoryNotifications {
    pub fn all(&self) -> Vec<Notification> {
        self.rows.lock().unwrap().clone()
    }

    /// Make inserts fail for notifications referencing `tenant_id`.
    pub fn fail_for_tenant(&self, tenant_id: TenantId) {
        self.fail_for.lock().unwrap().insert(tenant_id);
    }
}

impl NotificationRepository for InMemoryNotifications {
    async fn insert(&self, notification: Notification) -> Result<Notification, BillHubError> {
        if let Some(tenant_id) = notification.tenant_id {
            if self.fail_for.lock().unwrap().contains(&tenant_id) {
                return Err(storage_err("notification insert failed"));
            }
        }
        self.rows.lock().unwrap().push(notification.clone());
        Ok(notification)
    }
}

// ── Audit log ──────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryAuditLog {
    rows: Mutex<Vec<AuditEntry>>,
    fail_appends: Mutex<bool>,
}

impl InMemoryAuditLog {
    pub fn all(&self) -> Vec<AuditEntry> {
        self.rows.lock().unwrap().clone()
    }

    pub fn count_for(&self, kind: AutomationKind, tenant_id: TenantId) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind && e.tenant_id == Some(tenant_id))
            .count()
    }

    /// Make all subsequent appends fail.
    pub fn fail_appends(&self) {
        *self.fail_appends.lock().unwrap() = true;
    }
}

impl AuditLogRepository for InMemoryAuditLog {
    async fn append(&self, entry: AuditEntry) -> Result<AuditEntry, BillHubError> {
        if *self.fail_appends.lock().unwrap() {
            return Err(storage_err("audit append failed"));
        }
        self.rows.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn exists_success_between(
        &self,
        kind: AutomationKind,
        tenant_id: TenantId,
        from: Timestamp,
        until: Timestamp,
    ) -> Result<bool, BillHubError> {
        Ok(self.rows.lock().unwrap().iter().any(|e| {
            e.kind == kind
                && e.tenant_id == Some(tenant_id)
                && e.status == AuditStatus::Success
                && e.created_at >= from
                && e.created_at <= until
        }))
    }

    async fn find_page(
        &self,
        filter: AuditFilter,
        page: u64,
        per_page: u64,
    ) -> Result<AuditPage, BillHubError> {
        let rows = self.rows.lock().unwrap();
        let mut matching: Vec<AuditEntry> = rows
            .iter()
            .filter(|e| {
                filter.kind.is_none_or(|k| e.kind == k)
                    && filter.status.is_none_or(|s| e.status == s)
                    && filter.tenant_id.is_none_or(|t| e.tenant_id == Some(t))
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as u64;
        let offset = usize::try_from(page.saturating_sub(1) * per_page).unwrap_or(usize::MAX);
        let entries = matching
            .into_iter()
            .skip(offset)
            .take(usize::try_from(per_page).unwrap_or(usize::MAX))
            .collect();
        Ok(AuditPage { entries, total })
    }
}

// ── Messenger ──────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingMessenger {
    pub emails: Mutex<Vec<(String, String)>>,
    pub sms: Mutex<Vec<(String, String)>>,
    fail_email: Mutex<bool>,
}

impl RecordingMessenger {
    /// Make all subsequent email sends fail.
    pub fn fail_emails(&self) {
        *self.fail_email.lock().unwrap() = true;
    }
}

impl Messenger for RecordingMessenger {
    async fn send_email(&self, to: &str, subject: &str, _body: &str) -> Result<(), BoxError> {
        if *self.fail_email.lock().unwrap() {
            return Err("smtp unavailable".into());
        }
        self.emails
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }

    async fn send_sms(&self, to: &str, body: &str) -> Result<(), BoxError> {
        self.sms
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

// ── Renderer ───────────────────────────────────────────────────

#[derive(Default)]
pub struct StubRenderer {
    fail: bool,
    pub rendered: Mutex<Vec<String>>,
}

impl StubRenderer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            rendered: Mutex::new(Vec::new()),
        }
    }
}

impl Renderer for StubRenderer {
    async fn render(
        &self,
        invoice: &Invoice,
        _tenant: &Tenant,
        _package: &SubscriptionPackage,
    ) -> Result<PathBuf, BoxError> {
        if self.fail {
            return Err("render failed".into());
        }
        self.rendered
            .lock()
            .unwrap()
            .push(invoice.bill_number.clone());
        Ok(PathBuf::from(format!("/tmp/{}.txt", invoice.bill_number)))
    }
}
