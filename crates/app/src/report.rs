//! Aggregate results returned to trigger callers.
//!
//! Every batch operation reports per-tenant outcomes so partial failure is
//! always visible, never silently dropped.

use serde::Serialize;

use billhub_domain::id::TenantId;
use billhub_domain::tenant::Tenant;

/// What happened to a single tenant during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Disposition {
    /// The tenant's pipeline ran to completion.
    Processed,
    /// The idempotency guard found prior work; nothing was done.
    Skipped,
    /// The tenant's pipeline failed; siblings were unaffected.
    Failed { reason: String },
}

/// Per-tenant line in a scan report.
#[derive(Debug, Clone, Serialize)]
pub struct TenantOutcome {
    pub tenant_id: TenantId,
    pub tenant_name: String,
    #[serde(flatten)]
    pub disposition: Disposition,
}

/// Aggregate result of a batch scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Number of candidate tenants the batch query returned.
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
    /// True when at least one audit append failed. The primary operations
    /// still completed; only the ledger is incomplete.
    pub degraded: bool,
    pub results: Vec<TenantOutcome>,
}

impl ScanReport {
    /// Record one tenant's outcome, updating the counters.
    pub fn record(&mut self, tenant: &Tenant, disposition: Disposition) {
        match &disposition {
            Disposition::Processed => self.succeeded += 1,
            Disposition::Skipped => self.skipped += 1,
            Disposition::Failed { .. } => self.failed += 1,
        }
        self.results.push(TenantOutcome {
            tenant_id: tenant.id,
            tenant_name: tenant.name.clone(),
            disposition,
        });
    }
}

/// Result of a single-tenant state transition.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub tenant: Tenant,
    /// False when the precondition did not hold and the call was a no-op.
    pub changed: bool,
    /// True when the audit append for this transition failed.
    pub degraded: bool,
}

/// Result of an invoice generation.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceOutcome {
    pub invoice: billhub_domain::invoice::Invoice,
    /// True when duplicate suppression returned a pre-existing invoice.
    pub reused: bool,
    /// True when the audit append for this generation failed.
    pub degraded: bool,
}

/// Combined result of ending a subscription: the suspension plus the
/// terminal invoice for the closing period.
#[derive(Debug, Clone, Serialize)]
pub struct EndSubscriptionOutcome {
    pub transition: TransitionOutcome,
    pub invoice: InvoiceOutcome,
}
