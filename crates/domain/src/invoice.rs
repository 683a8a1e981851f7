//! Invoice — a billing record created by a lifecycle event.
//!
//! Invoices are inserted by the invoice generator and never mutated by this
//! subsystem afterwards; payment status changes belong to the billing
//! subsystem. A `customer_id` of `None` marks a tenant-level subscription
//! invoice, as opposed to a customer-level installation invoice.

use serde::{Deserialize, Serialize};

use crate::id::{CustomerId, InvoiceId, TenantId};
use crate::time::Timestamp;

/// What lifecycle event produced the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    /// Issued when a subscription period starts.
    Subscription,
    /// Terminal invoice for a subscription period. At most one exists per
    /// `(tenant, period_end)`.
    SubscriptionEnd,
    /// Issued when a customer installation completes.
    Installation,
}

impl InvoiceKind {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::SubscriptionEnd => "subscription_end",
            Self::Installation => "installation",
        }
    }

    /// Prefix used when deriving bill numbers.
    #[must_use]
    pub fn bill_prefix(self) -> &'static str {
        match self {
            Self::Subscription => "SUB",
            Self::SubscriptionEnd => "SUB-END",
            Self::Installation => "INST",
        }
    }
}

impl std::str::FromStr for InvoiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscription" => Ok(Self::Subscription),
            "subscription_end" => Ok(Self::SubscriptionEnd),
            "installation" => Ok(Self::Installation),
            other => Err(format!("unknown invoice kind: {other}")),
        }
    }
}

/// Payment state. Only `Pending` is ever written by this subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(format!("unknown invoice status: {other}")),
        }
    }
}

/// A billing record tied to a subscription period or an installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// Practically-unique human-facing number derived from the kind prefix,
    /// the tenant id, and the creation timestamp.
    pub bill_number: String,
    pub tenant_id: TenantId,
    /// `None` for tenant-level subscription invoices.
    pub customer_id: Option<CustomerId>,
    pub kind: InvoiceKind,
    pub amount: f64,
    pub status: InvoiceStatus,
    pub period_start: Timestamp,
    pub period_end: Timestamp,
    pub due_date: Timestamp,
    pub note: String,
    pub created_at: Timestamp,
}

impl Invoice {
    /// Derive a bill number for a tenant-scoped invoice.
    #[must_use]
    pub fn bill_number_for(kind: InvoiceKind, tenant_id: TenantId, at: Timestamp) -> String {
        format!(
            "{}-{}-{}",
            kind.bill_prefix(),
            tenant_id,
            at.timestamp_millis()
        )
    }
}
