//! Audit entry — one row per automation attempt, success or failure.
//!
//! The audit log is append-only: entries are never updated or deleted. It
//! doubles as the idempotency oracle ("was this already handled today /
//! for this period?") and as the operational record behind the log-viewing
//! surface.

use serde::{Deserialize, Serialize};

use crate::id::{AuditEntryId, CustomerId, InvoiceId, TenantId};
use crate::time::Timestamp;

/// The automation that produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationKind {
    ExpiryReminder,
    Suspend,
    Reactivate,
    SubscriptionInvoice,
    SubscriptionEndInvoice,
    InstallationInvoice,
}

impl AutomationKind {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExpiryReminder => "expiry_reminder",
            Self::Suspend => "suspend",
            Self::Reactivate => "reactivate",
            Self::SubscriptionInvoice => "subscription_invoice",
            Self::SubscriptionEndInvoice => "subscription_end_invoice",
            Self::InstallationInvoice => "installation_invoice",
        }
    }
}

impl std::str::FromStr for AutomationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expiry_reminder" => Ok(Self::ExpiryReminder),
            "suspend" => Ok(Self::Suspend),
            "reactivate" => Ok(Self::Reactivate),
            "subscription_invoice" => Ok(Self::SubscriptionInvoice),
            "subscription_end_invoice" => Ok(Self::SubscriptionEndInvoice),
            "installation_invoice" => Ok(Self::InstallationInvoice),
            other => Err(format!("unknown automation kind: {other}")),
        }
    }
}

/// Outcome recorded for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Success,
    Failed,
}

impl AuditStatus {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for AuditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown audit status: {other}")),
        }
    }
}

/// One automation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub kind: AutomationKind,
    pub tenant_id: Option<TenantId>,
    pub customer_id: Option<CustomerId>,
    pub invoice_id: Option<InvoiceId>,
    pub status: AuditStatus,
    pub message: String,
    /// Source identifier of the trigger (`cron`, `webhook`, `manual`, …).
    pub triggered_by: String,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}

impl AuditEntry {
    /// Create a builder for constructing an [`AuditEntry`].
    #[must_use]
    pub fn builder(kind: AutomationKind, status: AuditStatus) -> AuditEntryBuilder {
        AuditEntryBuilder {
            kind,
            status,
            tenant_id: None,
            customer_id: None,
            invoice_id: None,
            message: String::new(),
            triggered_by: String::new(),
            metadata: serde_json::Value::Null,
        }
    }
}

/// Step-by-step builder for [`AuditEntry`].
#[derive(Debug)]
pub struct AuditEntryBuilder {
    kind: AutomationKind,
    status: AuditStatus,
    tenant_id: Option<TenantId>,
    customer_id: Option<CustomerId>,
    invoice_id: Option<InvoiceId>,
    message: String,
    triggered_by: String,
    metadata: serde_json::Value,
}

impl AuditEntryBuilder {
    #[must_use]
    pub fn tenant(mut self, id: TenantId) -> Self {
        self.tenant_id = Some(id);
        self
    }

    #[must_use]
    pub fn customer(mut self, id: CustomerId) -> Self {
        self.customer_id = Some(id);
        self
    }

    #[must_use]
    pub fn invoice(mut self, id: InvoiceId) -> Self {
        self.invoice_id = Some(id);
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn triggered_by(mut self, source: impl Into<String>) -> Self {
        self.triggered_by = source.into();
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Finalize the entry, stamping it with `at`.
    #[must_use]
    pub fn build(self, at: Timestamp) -> AuditEntry {
        AuditEntry {
            id: AuditEntryId::new(),
            kind: self.kind,
            tenant_id: self.tenant_id,
            customer_id: self.customer_id,
            invoice_id: self.invoice_id,
            status: self.status,
            message: self.message,
            triggered_by: self.triggered_by,
            metadata: self.metadata,
            created_at: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn should_build_entry_with_metadata() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let tenant_id = TenantId::new();
        let entry = AuditEntry::builder(AutomationKind::ExpiryReminder, AuditStatus::Success)
            .tenant(tenant_id)
            .message("reminder sent")
            .triggered_by("cron")
            .metadata(serde_json::json!({"window_days": 3}))
            .build(at);

        assert_eq!(entry.kind, AutomationKind::ExpiryReminder);
        assert_eq!(entry.tenant_id, Some(tenant_id));
        assert_eq!(entry.created_at, at);
        assert_eq!(entry.metadata["window_days"], 3);
    }

    #[test]
    fn should_roundtrip_kind_through_str() {
        for kind in [
            AutomationKind::ExpiryReminder,
            AutomationKind::Suspend,
            AutomationKind::Reactivate,
            AutomationKind::SubscriptionInvoice,
            AutomationKind::SubscriptionEndInvoice,
            AutomationKind::InstallationInvoice,
        ] {
            let parsed: AutomationKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }
}
