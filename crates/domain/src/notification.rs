//! Notification — a queued message produced by the dispatcher and consumed
//! by an out-of-scope delivery/polling surface.

use serde::{Deserialize, Serialize};

use crate::id::{CustomerId, InvoiceId, NotificationId, TenantId};
use crate::time::Timestamp;

/// Delivery channel(s) requested for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    InApp,
    Email,
    Both,
}

impl Channel {
    /// Whether an in-app row should be stored.
    #[must_use]
    pub fn wants_in_app(self) -> bool {
        matches!(self, Self::InApp | Self::Both)
    }

    /// Whether an outbound email should be attempted.
    #[must_use]
    pub fn wants_email(self) -> bool {
        matches!(self, Self::Email | Self::Both)
    }

    /// Stable storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InApp => "in_app",
            Self::Email => "email",
            Self::Both => "both",
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_app" => Ok(Self::InApp),
            "email" => Ok(Self::Email),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown channel: {other}")),
        }
    }
}

/// A queued message for a tenant admin, a customer, or the platform operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    /// `None` for platform-level (operator) notifications.
    pub tenant_id: Option<TenantId>,
    pub customer_id: Option<CustomerId>,
    pub invoice_id: Option<InvoiceId>,
    pub title: String,
    pub message: String,
    pub channel: Channel,
    pub created_at: Timestamp,
}
