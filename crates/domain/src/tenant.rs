//! Tenant — a billing-platform customer organization subject to
//! subscription lifecycle management.
//!
//! `status` and `subscription_end` are mutated only by the transition
//! engine in the application layer; nothing else in the platform writes
//! them. Tenants are created at onboarding and never deleted here.

use serde::{Deserialize, Serialize};

use crate::error::{BillHubError, ValidationError};
use crate::id::{PackageId, TenantId};
use crate::time::Timestamp;

/// Lifecycle state of a tenant's subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Suspended,
}

impl SubscriptionStatus {
    /// `Expired` and `Suspended` are both reachable through the deactivate
    /// transition and are equivalent for reactivation purposes.
    #[must_use]
    pub fn is_lapsed(self) -> bool {
        matches!(self, Self::Expired | Self::Suspended)
    }

    /// Stable storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Suspended => "suspended",
        }
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "suspended" => Ok(Self::Suspended),
            other => Err(format!("unknown subscription status: {other}")),
        }
    }
}

/// A tenant organization and its subscription timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// Contact address of the tenant's admin; reminder and suspension
    /// notices go here.
    pub email: String,
    pub status: SubscriptionStatus,
    pub subscription_start: Option<Timestamp>,
    pub subscription_end: Option<Timestamp>,
    pub package_id: Option<PackageId>,
}

impl Tenant {
    /// Create a builder for constructing a [`Tenant`].
    #[must_use]
    pub fn builder() -> TenantBuilder {
        TenantBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`BillHubError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), BillHubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    /// Whether the subscription end date has passed at `now`.
    #[must_use]
    pub fn is_past_end(&self, now: Timestamp) -> bool {
        self.subscription_end.is_some_and(|end| end < now)
    }
}

/// Step-by-step builder for [`Tenant`].
#[derive(Debug, Default)]
pub struct TenantBuilder {
    id: Option<TenantId>,
    name: Option<String>,
    email: Option<String>,
    status: Option<SubscriptionStatus>,
    subscription_start: Option<Timestamp>,
    subscription_end: Option<Timestamp>,
    package_id: Option<PackageId>,
}

impl TenantBuilder {
    #[must_use]
    pub fn id(mut self, id: TenantId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: SubscriptionStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn subscription_start(mut self, ts: Timestamp) -> Self {
        self.subscription_start = Some(ts);
        self
    }

    #[must_use]
    pub fn subscription_end(mut self, ts: Timestamp) -> Self {
        self.subscription_end = Some(ts);
        self
    }

    #[must_use]
    pub fn package_id(mut self, id: PackageId) -> Self {
        self.package_id = Some(id);
        self
    }

    /// Consume the builder, validate, and return a [`Tenant`].
    ///
    /// # Errors
    ///
    /// Returns [`BillHubError::Validation`] if required fields are missing
    /// or empty.
    pub fn build(self) -> Result<Tenant, BillHubError> {
        let tenant = Tenant {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            status: self.status.unwrap_or(SubscriptionStatus::Active),
            subscription_start: self.subscription_start,
            subscription_end: self.subscription_end,
            package_id: self.package_id,
        };
        tenant.validate()?;
        Ok(tenant)
    }
}
