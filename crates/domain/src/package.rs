//! Subscription package — read-only reference data consulted for invoice
//! amounts and renewal length.

use serde::{Deserialize, Serialize};

use crate::id::PackageId;

/// A priced subscription plan with a duration in whole calendar months.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPackage {
    pub id: PackageId,
    pub name: String,
    pub price: f64,
    pub duration_months: u32,
}

impl SubscriptionPackage {
    /// Create a package. Duration is clamped to at least one month.
    #[must_use]
    pub fn new(name: impl Into<String>, price: f64, duration_months: u32) -> Self {
        Self {
            id: PackageId::new(),
            name: name.into(),
            price,
            duration_months: duration_months.max(1),
        }
    }
}
