//! Customer — an end customer of a tenant, billed through installation
//! invoices when their connection is completed.

use serde::{Deserialize, Serialize};

use crate::id::{CustomerId, PackageId, TenantId};

/// A tenant's end customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub tenant_id: TenantId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// The service package assigned at signup; its price drives the
    /// installation invoice amount.
    pub package_id: Option<PackageId>,
}
