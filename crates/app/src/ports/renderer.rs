//! Renderer port — invoice document artifacts.
//!
//! Rendering is a best-effort side step: a failure is logged by the caller
//! and never blocks the invoice row from being committed. Invoice existence
//! matters more than the rendered artifact.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use billhub_domain::invoice::Invoice;
use billhub_domain::package::SubscriptionPackage;
use billhub_domain::tenant::Tenant;

use super::BoxError;

/// Produces a document artifact for an invoice.
pub trait Renderer {
    /// Render `invoice` and return the artifact's path.
    fn render(
        &self,
        invoice: &Invoice,
        tenant: &Tenant,
        package: &SubscriptionPackage,
    ) -> impl Future<Output = Result<PathBuf, BoxError>> + Send;
}

impl<T: Renderer + Send + Sync> Renderer for Arc<T> {
    fn render(
        &self,
        invoice: &Invoice,
        tenant: &Tenant,
        package: &SubscriptionPackage,
    ) -> impl Future<Output = Result<PathBuf, BoxError>> + Send {
        (**self).render(invoice, tenant, package)
    }
}
