//! # billhub-adapter-render-fs
//!
//! Renders invoice documents as plain-text files under a configured
//! directory. The artifact is a convenience copy; the invoice row in
//! storage stays authoritative, and callers treat render failures as
//! non-fatal.

use std::path::{Path, PathBuf};

use billhub_app::ports::{BoxError, Renderer};
use billhub_domain::invoice::Invoice;
use billhub_domain::package::SubscriptionPackage;
use billhub_domain::tenant::Tenant;

/// Errors originating from artifact rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Writing the artifact failed.
    #[error("failed to write invoice artifact")]
    Io(#[from] std::io::Error),
}

/// Writes one text file per invoice, named after the bill number.
pub struct FsRenderer {
    dir: PathBuf,
}

impl FsRenderer {
    /// Create a renderer writing under `dir`. The directory is created on
    /// first render.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn document(invoice: &Invoice, tenant: &Tenant, package: &SubscriptionPackage) -> String {
        let date = |ts: billhub_domain::time::Timestamp| ts.format("%Y-%m-%d").to_string();
        format!(
            "INVOICE {bill}\n\
             Tenant: {tenant}\n\
             Package: {package}\n\
             Kind: {kind}\n\
             Amount: {amount:.2}\n\
             Period: {start} to {end}\n\
             Due: {due}\n\
             Note: {note}\n",
            bill = invoice.bill_number,
            tenant = tenant.name,
            package = package.name,
            kind = invoice.kind.as_str(),
            amount = invoice.amount,
            start = date(invoice.period_start),
            end = date(invoice.period_end),
            due = date(invoice.due_date),
            note = invoice.note,
        )
    }

    async fn write(&self, name: &str, contents: String) -> Result<PathBuf, RenderError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{name}.txt"));
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }
}

impl Renderer for FsRenderer {
    async fn render(
        &self,
        invoice: &Invoice,
        tenant: &Tenant,
        package: &SubscriptionPackage,
    ) -> Result<PathBuf, BoxError> {
        let contents = Self::document(invoice, tenant, package);
        let path = self.write(&invoice.bill_number, contents).await?;
        tracing::debug!(path = %path.display(), "invoice artifact written");
        Ok(path)
    }
}

impl AsRef<Path> for FsRenderer {
    fn as_ref(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billhub_domain::id::InvoiceId;
    use billhub_domain::invoice::{InvoiceKind, InvoiceStatus};
    use billhub_domain::time::now;

    fn fixtures() -> (Invoice, Tenant, SubscriptionPackage) {
        let tenant = Tenant::builder()
            .name("Acme ISP")
            .email("admin@acme.test")
            .build()
            .unwrap();
        let package = SubscriptionPackage::new("Starter", 49.0, 6);
        let at = now();
        let invoice = Invoice {
            id: InvoiceId::new(),
            bill_number: Invoice::bill_number_for(InvoiceKind::Subscription, tenant.id, at),
            tenant_id: tenant.id,
            customer_id: None,
            kind: InvoiceKind::Subscription,
            amount: 49.0,
            status: InvoiceStatus::Pending,
            period_start: at,
            period_end: at,
            due_date: at,
            note: "test".to_string(),
            created_at: at,
        };
        (invoice, tenant, package)
    }

    #[tokio::test]
    async fn should_write_artifact_named_after_bill_number() {
        let dir = std::env::temp_dir().join(format!("billhub-render-{}", uuid::Uuid::new_v4()));
        let renderer = FsRenderer::new(&dir);
        let (invoice, tenant, package) = fixtures();

        let path = renderer.render(&invoice, &tenant, &package).await.unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("{}.txt", invoice.bill_number)
        );
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.contains("Acme ISP"));
        assert!(contents.contains(&invoice.bill_number));
        assert!(contents.contains("49.00"));
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn should_fail_when_directory_is_not_writable() {
        let (invoice, tenant, package) = fixtures();
        let renderer = FsRenderer::new("/proc/billhub-nonexistent");

        let result = renderer.render(&invoice, &tenant, &package).await;
        assert!(result.is_err());
    }
}
