//! Shared application state for axum handlers.

use std::sync::Arc;

use billhub_app::ports::{
    AuditLogRepository, Clock, CustomerRepository, InvoiceRepository, Messenger,
    NotificationRepository, PackageRepository, Renderer, TenantRepository,
};
use billhub_app::services::invoice_generator::InvoiceGenerator;
use billhub_app::services::lifecycle_scanner::LifecycleScanner;
use billhub_app::services::transition_engine::TransitionEngine;

use crate::auth::AuthConfig;

/// Application state shared across all axum handlers.
///
/// Generic over the port implementations to avoid dynamic dispatch.
/// `Clone` is implemented manually so the underlying types themselves do
/// not need to be `Clone` — only the `Arc` wrappers are cloned.
pub struct AppState<TR, CR, PR, IR, RD, NR, M, AR, C> {
    /// Batch sweeps and end-of-subscription composition.
    pub scanner: Arc<LifecycleScanner<TR, CR, PR, IR, RD, NR, M, AR, C>>,
    /// Single-tenant state transitions (reactivation).
    pub engine: Arc<TransitionEngine<TR, PR, NR, M, AR, C>>,
    /// Invoice issuing for subscription starts and installations.
    pub generator: Arc<InvoiceGenerator<TR, CR, PR, IR, RD, NR, M, AR, C>>,
    /// Audit log read access for the log-viewing endpoint.
    pub audit: Arc<AR>,
    /// Gateway credentials.
    pub auth: Arc<AuthConfig>,
}

impl<TR, CR, PR, IR, RD, NR, M, AR, C> Clone for AppState<TR, CR, PR, IR, RD, NR, M, AR, C> {
    fn clone(&self) -> Self {
        Self {
            scanner: Arc::clone(&self.scanner),
            engine: Arc::clone(&self.engine),
            generator: Arc::clone(&self.generator),
            audit: Arc::clone(&self.audit),
            auth: Arc::clone(&self.auth),
        }
    }
}

impl<TR, CR, PR, IR, RD, NR, M, AR, C> AppState<TR, CR, PR, IR, RD, NR, M, AR, C>
where
    TR: TenantRepository + Send + Sync + 'static,
    CR: CustomerRepository + Send + Sync + 'static,
    PR: PackageRepository + Send + Sync + 'static,
    IR: InvoiceRepository + Send + Sync + 'static,
    RD: Renderer + Send + Sync + 'static,
    NR: NotificationRepository + Send + Sync + 'static,
    M: Messenger + Send + Sync + 'static,
    AR: AuditLogRepository + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Create a new application state from service instances.
    pub fn new(
        scanner: LifecycleScanner<TR, CR, PR, IR, RD, NR, M, AR, C>,
        engine: TransitionEngine<TR, PR, NR, M, AR, C>,
        generator: InvoiceGenerator<TR, CR, PR, IR, RD, NR, M, AR, C>,
        audit: AR,
        auth: AuthConfig,
    ) -> Self {
        Self {
            scanner: Arc::new(scanner),
            engine: Arc::new(engine),
            generator: Arc::new(generator),
            audit: Arc::new(audit),
            auth: Arc::new(auth),
        }
    }
}
