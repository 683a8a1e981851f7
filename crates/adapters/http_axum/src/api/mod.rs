//! JSON trigger and audit-log handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod logs;
#[allow(clippy::missing_errors_doc)]
pub mod triggers;

use axum::Router;
use axum::routing::{get, post};

use billhub_app::ports::{
    AuditLogRepository, Clock, CustomerRepository, InvoiceRepository, Messenger,
    NotificationRepository, PackageRepository, Renderer, TenantRepository,
};

use crate::state::AppState;

/// Build the `/automation` sub-router.
pub fn routes<TR, CR, PR, IR, RD, NR, M, AR, C>()
-> Router<AppState<TR, CR, PR, IR, RD, NR, M, AR, C>>
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
    Router::new()
        // Machine triggers (schedulers, upstream billing events).
        .route(
            "/webhook/check-expiry",
            post(triggers::check_expiry::<TR, CR, PR, IR, RD, NR, M, AR, C>),
        )
        .route(
            "/webhook/suspend-expired",
            post(triggers::suspend_expired::<TR, CR, PR, IR, RD, NR, M, AR, C>),
        )
        .route(
            "/webhook/subscription-start",
            post(triggers::subscription_start::<TR, CR, PR, IR, RD, NR, M, AR, C>),
        )
        .route(
            "/webhook/subscription-end",
            post(triggers::subscription_end::<TR, CR, PR, IR, RD, NR, M, AR, C>),
        )
        .route(
            "/webhook/reactivate",
            post(triggers::reactivate::<TR, CR, PR, IR, RD, NR, M, AR, C>),
        )
        .route(
            "/webhook/installation",
            post(triggers::installation::<TR, CR, PR, IR, RD, NR, M, AR, C>),
        )
        // Operator-only manual triggers and the audit log.
        .route(
            "/check-expiry",
            post(triggers::operator_check_expiry::<TR, CR, PR, IR, RD, NR, M, AR, C>),
        )
        .route(
            "/suspend-expired",
            post(triggers::operator_suspend_expired::<TR, CR, PR, IR, RD, NR, M, AR, C>),
        )
        .route(
            "/logs",
            get(logs::list::<TR, CR, PR, IR, RD, NR, M, AR, C>),
        )
}
