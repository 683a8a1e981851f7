//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use billhub_app::ports::{
    AuditLogRepository, Clock, CustomerRepository, InvoiceRepository, Messenger,
    NotificationRepository, PackageRepository, Renderer, TenantRepository,
};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts the automation API under `/automation` and a public health check
/// at `/health`. Includes a [`TraceLayer`] that logs each HTTP
/// request/response at the `DEBUG` level using the `tracing` ecosystem.
pub fn build<TR, CR, PR, IR, RD, NR, M, AR, C>(
    state: AppState<TR, CR, PR, IR, RD, NR, M, AR, C>,
) -> Router
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
        .route("/health", get(health_check))
        .nest("/automation", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use billhub_app::ports::{AuditFilter, AuditPage, BoxError, InsertOutcome, SystemClock};
    use billhub_app::services::audit_log::AutomationAuditLog;
    use billhub_app::services::dispatcher::NotificationDispatcher;
    use billhub_app::services::invoice_generator::InvoiceGenerator;
    use billhub_app::services::lifecycle_scanner::LifecycleScanner;
    use billhub_app::services::transition_engine::TransitionEngine;
    use billhub_domain::audit::{AuditEntry, AutomationKind};
    use billhub_domain::customer::Customer;
    use billhub_domain::error::BillHubError;
    use billhub_domain::id::{CustomerId, PackageId, TenantId};
    use billhub_domain::invoice::{Invoice, InvoiceKind};
    use billhub_domain::notification::Notification;
    use billhub_domain::package::SubscriptionPackage;
    use billhub_domain::tenant::Tenant;
    use billhub_domain::time::Timestamp;
    use std::path::PathBuf;
    use tower::ServiceExt;

    #[derive(Clone, Copy)]
    struct StubTenants;
    #[derive(Clone, Copy)]
    struct StubCustomers;
    #[derive(Clone, Copy)]
    struct StubPackages;
    #[derive(Clone, Copy)]
    struct StubInvoices;
    #[derive(Clone, Copy)]
    struct StubRenderer;
    #[derive(Clone, Copy)]
    struct StubNotifications;
    #[derive(Clone, Copy)]
    struct StubMessenger;
    #[derive(Clone, Copy)]
    struct StubAudit;

    impl billhub_app::ports::TenantRepository for StubTenants {
        async fn get_by_id(&self, _id: TenantId) -> Result<Option<Tenant>, BillHubError> {
            Ok(None)
        }
        async fn find_expiring(
            &self,
            _from: Timestamp,
            _until: Timestamp,
        ) -> Result<Vec<Tenant>, BillHubError> {
            Ok(vec![])
        }
        async fn find_expired(&self, _before: Timestamp) -> Result<Vec<Tenant>, BillHubError> {
            Ok(vec![])
        }
        async fn update(&self, tenant: Tenant) -> Result<Tenant, BillHubError> {
            Ok(tenant)
        }
    }

    impl billhub_app::ports::CustomerRepository for StubCustomers {
        async fn get_by_id(&self, _id: CustomerId) -> Result<Option<Customer>, BillHubError> {
            Ok(None)
        }
    }

    impl billhub_app::ports::PackageRepository for StubPackages {
        async fn get_by_id(
            &self,
            _id: PackageId,
        ) -> Result<Option<SubscriptionPackage>, BillHubError> {
            Ok(None)
        }
    }

    impl billhub_app::ports::InvoiceRepository for StubInvoices {
        async fn insert(&self, invoice: Invoice) -> Result<InsertOutcome, BillHubError> {
            Ok(InsertOutcome::Inserted(invoice))
        }
        async fn find_tenant_invoice(
            &self,
            _tenant_id: TenantId,
            _kind: InvoiceKind,
            _period_end: Timestamp,
        ) -> Result<Option<Invoice>, BillHubError> {
            Ok(None)
        }
    }

    impl billhub_app::ports::Renderer for StubRenderer {
        async fn render(
            &self,
            invoice: &Invoice,
            _tenant: &Tenant,
            _package: &SubscriptionPackage,
        ) -> Result<PathBuf, BoxError> {
            Ok(PathBuf::from(format!("{}.txt", invoice.bill_number)))
        }
    }

    impl billhub_app::ports::NotificationRepository for StubNotifications {
        async fn insert(&self, notification: Notification) -> Result<Notification, BillHubError> {
            Ok(notification)
        }
    }

    impl billhub_app::ports::Messenger for StubMessenger {
        async fn send_email(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), BoxError> {
            Ok(())
        }
        async fn send_sms(&self, _to: &str, _body: &str) -> Result<(), BoxError> {
            Ok(())
        }
    }

    impl billhub_app::ports::AuditLogRepository for StubAudit {
        async fn append(&self, entry: AuditEntry) -> Result<AuditEntry, BillHubError> {
            Ok(entry)
        }
        async fn exists_success_between(
            &self,
            _kind: AutomationKind,
            _tenant_id: TenantId,
            _from: Timestamp,
            _until: Timestamp,
        ) -> Result<bool, BillHubError> {
            Ok(false)
        }
        async fn find_page(
            &self,
            _filter: AuditFilter,
            _page: u64,
            _per_page: u64,
        ) -> Result<AuditPage, BillHubError> {
            Ok(AuditPage {
                entries: vec![],
                total: 0,
            })
        }
    }

    type StubState = AppState<
        StubTenants,
        StubCustomers,
        StubPackages,
        StubInvoices,
        StubRenderer,
        StubNotifications,
        StubMessenger,
        StubAudit,
        SystemClock,
    >;

    fn test_state() -> StubState {
        let engine = TransitionEngine::new(
            StubTenants,
            StubPackages,
            NotificationDispatcher::new(StubNotifications, StubMessenger),
            AutomationAuditLog::new(StubAudit),
            SystemClock,
        );
        let generator = InvoiceGenerator::new(
            StubTenants,
            StubCustomers,
            StubPackages,
            StubInvoices,
            StubRenderer,
            NotificationDispatcher::new(StubNotifications, StubMessenger),
            AutomationAuditLog::new(StubAudit),
            SystemClock,
        );
        let scanner = LifecycleScanner::new(
            StubTenants,
            TransitionEngine::new(
                StubTenants,
                StubPackages,
                NotificationDispatcher::new(StubNotifications, StubMessenger),
                AutomationAuditLog::new(StubAudit),
                SystemClock,
            ),
            InvoiceGenerator::new(
                StubTenants,
                StubCustomers,
                StubPackages,
                StubInvoices,
                StubRenderer,
                NotificationDispatcher::new(StubNotifications, StubMessenger),
                AutomationAuditLog::new(StubAudit),
                SystemClock,
            ),
            NotificationDispatcher::new(StubNotifications, StubMessenger),
            AutomationAuditLog::new(StubAudit),
            SystemClock,
        );
        AppState::new(
            scanner,
            engine,
            generator,
            StubAudit,
            AuthConfig {
                api_key: Some("trigger-secret".to_string()),
                operator_token: Some("op-token".to_string()),
            },
        )
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = build(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_reject_webhook_without_secret() {
        let app = build(test_state());

        let response = app
            .oneshot(json_post("/automation/webhook/check-expiry", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn should_run_scan_when_webhook_secret_in_body() {
        let app = build(test_state());

        let response = app
            .oneshot(json_post(
                "/automation/webhook/check-expiry",
                r#"{"api_key": "trigger-secret", "window_days": 3}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn should_reject_subscription_start_without_tenant_id() {
        let app = build(test_state());

        let response = app
            .oneshot(json_post(
                "/automation/webhook/subscription-start",
                r#"{"api_key": "trigger-secret"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_tenant() {
        let app = build(test_state());
        let body = format!(
            r#"{{"api_key": "trigger-secret", "tenant_id": "{}"}}"#,
            TenantId::new()
        );

        let response = app
            .oneshot(json_post("/automation/webhook/reactivate", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_reject_logs_without_operator_token() {
        let app = build(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/automation/logs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn should_list_logs_for_operator() {
        let app = build(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/automation/logs?status=success&per_page=10")
                    .header(header::AUTHORIZATION, "Bearer op-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["total"], 0);
        assert_eq!(body["page"], 1);
    }
}
