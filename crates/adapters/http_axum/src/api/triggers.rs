//! Webhook and operator trigger handlers.
//!
//! Every handler authenticates before touching engine logic, and a missing
//! or malformed id in the body is rejected with 400 before any lookup.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use billhub_app::ports::{
    AuditLogRepository, Clock, CustomerRepository, InvoiceRepository, Messenger,
    NotificationRepository, PackageRepository, Renderer, TenantRepository,
};
use billhub_app::report::{EndSubscriptionOutcome, InvoiceOutcome, ScanReport, TransitionOutcome};
use billhub_domain::id::{CustomerId, TenantId};

use crate::error::ApiError;
use crate::state::AppState;

/// Reminder window used when the trigger does not specify one.
const DEFAULT_WINDOW_DAYS: i64 = 3;

const TRIGGER_WEBHOOK: &str = "webhook";
const TRIGGER_MANUAL: &str = "manual";

/// Body for the batch-scan webhooks.
#[derive(Debug, Default, Deserialize)]
pub struct ScanTriggerRequest {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub window_days: Option<i64>,
}

/// Body for tenant-scoped webhooks.
#[derive(Debug, Default, Deserialize)]
pub struct TenantTriggerRequest {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// Body for customer-scoped webhooks.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerTriggerRequest {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Serialize)]
pub struct ScanResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: ScanReport,
}

#[derive(Serialize)]
pub struct TransitionResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: TransitionOutcome,
}

#[derive(Serialize)]
pub struct InvoiceResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: InvoiceOutcome,
}

#[derive(Serialize)]
pub struct EndSubscriptionResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: EndSubscriptionOutcome,
}

fn parse_tenant_id(raw: Option<String>) -> Result<TenantId, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::BadRequest("tenant_id is required".to_string()))?;
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("malformed tenant_id: {raw}")))
}

fn parse_customer_id(raw: Option<String>) -> Result<CustomerId, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::BadRequest("customer_id is required".to_string()))?;
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("malformed customer_id: {raw}")))
}

/// `POST /automation/webhook/check-expiry`
pub async fn check_expiry<TR, CR, PR, IR, RD, NR, M, AR, C>(
    State(state): State<AppState<TR, CR, PR, IR, RD, NR, M, AR, C>>,
    headers: HeaderMap,
    Json(req): Json<ScanTriggerRequest>,
) -> Result<Json<ScanResponse>, ApiError>
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
    state.auth.verify_trigger(&headers, req.api_key.as_deref())?;
    let window = req.window_days.unwrap_or(DEFAULT_WINDOW_DAYS).max(0);
    let report = state.scanner.scan_expiring(window, TRIGGER_WEBHOOK).await?;
    Ok(Json(ScanResponse {
        success: true,
        report,
    }))
}

/// `POST /automation/webhook/suspend-expired`
pub async fn suspend_expired<TR, CR, PR, IR, RD, NR, M, AR, C>(
    State(state): State<AppState<TR, CR, PR, IR, RD, NR, M, AR, C>>,
    headers: HeaderMap,
    Json(req): Json<ScanTriggerRequest>,
) -> Result<Json<ScanResponse>, ApiError>
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
    state.auth.verify_trigger(&headers, req.api_key.as_deref())?;
    let report = state.scanner.scan_expired(TRIGGER_WEBHOOK).await?;
    Ok(Json(ScanResponse {
        success: true,
        report,
    }))
}

/// `POST /automation/webhook/subscription-start`
pub async fn subscription_start<TR, CR, PR, IR, RD, NR, M, AR, C>(
    State(state): State<AppState<TR, CR, PR, IR, RD, NR, M, AR, C>>,
    headers: HeaderMap,
    Json(req): Json<TenantTriggerRequest>,
) -> Result<Json<InvoiceResponse>, ApiError>
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
    state.auth.verify_trigger(&headers, req.api_key.as_deref())?;
    let tenant_id = parse_tenant_id(req.tenant_id)?;
    let outcome = state
        .generator
        .subscription_invoice(tenant_id, TRIGGER_WEBHOOK)
        .await?;
    Ok(Json(InvoiceResponse {
        success: true,
        outcome,
    }))
}

/// `POST /automation/webhook/subscription-end`
pub async fn subscription_end<TR, CR, PR, IR, RD, NR, M, AR, C>(
    State(state): State<AppState<TR, CR, PR, IR, RD, NR, M, AR, C>>,
    headers: HeaderMap,
    Json(req): Json<TenantTriggerRequest>,
) -> Result<Json<EndSubscriptionResponse>, ApiError>
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
    state.auth.verify_trigger(&headers, req.api_key.as_deref())?;
    let tenant_id = parse_tenant_id(req.tenant_id)?;
    let outcome = state
        .scanner
        .end_subscription(tenant_id, TRIGGER_WEBHOOK)
        .await?;
    Ok(Json(EndSubscriptionResponse {
        success: true,
        outcome,
    }))
}

/// `POST /automation/webhook/reactivate`
pub async fn reactivate<TR, CR, PR, IR, RD, NR, M, AR, C>(
    State(state): State<AppState<TR, CR, PR, IR, RD, NR, M, AR, C>>,
    headers: HeaderMap,
    Json(req): Json<TenantTriggerRequest>,
) -> Result<Json<TransitionResponse>, ApiError>
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
    state.auth.verify_trigger(&headers, req.api_key.as_deref())?;
    let tenant_id = parse_tenant_id(req.tenant_id)?;
    let outcome = state.engine.reactivate(tenant_id, TRIGGER_WEBHOOK).await?;
    Ok(Json(TransitionResponse {
        success: true,
        outcome,
    }))
}

/// `POST /automation/webhook/installation`
pub async fn installation<TR, CR, PR, IR, RD, NR, M, AR, C>(
    State(state): State<AppState<TR, CR, PR, IR, RD, NR, M, AR, C>>,
    headers: HeaderMap,
    Json(req): Json<CustomerTriggerRequest>,
) -> Result<Json<InvoiceResponse>, ApiError>
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
    state.auth.verify_trigger(&headers, req.api_key.as_deref())?;
    let customer_id = parse_customer_id(req.customer_id)?;
    let outcome = state
        .generator
        .installation_invoice(customer_id, TRIGGER_WEBHOOK)
        .await?;
    Ok(Json(InvoiceResponse {
        success: true,
        outcome,
    }))
}

/// `POST /automation/check-expiry` (operator)
pub async fn operator_check_expiry<TR, CR, PR, IR, RD, NR, M, AR, C>(
    State(state): State<AppState<TR, CR, PR, IR, RD, NR, M, AR, C>>,
    headers: HeaderMap,
) -> Result<Json<ScanResponse>, ApiError>
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
    state.auth.verify_operator(&headers)?;
    let report = state
        .scanner
        .scan_expiring(DEFAULT_WINDOW_DAYS, TRIGGER_MANUAL)
        .await?;
    Ok(Json(ScanResponse {
        success: true,
        report,
    }))
}

/// `POST /automation/suspend-expired` (operator)
pub async fn operator_suspend_expired<TR, CR, PR, IR, RD, NR, M, AR, C>(
    State(state): State<AppState<TR, CR, PR, IR, RD, NR, M, AR, C>>,
    headers: HeaderMap,
) -> Result<Json<ScanResponse>, ApiError>
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
    state.auth.verify_operator(&headers)?;
    let report = state.scanner.scan_expired(TRIGGER_MANUAL).await?;
    Ok(Json(ScanResponse {
        success: true,
        report,
    }))
}
