//! Read-only audit-log viewing endpoint.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use billhub_app::ports::{
    AuditFilter, AuditLogRepository, Clock, CustomerRepository, InvoiceRepository, Messenger,
    NotificationRepository, PackageRepository, Renderer, TenantRepository,
};
use billhub_domain::audit::AuditEntry;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;

/// Query parameters for `GET /automation/logs`.
#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

#[derive(Serialize)]
pub struct LogsResponse {
    pub logs: Vec<AuditEntry>,
    pub total: u64,
    pub page: u64,
    pub pages: u64,
}

fn build_filter(query: &LogsQuery) -> Result<AuditFilter, ApiError> {
    let mut filter = AuditFilter::default();
    if let Some(raw) = query.kind.as_deref() {
        filter.kind = Some(
            raw.parse()
                .map_err(|err: String| ApiError::BadRequest(err))?,
        );
    }
    if let Some(raw) = query.status.as_deref() {
        filter.status = Some(
            raw.parse()
                .map_err(|err: String| ApiError::BadRequest(err))?,
        );
    }
    if let Some(raw) = query.tenant_id.as_deref() {
        filter.tenant_id = Some(
            raw.parse()
                .map_err(|_| ApiError::BadRequest(format!("malformed tenant_id: {raw}")))?,
        );
    }
    Ok(filter)
}

/// `GET /automation/logs` (operator)
pub async fn list<TR, CR, PR, IR, RD, NR, M, AR, C>(
    State(state): State<AppState<TR, CR, PR, IR, RD, NR, M, AR, C>>,
    headers: HeaderMap,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, ApiError>
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
    let filter = build_filter(&query)?;
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let result = state.audit.find_page(filter, page, per_page).await?;
    let pages = result.total.div_ceil(per_page);
    Ok(Json(LogsResponse {
        logs: result.entries,
        total: result.total,
        page,
        pages,
    }))
}
