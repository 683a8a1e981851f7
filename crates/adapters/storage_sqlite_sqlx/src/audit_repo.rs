//! `SQLite` implementation of [`AuditLogRepository`].
//!
//! Append-only: this module contains no UPDATE or DELETE statement for
//! `automation_log`, and the port trait exposes none.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use billhub_app::ports::{AuditFilter, AuditLogRepository, AuditPage};
use billhub_domain::audit::{AuditEntry, AutomationKind};
use billhub_domain::error::BillHubError;
use billhub_domain::id::TenantId;
use billhub_domain::time::Timestamp;

use crate::convert::{decode_id, decode_kind, decode_opt_id, decode_ts, encode_ts};
use crate::error::StorageError;

struct Wrapper(AuditEntry);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let kind: String = row.try_get("kind")?;
        let tenant_id: Option<String> = row.try_get("tenant_id")?;
        let customer_id: Option<String> = row.try_get("customer_id")?;
        let invoice_id: Option<String> = row.try_get("invoice_id")?;
        let status: String = row.try_get("status")?;
        let message: String = row.try_get("message")?;
        let triggered_by: String = row.try_get("triggered_by")?;
        let metadata: String = row.try_get("metadata")?;
        let created_at: String = row.try_get("created_at")?;

        let metadata: serde_json::Value =
            serde_json::from_str(&metadata).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(AuditEntry {
            id: decode_id(&id)?,
            kind: decode_kind(&kind)?,
            tenant_id: decode_opt_id(tenant_id)?,
            customer_id: decode_opt_id(customer_id)?,
            invoice_id: decode_opt_id(invoice_id)?,
            status: decode_kind(&status)?,
            message,
            triggered_by,
            metadata,
            created_at: decode_ts(&created_at)?,
        }))
    }
}

const APPEND: &str = r"
    INSERT INTO automation_log (id, kind, tenant_id, customer_id, invoice_id, status,
                                message, triggered_by, metadata, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const EXISTS_SUCCESS_BETWEEN: &str = r"
    SELECT COUNT(*) FROM automation_log
    WHERE kind = ? AND tenant_id = ? AND status = 'success'
      AND created_at >= ? AND created_at <= ?
";

/// `SQLite`-backed automation log.
pub struct SqliteAuditLogRepository {
    pool: SqlitePool,
}

impl SqliteAuditLogRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn filter_clause(filter: &AuditFilter) -> String {
        let mut conditions = Vec::new();
        if filter.kind.is_some() {
            conditions.push("kind = ?");
        }
        if filter.status.is_some() {
            conditions.push("status = ?");
        }
        if filter.tenant_id.is_some() {
            conditions.push("tenant_id = ?");
        }
        if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        }
    }
}

impl AuditLogRepository for SqliteAuditLogRepository {
    async fn append(&self, entry: AuditEntry) -> Result<AuditEntry, BillHubError> {
        let metadata = serde_json::to_string(&entry.metadata).map_err(StorageError::from)?;

        sqlx::query(APPEND)
            .bind(entry.id.to_string())
            .bind(entry.kind.as_str())
            .bind(entry.tenant_id.map(|id| id.to_string()))
            .bind(entry.customer_id.map(|id| id.to_string()))
            .bind(entry.invoice_id.map(|id| id.to_string()))
            .bind(entry.status.as_str())
            .bind(&entry.message)
            .bind(&entry.triggered_by)
            .bind(&metadata)
            .bind(encode_ts(entry.created_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(entry)
    }

    async fn exists_success_between(
        &self,
        kind: AutomationKind,
        tenant_id: TenantId,
        from: Timestamp,
        until: Timestamp,
    ) -> Result<bool, BillHubError> {
        let count: i64 = sqlx::query_scalar(EXISTS_SUCCESS_BETWEEN)
            .bind(kind.as_str())
            .bind(tenant_id.to_string())
            .bind(encode_ts(from))
            .bind(encode_ts(until))
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(count > 0)
    }

    async fn find_page(
        &self,
        filter: AuditFilter,
        page: u64,
        per_page: u64,
    ) -> Result<AuditPage, BillHubError> {
        let clause = Self::filter_clause(&filter);

        let count_sql = format!("SELECT COUNT(*) FROM automation_log{clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(kind) = filter.kind {
            count_query = count_query.bind(kind.as_str());
        }
        if let Some(status) = filter.status {
            count_query = count_query.bind(status.as_str());
        }
        if let Some(tenant_id) = filter.tenant_id {
            count_query = count_query.bind(tenant_id.to_string());
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let offset = page.saturating_sub(1).saturating_mul(per_page);
        let select_sql = format!(
            "SELECT * FROM automation_log{clause} ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
        let mut select_query = sqlx::query_as::<_, Wrapper>(&select_sql);
        if let Some(kind) = filter.kind {
            select_query = select_query.bind(kind.as_str());
        }
        if let Some(status) = filter.status {
            select_query = select_query.bind(status.as_str());
        }
        if let Some(tenant_id) = filter.tenant_id {
            select_query = select_query.bind(tenant_id.to_string());
        }
        let rows = select_query
            .bind(i64::try_from(per_page).unwrap_or(i64::MAX))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(AuditPage {
            entries: rows.into_iter().map(|w| w.0).collect(),
            total: u64::try_from(total).unwrap_or(0),
        })
    }
}
