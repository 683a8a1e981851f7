//! `SQLite` implementation of [`TenantRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use billhub_app::ports::TenantRepository;
use billhub_domain::error::BillHubError;
use billhub_domain::id::TenantId;
use billhub_domain::tenant::Tenant;
use billhub_domain::time::Timestamp;

use crate::convert::{decode_id, decode_kind, decode_opt_id, decode_opt_ts, encode_ts};
use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Tenant);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Tenant> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let email: String = row.try_get("email")?;
        let status: String = row.try_get("status")?;
        let subscription_start: Option<String> = row.try_get("subscription_start")?;
        let subscription_end: Option<String> = row.try_get("subscription_end")?;
        let package_id: Option<String> = row.try_get("package_id")?;

        Ok(Self(Tenant {
            id: decode_id(&id)?,
            name,
            email,
            status: decode_kind(&status)?,
            subscription_start: decode_opt_ts(subscription_start)?,
            subscription_end: decode_opt_ts(subscription_end)?,
            package_id: decode_opt_id(package_id)?,
        }))
    }
}

const SELECT_BY_ID: &str = "SELECT * FROM tenants WHERE id = ?";

const FIND_EXPIRING: &str = r"
    SELECT * FROM tenants
    WHERE status = 'active'
      AND subscription_end IS NOT NULL
      AND subscription_end >= ?
      AND subscription_end <= ?
    ORDER BY name
";

const FIND_EXPIRED: &str = r"
    SELECT * FROM tenants
    WHERE status = 'active'
      AND subscription_end IS NOT NULL
      AND subscription_end < ?
    ORDER BY name
";

const UPDATE: &str = r"
    UPDATE tenants
    SET name = ?, email = ?, status = ?, subscription_start = ?,
        subscription_end = ?, package_id = ?
    WHERE id = ?
";

/// `SQLite`-backed tenant repository.
pub struct SqliteTenantRepository {
    pool: SqlitePool,
}

impl SqliteTenantRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TenantRepository for SqliteTenantRepository {
    async fn get_by_id(&self, id: TenantId) -> Result<Option<Tenant>, BillHubError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn find_expiring(
        &self,
        from: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<Tenant>, BillHubError> {
        let rows: Vec<Wrapper> = sqlx::query_as(FIND_EXPIRING)
            .bind(encode_ts(from))
            .bind(encode_ts(until))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find_expired(&self, before: Timestamp) -> Result<Vec<Tenant>, BillHubError> {
        let rows: Vec<Wrapper> = sqlx::query_as(FIND_EXPIRED)
            .bind(encode_ts(before))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, tenant: Tenant) -> Result<Tenant, BillHubError> {
        sqlx::query(UPDATE)
            .bind(&tenant.name)
            .bind(&tenant.email)
            .bind(tenant.status.as_str())
            .bind(tenant.subscription_start.map(encode_ts))
            .bind(tenant.subscription_end.map(encode_ts))
            .bind(tenant.package_id.map(|id| id.to_string()))
            .bind(tenant.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(tenant)
    }
}
