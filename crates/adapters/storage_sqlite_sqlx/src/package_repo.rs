//! `SQLite` implementation of [`PackageRepository`]. Packages are reference
//! data; this subsystem only reads them.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use billhub_app::ports::PackageRepository;
use billhub_domain::error::BillHubError;
use billhub_domain::id::PackageId;
use billhub_domain::package::SubscriptionPackage;

use crate::convert::decode_id;
use crate::error::StorageError;

struct Wrapper(SubscriptionPackage);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let price: f64 = row.try_get("price")?;
        let duration_months: i64 = row.try_get("duration_months")?;

        Ok(Self(SubscriptionPackage {
            id: decode_id(&id)?,
            name,
            price,
            duration_months: u32::try_from(duration_months)
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
        }))
    }
}

const SELECT_BY_ID: &str = "SELECT * FROM packages WHERE id = ?";

/// `SQLite`-backed package repository.
pub struct SqlitePackageRepository {
    pool: SqlitePool,
}

impl SqlitePackageRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl PackageRepository for SqlitePackageRepository {
    async fn get_by_id(&self, id: PackageId) -> Result<Option<SubscriptionPackage>, BillHubError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }
}
