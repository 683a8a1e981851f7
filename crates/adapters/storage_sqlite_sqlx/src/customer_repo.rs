//! `SQLite` implementation of [`CustomerRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use billhub_app::ports::CustomerRepository;
use billhub_domain::customer::Customer;
use billhub_domain::error::BillHubError;
use billhub_domain::id::CustomerId;

use crate::convert::{decode_id, decode_opt_id};
use crate::error::StorageError;

struct Wrapper(Customer);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let tenant_id: String = row.try_get("tenant_id")?;
        let name: String = row.try_get("name")?;
        let email: String = row.try_get("email")?;
        let phone: Option<String> = row.try_get("phone")?;
        let package_id: Option<String> = row.try_get("package_id")?;

        Ok(Self(Customer {
            id: decode_id(&id)?,
            tenant_id: decode_id(&tenant_id)?,
            name,
            email,
            phone,
            package_id: decode_opt_id(package_id)?,
        }))
    }
}

const SELECT_BY_ID: &str = "SELECT * FROM customers WHERE id = ?";

/// `SQLite`-backed customer repository.
pub struct SqliteCustomerRepository {
    pool: SqlitePool,
}

impl SqliteCustomerRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl CustomerRepository for SqliteCustomerRepository {
    async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, BillHubError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{memory_pool, seed_customer, seed_tenant};
    use billhub_domain::tenant::Tenant;

    #[tokio::test]
    async fn should_fetch_customer_by_id() {
        let pool = memory_pool().await;
        let tenant = Tenant::builder()
            .name("Acme")
            .email("admin@acme.test")
            .build()
            .unwrap();
        seed_tenant(&pool, &tenant).await;
        let customer = Customer {
            id: CustomerId::new(),
            tenant_id: tenant.id,
            name: "Jane Customer".to_string(),
            email: "jane@customer.test".to_string(),
            phone: Some("+15550000001".to_string()),
            package_id: None,
        };
        seed_customer(&pool, &customer).await;
        let repo = SqliteCustomerRepository::new(pool);

        let fetched = repo.get_by_id(customer.id).await.unwrap().unwrap();
        assert_eq!(fetched.tenant_id, tenant.id);
        assert_eq!(fetched.name, "Jane Customer");
        assert_eq!(fetched.phone.as_deref(), Some("+15550000001"));
    }

    #[tokio::test]
    async fn should_return_none_when_customer_not_found() {
        let pool = memory_pool().await;
        let repo = SqliteCustomerRepository::new(pool);
        let result = repo.get_by_id(CustomerId::new()).await.unwrap();
        assert!(result.is_none());
    }
}
