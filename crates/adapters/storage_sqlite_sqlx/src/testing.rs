//! Shared test helpers: in-memory pools and row seeding.

use sqlx::SqlitePool;

use billhub_domain::customer::Customer;
use billhub_domain::package::SubscriptionPackage;
use billhub_domain::tenant::Tenant;

use crate::convert::encode_ts;
use crate::pool::Config;

pub(crate) async fn memory_pool() -> SqlitePool {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .unwrap();
    db.pool().clone()
}

pub(crate) async fn seed_package(pool: &SqlitePool, package: &SubscriptionPackage) {
    sqlx::query("INSERT INTO packages (id, name, price, duration_months) VALUES (?, ?, ?, ?)")
        .bind(package.id.to_string())
        .bind(&package.name)
        .bind(package.price)
        .bind(i64::from(package.duration_months))
        .execute(pool)
        .await
        .unwrap();
}

pub(crate) async fn seed_tenant(pool: &SqlitePool, tenant: &Tenant) {
    sqlx::query(
        "INSERT INTO tenants (id, name, email, status, subscription_start, subscription_end, package_id)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(tenant.id.to_string())
    .bind(&tenant.name)
    .bind(&tenant.email)
    .bind(tenant.status.as_str())
    .bind(tenant.subscription_start.map(encode_ts))
    .bind(tenant.subscription_end.map(encode_ts))
    .bind(tenant.package_id.map(|id| id.to_string()))
    .execute(pool)
    .await
    .unwrap();
}

pub(crate) async fn seed_customer(pool: &SqlitePool, customer: &Customer) {
    sqlx::query(
        "INSERT INTO customers (id, tenant_id, name, email, phone, package_id)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(customer.id.to_string())
    .bind(customer.tenant_id.to_string())
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(customer.phone.clone())
    .bind(customer.package_id.map(|id| id.to_string()))
    .execute(pool)
    .await
    .unwrap();
}
