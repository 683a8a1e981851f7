//! # billhub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `billhub-app::ports::storage`
//! - Manage the `SQLite` connection pool lifecycle
//! - Run database migrations (sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! The `automation_log` table is append-only by construction: this adapter
//! contains no UPDATE or DELETE statement for it.
//!
//! ## Dependency rule
//! Depends on `billhub-app` (for port traits) and `billhub-domain` (for domain
//! types). The `app` and `domain` crates must never reference this adapter.

pub mod audit_repo;
mod convert;
pub mod customer_repo;
pub mod error;
pub mod invoice_repo;
pub mod notification_repo;
pub mod package_repo;
pub mod pool;
pub mod tenant_repo;

#[cfg(test)]
mod testing;

pub use audit_repo::SqliteAuditLogRepository;
pub use customer_repo::SqliteCustomerRepository;
pub use invoice_repo::SqliteInvoiceRepository;
pub use notification_repo::SqliteNotificationRepository;
pub use package_repo::SqlitePackageRepository;
pub use pool::{Config, Database};
pub use tenant_repo::SqliteTenantRepository;
