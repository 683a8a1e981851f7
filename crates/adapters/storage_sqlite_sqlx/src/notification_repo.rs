//! `SQLite` implementation of [`NotificationRepository`]. Rows are queued
//! here for an out-of-scope delivery surface; this subsystem only inserts.

use sqlx::SqlitePool;

use billhub_app::ports::NotificationRepository;
use billhub_domain::error::BillHubError;
use billhub_domain::notification::Notification;

use crate::convert::encode_ts;
use crate::error::StorageError;

const INSERT: &str = r"
    INSERT INTO notifications (id, tenant_id, customer_id, invoice_id, title, message, channel, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

/// `SQLite`-backed notification repository.
pub struct SqliteNotificationRepository {
    pool: SqlitePool,
}

impl SqliteNotificationRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl NotificationRepository for SqliteNotificationRepository {
    async fn insert(&self, notification: Notification) -> Result<Notification, BillHubError> {
        sqlx::query(INSERT)
            .bind(notification.id.to_string())
            .bind(notification.tenant_id.map(|id| id.to_string()))
            .bind(notification.customer_id.map(|id| id.to_string()))
            .bind(notification.invoice_id.map(|id| id.to_string()))
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.channel.as_str())
            .bind(encode_ts(notification.created_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(notification)
    }
}
