//! `SQLite` implementation of [`InvoiceRepository`].
//!
//! Inserts go through the partial unique index on
//! `(tenant_id, period_end, kind) WHERE customer_id IS NULL`; a constraint
//! hit comes back as [`InsertOutcome::Duplicate`] so callers can reuse the
//! winning row instead of failing.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use billhub_app::ports::{InsertOutcome, InvoiceRepository};
use billhub_domain::error::BillHubError;
use billhub_domain::id::TenantId;
use billhub_domain::invoice::{Invoice, InvoiceKind};
use billhub_domain::time::Timestamp;

use crate::convert::{decode_id, decode_kind, decode_opt_id, decode_ts, encode_ts};
use crate::error::{StorageError, is_unique_violation};

struct Wrapper(Invoice);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Invoice> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let bill_number: String = row.try_get("bill_number")?;
        let tenant_id: String = row.try_get("tenant_id")?;
        let customer_id: Option<String> = row.try_get("customer_id")?;
        let kind: String = row.try_get("kind")?;
        let amount: f64 = row.try_get("amount")?;
        let status: String = row.try_get("status")?;
        let period_start: String = row.try_get("period_start")?;
        let period_end: String = row.try_get("period_end")?;
        let due_date: String = row.try_get("due_date")?;
        let note: String = row.try_get("note")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(Invoice {
            id: decode_id(&id)?,
            bill_number,
            tenant_id: decode_id(&tenant_id)?,
            customer_id: decode_opt_id(customer_id)?,
            kind: decode_kind(&kind)?,
            amount,
            status: decode_kind(&status)?,
            period_start: decode_ts(&period_start)?,
            period_end: decode_ts(&period_end)?,
            due_date: decode_ts(&due_date)?,
            note,
            created_at: decode_ts(&created_at)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO invoices (id, bill_number, tenant_id, customer_id, kind, amount, status,
                          period_start, period_end, due_date, note, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const FIND_TENANT_INVOICE: &str = r"
    SELECT * FROM invoices
    WHERE tenant_id = ? AND kind = ? AND period_end = ? AND customer_id IS NULL
";

/// `SQLite`-backed invoice repository. Insert-only.
pub struct SqliteInvoiceRepository {
    pool: SqlitePool,
}

impl SqliteInvoiceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl InvoiceRepository for SqliteInvoiceRepository {
    async fn insert(&self, invoice: Invoice) -> Result<InsertOutcome, BillHubError> {
        let result = sqlx::query(INSERT)
            .bind(invoice.id.to_string())
            .bind(&invoice.bill_number)
            .bind(invoice.tenant_id.to_string())
            .bind(invoice.customer_id.map(|id| id.to_string()))
            .bind(invoice.kind.as_str())
            .bind(invoice.amount)
            .bind(invoice.status.as_str())
            .bind(encode_ts(invoice.period_start))
            .bind(encode_ts(invoice.period_end))
            .bind(encode_ts(invoice.due_date))
            .bind(&invoice.note)
            .bind(encode_ts(invoice.created_at))
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted(invoice)),
            Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Duplicate),
            Err(err) => Err(StorageError::from(err).into()),
        }
    }

    async fn find_tenant_invoice(
        &self,
        tenant_id: TenantId,
        kind: InvoiceKind,
        period_end: Timestamp,
    ) -> Result<Option<Invoice>, BillHubError> {
        let row: Option<Wrapper> = sqlx::query_as(FIND_TENANT_INVOICE)
            .bind(tenant_id.to_string())
            .bind(kind.as_str())
            .bind(encode_ts(period_end))
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }
}
