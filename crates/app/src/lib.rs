//! # billhub-app
//!
//! Application layer — lifecycle use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `TenantRepository`, `CustomerRepository`, `PackageRepository` — reads
//!     plus the single tenant mutation path
//!   - `InvoiceRepository` — insert & duplicate lookup
//!   - `NotificationRepository` — insert
//!   - `AuditLogRepository` — append & idempotency/pagination queries
//!   - `Renderer` — invoice document artifacts (failures non-fatal)
//!   - `Messenger` — outbound email/SMS (best-effort)
//!   - `Clock` — injected time source for deterministic tests
//! - Define **driving/inbound ports** as use-case structs:
//!   - `TransitionEngine` — the subscription state machine
//!   - `InvoiceGenerator` — invoice-on-event with duplicate suppression
//!   - `NotificationDispatcher` — channel fan-out with independent outcomes
//!   - `AutomationAuditLog` — append-only attempt ledger
//!   - `LifecycleScanner` — threshold scans with per-tenant isolation
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `billhub-domain` only. Never imports adapter crates.
//! Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod report;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
