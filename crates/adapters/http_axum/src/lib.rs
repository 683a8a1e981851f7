//! # billhub-adapter-http-axum
//!
//! HTTP trigger gateway using [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Expose the webhook endpoints the billing platform's schedulers call
//! - Expose operator-only manual triggers and the audit-log viewer
//! - Authenticate triggers (shared secret) and operators (bearer token)
//!   before any engine logic runs
//!
//! ## Dependency rule
//! Depends on `billhub-app` (services and port traits) and
//! `billhub-domain`. The `app` and `domain` crates must never reference
//! this adapter.

pub mod api;
pub mod auth;
pub mod error;
pub mod router;
pub mod state;
