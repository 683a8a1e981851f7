//! # billhub-domain
//!
//! Pure domain model for the billhub subscription lifecycle engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Tenants** (billing-platform customer organizations and their
//!   subscription state)
//! - Define **Subscription packages** (read-only price/duration reference data)
//! - Define **Customers** (a tenant's own end customers)
//! - Define **Invoices** (billing records created by lifecycle events)
//! - Define **Notifications** (queued messages for a delivery surface)
//! - Define **Audit entries** (append-only automation attempt records)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod audit;
pub mod customer;
pub mod invoice;
pub mod notification;
pub mod package;
pub mod tenant;
