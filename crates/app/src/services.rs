//! Application services — the lifecycle use-cases.

pub mod audit_log;
pub mod dispatcher;
pub mod invoice_generator;
pub mod lifecycle_scanner;
pub mod transition_engine;
