//! # billhub-adapter-messenger
//!
//! Outbound delivery adapter: SMTP email through
//! [lettre](https://docs.rs/lettre) and SMS through a JSON HTTP gateway via
//! [reqwest](https://docs.rs/reqwest).
//!
//! Delivery is best-effort from the application's point of view; callers
//! treat a returned error as a warning, never a rollback.

pub mod error;
pub mod outbound;

pub use error::DeliveryError;
pub use outbound::{
    ConfiguredMessenger, NoopMessenger, OutboundMessenger, SmsGatewayConfig, SmtpConfig,
};
