//! Messenger port — outbound email and SMS delivery.
//!
//! Delivery is best-effort: send failures are captured per channel by the
//! dispatcher and never roll back a committed state mutation or invoice.

use std::future::Future;
use std::sync::Arc;

use super::BoxError;

/// Sends messages to the outside world.
pub trait Messenger {
    /// Send an email.
    fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;

    /// Send an SMS.
    fn send_sms(&self, to: &str, body: &str) -> impl Future<Output = Result<(), BoxError>> + Send;
}

impl<T: Messenger + Send + Sync> Messenger for Arc<T> {
    fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), BoxError>> + Send {
        (**self).send_email(to, subject, body)
    }

    fn send_sms(&self, to: &str, body: &str) -> impl Future<Output = Result<(), BoxError>> + Send {
        (**self).send_sms(to, body)
    }
}
