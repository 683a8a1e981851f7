//! Delivery-specific error type.

/// Errors originating from outbound email/SMS delivery.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// A recipient or sender address failed to parse.
    #[error("invalid address")]
    Address(#[from] lettre::address::AddressError),

    /// The message could not be assembled.
    #[error("message build error")]
    Message(#[from] lettre::error::Error),

    /// The SMTP transport failed.
    #[error("smtp error")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// The SMS gateway request failed.
    #[error("sms gateway error")]
    Http(#[from] reqwest::Error),

    /// The SMS gateway answered with a non-success status.
    #[error("sms gateway rejected the message: {status}")]
    GatewayRejected { status: u16 },

    /// The channel has no transport configured.
    #[error("{0} delivery is not configured")]
    NotConfigured(&'static str),
}
