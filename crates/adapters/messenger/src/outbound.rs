//! [`Messenger`] implementations: SMTP + SMS gateway, and a no-op fallback
//! for deployments without outbound delivery configured.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use billhub_app::ports::{BoxError, Messenger};

use crate::error::DeliveryError;

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    /// Sender shown on outgoing mail, e.g. `BillHub <noreply@billhub.test>`.
    pub from: String,
}

/// SMS gateway settings. The gateway accepts `POST { "to", "body" }`.
#[derive(Debug, Clone)]
pub struct SmsGatewayConfig {
    pub url: String,
}

struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

struct SmsGateway {
    client: reqwest::Client,
    url: String,
}

/// Outbound messenger with independently optional email and SMS channels.
pub struct OutboundMessenger {
    mailer: Option<SmtpMailer>,
    sms: Option<SmsGateway>,
}

impl OutboundMessenger {
    /// Assemble the messenger from whatever channels are configured.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the SMTP relay or sender address is
    /// invalid.
    pub fn new(
        smtp: Option<SmtpConfig>,
        sms: Option<SmsGatewayConfig>,
    ) -> Result<Self, DeliveryError> {
        let mailer = smtp
            .map(|config| {
                let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
                    .credentials(Credentials::new(config.username, config.password))
                    .build();
                let from: Mailbox = config.from.parse()?;
                Ok::<_, DeliveryError>(SmtpMailer { transport, from })
            })
            .transpose()?;
        let sms = sms.map(|config| SmsGateway {
            client: reqwest::Client::new(),
            url: config.url,
        });
        Ok(Self { mailer, sms })
    }

    async fn deliver_email(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let mailer = self
            .mailer
            .as_ref()
            .ok_or(DeliveryError::NotConfigured("email"))?;
        let message = Message::builder()
            .from(mailer.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;
        mailer.transport.send(message).await?;
        Ok(())
    }

    async fn deliver_sms(&self, to: &str, body: &str) -> Result<(), DeliveryError> {
        let gateway = self
            .sms
            .as_ref()
            .ok_or(DeliveryError::NotConfigured("sms"))?;
        let response = gateway
            .client
            .post(&gateway.url)
            .json(&serde_json::json!({ "to": to, "body": body }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(DeliveryError::GatewayRejected {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

impl Messenger for OutboundMessenger {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), BoxError> {
        self.deliver_email(to, subject, body).await?;
        tracing::debug!(to = %to, subject = %subject, "email sent");
        Ok(())
    }

    async fn send_sms(&self, to: &str, body: &str) -> Result<(), BoxError> {
        self.deliver_sms(to, body).await?;
        tracing::debug!(to = %to, "sms sent");
        Ok(())
    }
}

/// Messenger that records nothing and delivers nothing. Used when no
/// outbound channel is configured; in-app notifications still work.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMessenger;

impl Messenger for NoopMessenger {
    async fn send_email(&self, to: &str, subject: &str, _body: &str) -> Result<(), BoxError> {
        tracing::debug!(to = %to, subject = %subject, "email delivery disabled, dropping message");
        Ok(())
    }

    async fn send_sms(&self, to: &str, _body: &str) -> Result<(), BoxError> {
        tracing::debug!(to = %to, "sms delivery disabled, dropping message");
        Ok(())
    }
}

/// Runtime choice between [`OutboundMessenger`] and [`NoopMessenger`], so
/// the composition root keeps a single concrete messenger type.
pub enum ConfiguredMessenger {
    Outbound(OutboundMessenger),
    Noop(NoopMessenger),
}

impl ConfiguredMessenger {
    /// Build the outbound messenger when any channel is configured,
    /// the no-op one otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the SMTP relay or sender address is
    /// invalid.
    pub fn from_channels(
        smtp: Option<SmtpConfig>,
        sms: Option<SmsGatewayConfig>,
    ) -> Result<Self, DeliveryError> {
        if smtp.is_none() && sms.is_none() {
            Ok(Self::Noop(NoopMessenger))
        } else {
            Ok(Self::Outbound(OutboundMessenger::new(smtp, sms)?))
        }
    }
}

impl Messenger for ConfiguredMessenger {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), BoxError> {
        match self {
            Self::Outbound(messenger) => messenger.send_email(to, subject, body).await,
            Self::Noop(messenger) => messenger.send_email(to, subject, body).await,
        }
    }

    async fn send_sms(&self, to: &str, body: &str) -> Result<(), BoxError> {
        match self {
            Self::Outbound(messenger) => messenger.send_sms(to, body).await,
            Self::Noop(messenger) => messenger.send_sms(to, body).await,
        }
    }
}
