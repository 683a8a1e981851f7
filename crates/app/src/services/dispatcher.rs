//! Notification dispatcher — fan-out to in-app records and outbound
//! email/SMS with independent per-channel outcomes.
//!
//! A failure in one channel never suppresses another channel's attempt, and
//! never rolls back the caller's primary side effect. The in-app row is the
//! one channel whose failure makes the dispatch count as failed; outbound
//! delivery is best-effort.

use billhub_domain::id::{CustomerId, InvoiceId, NotificationId, TenantId};
use billhub_domain::notification::{Channel, Notification};
use billhub_domain::time::Timestamp;

use crate::ports::{Messenger, NotificationRepository};

/// A message to fan out.
#[derive(Debug, Clone)]
pub struct Outgoing {
    /// `None` for platform-level (operator) notices.
    pub tenant_id: Option<TenantId>,
    pub customer_id: Option<CustomerId>,
    pub invoice_id: Option<InvoiceId>,
    pub title: String,
    pub message: String,
    pub channel: Channel,
    /// Email recipient; skipped when absent even if the channel wants email.
    pub email_to: Option<String>,
    /// SMS recipient; SMS is attempted whenever present.
    pub sms_to: Option<String>,
}

impl Outgoing {
    /// An in-app-only notice without external recipients.
    #[must_use]
    pub fn in_app(tenant_id: Option<TenantId>, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tenant_id,
            customer_id: None,
            invoice_id: None,
            title: title.into(),
            message: message.into(),
            channel: Channel::InApp,
            email_to: None,
            sms_to: None,
        }
    }
}

/// Per-channel results of one dispatch. `None` means the channel was not
/// attempted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOutcome {
    pub stored: Option<bool>,
    pub email_sent: Option<bool>,
    pub sms_sent: Option<bool>,
}

impl DispatchOutcome {
    /// The dispatch counts as successful unless the in-app store was
    /// attempted and failed. Outbound channels are best-effort.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.stored != Some(false)
    }
}

/// Fans one message out to its channels.
pub struct NotificationDispatcher<NR, M> {
    notifications: NR,
    messenger: M,
}

impl<NR, M> NotificationDispatcher<NR, M>
where
    NR: NotificationRepository,
    M: Messenger,
{
    /// Create a new dispatcher.
    pub fn new(notifications: NR, messenger: M) -> Self {
        Self {
            notifications,
            messenger,
        }
    }

    /// Attempt every requested channel and report each outcome.
    #[tracing::instrument(skip(self, outgoing), fields(title = %outgoing.title))]
    pub async fn dispatch(&self, outgoing: Outgoing, at: Timestamp) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        if outgoing.channel.wants_in_app() {
            let notification = Notification {
                id: NotificationId::new(),
                tenant_id: outgoing.tenant_id,
                customer_id: outgoing.customer_id,
                invoice_id: outgoing.invoice_id,
                title: outgoing.title.clone(),
                message: outgoing.message.clone(),
                channel: outgoing.channel,
                created_at: at,
            };
            outcome.stored = match self.notifications.insert(notification).await {
                Ok(_) => Some(true),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to store in-app notification");
                    Some(false)
                }
            };
        }

        if outgoing.channel.wants_email() {
            if let Some(to) = &outgoing.email_to {
                outcome.email_sent = match self
                    .messenger
                    .send_email(to, &outgoing.title, &outgoing.message)
                    .await
                {
                    Ok(()) => Some(true),
                    Err(err) => {
                        tracing::warn!(to = %to, error = %err, "failed to send email");
                        Some(false)
                    }
                };
            }
        }

        if let Some(to) = &outgoing.sms_to {
            outcome.sms_sent = match self.messenger.send_sms(to, &outgoing.message).await {
                Ok(()) => Some(true),
                Err(err) => {
                    tracing::warn!(to = %to, error = %err, "failed to send sms");
                    Some(false)
                }
            };
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryNotifications, RecordingMessenger};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn both_channels(tenant_id: TenantId) -> Outgoing {
        Outgoing {
            tenant_id: Some(tenant_id),
            customer_id: None,
            invoice_id: None,
            title: "Subscription Expiring Soon".to_string(),
            message: "renew please".to_string(),
            channel: Channel::Both,
            email_to: Some("admin@acme.test".to_string()),
            sms_to: None,
        }
    }

    #[tokio::test]
    async fn should_store_row_and_send_email_for_both_channel() {
        let notifications = Arc::new(InMemoryNotifications::default());
        let messenger = Arc::new(RecordingMessenger::default());
        let dispatcher =
            NotificationDispatcher::new(Arc::clone(&notifications), Arc::clone(&messenger));

        let outcome = dispatcher
            .dispatch(both_channels(TenantId::new()), now())
            .await;

        assert_eq!(outcome.stored, Some(true));
        assert_eq!(outcome.email_sent, Some(true));
        assert!(outcome.succeeded());
        assert_eq!(notifications.all().len(), 1);
        assert_eq!(messenger.emails.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_still_store_row_when_email_fails() {
        let notifications = Arc::new(InMemoryNotifications::default());
        let messenger = Arc::new(RecordingMessenger::default());
        messenger.fail_emails();
        let dispatcher =
            NotificationDispatcher::new(Arc::clone(&notifications), Arc::clone(&messenger));

        let outcome = dispatcher
            .dispatch(both_channels(TenantId::new()), now())
            .await;

        assert_eq!(outcome.stored, Some(true));
        assert_eq!(outcome.email_sent, Some(false));
        // Email is best-effort; the dispatch still counts as successful.
        assert!(outcome.succeeded());
        assert_eq!(notifications.all().len(), 1);
    }

    #[tokio::test]
    async fn should_still_attempt_email_when_store_fails() {
        let notifications = Arc::new(InMemoryNotifications::default());
        let messenger = Arc::new(RecordingMessenger::default());
        let tenant_id = TenantId::new();
        notifications.fail_for_tenant(tenant_id);
        let dispatcher =
            NotificationDispatcher::new(Arc::clone(&notifications), Arc::clone(&messenger));

        let outcome = dispatcher.dispatch(both_channels(tenant_id), now()).await;

        assert_eq!(outcome.stored, Some(false));
        assert_eq!(outcome.email_sent, Some(true));
        assert!(!outcome.succeeded());
        assert_eq!(messenger.emails.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_skip_email_for_in_app_channel() {
        let notifications = Arc::new(InMemoryNotifications::default());
        let messenger = Arc::new(RecordingMessenger::default());
        let dispatcher =
            NotificationDispatcher::new(Arc::clone(&notifications), Arc::clone(&messenger));

        let outcome = dispatcher
            .dispatch(Outgoing::in_app(None, "Operator notice", "hello"), now())
            .await;

        assert_eq!(outcome.stored, Some(true));
        assert_eq!(outcome.email_sent, None);
        assert!(messenger.emails.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_send_sms_when_recipient_present() {
        let notifications = Arc::new(InMemoryNotifications::default());
        let messenger = Arc::new(RecordingMessenger::default());
        let dispatcher =
            NotificationDispatcher::new(Arc::clone(&notifications), Arc::clone(&messenger));

        let mut outgoing = both_channels(TenantId::new());
        outgoing.sms_to = Some("+15550000001".to_string());
        let outcome = dispatcher.dispatch(outgoing, now()).await;

        assert_eq!(outcome.sms_sent, Some(true));
        assert_eq!(messenger.sms.lock().unwrap().len(), 1);
    }
}
