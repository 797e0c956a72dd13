//! Delivery of notifications to recipients.

use async_trait::async_trait;
use std::fmt;
use teloxide::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Identity of a notification recipient (a Telegram chat id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecipientId(pub i64);

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ChatId> for RecipientId {
    fn from(chat_id: ChatId) -> Self {
        RecipientId(chat_id.0)
    }
}

impl From<RecipientId> for ChatId {
    fn from(recipient: RecipientId) -> Self {
        ChatId(recipient.0)
    }
}

/// Transport that delivers plain text to a recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, recipient: RecipientId, text: &str) -> Result<(), NotifyError>;
}

/// Send one message per non-empty notification, in order.
///
/// A failed send is logged and the remaining notifications are still
/// attempted. Returns the number of messages delivered.
pub async fn deliver(
    notifier: &dyn Notifier,
    recipient: RecipientId,
    notifications: &[String],
) -> usize {
    let mut delivered = 0;
    for text in notifications.iter().filter(|text| !text.is_empty()) {
        match notifier.send_text(recipient, text).await {
            Ok(()) => delivered += 1,
            Err(e) => warn!(recipient = %recipient, error = %e, "Failed to deliver notification"),
        }
    }
    debug!(recipient = %recipient, delivered, "Delivered notifications");
    delivered
}

/// Notifier that sends Telegram messages.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, recipient: RecipientId, text: &str) -> Result<(), NotifyError> {
        self.bot
            .send_message(ChatId::from(recipient), text.to_string())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Records sends; fails any text containing "fail".
    #[derive(Default)]
    struct FlakyNotifier {
        sent: Mutex<Vec<(RecipientId, String)>>,
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn send_text(&self, recipient: RecipientId, text: &str) -> Result<(), NotifyError> {
            if text.contains("fail") {
                return Err(NotifyError::Delivery("rejected".into()));
            }
            self.sent.lock().unwrap().push((recipient, text.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_deliver_one_message_per_notification() {
        let notifier = FlakyNotifier::default();
        let notifications = vec!["first".to_string(), "second".to_string()];
        let delivered = deliver(&notifier, RecipientId(7), &notifications).await;

        assert_eq!(delivered, 2);
        assert_eq!(
            *notifier.sent.lock().unwrap(),
            vec![
                (RecipientId(7), "first".to_string()),
                (RecipientId(7), "second".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_deliver_skips_empty_text() {
        let notifier = FlakyNotifier::default();
        let delivered = deliver(&notifier, RecipientId(1), &[String::new()]).await;
        assert_eq!(delivered, 0);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deliver_continues_after_failure() {
        let notifier = FlakyNotifier::default();
        let notifications = vec!["fail me".to_string(), "ok".to_string()];
        let delivered = deliver(&notifier, RecipientId(1), &notifications).await;
        assert_eq!(delivered, 1);
        assert_eq!(notifier.sent.lock().unwrap()[0].1, "ok");
    }

    #[test]
    fn test_recipient_chat_id_conversion() {
        let recipient = RecipientId::from(ChatId(-100123));
        assert_eq!(recipient, RecipientId(-100123));
        assert_eq!(ChatId::from(recipient), ChatId(-100123));
        assert_eq!(recipient.to_string(), "-100123");
    }
}
