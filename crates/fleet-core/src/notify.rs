//! Outbound notification surface.
//!
//! The engine never talks to a transport directly; it asks a
//! [`Notifier`] to deliver text, media, or menus. Real shells
//! (Telegram, Signal, tests) implement this trait out of crate.

use async_trait::async_trait;
use thiserror::Error;

use crate::event::MediaKind;

/// Errors that can occur while delivering an outbound message.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The transport refused or failed the delivery.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// The recipient is unknown to the transport.
    #[error("unknown recipient: {0}")]
    UnknownRecipient(String),
}

/// Trait for delivering messages to chat users.
///
/// All deliveries are best-effort from the engine's point of view:
/// durable state is committed before any notification is attempted.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), NotifyError>;

    /// Send a single photo or video with an optional caption.
    async fn send_media(
        &self,
        recipient: &str,
        file_ref: &str,
        kind: MediaKind,
        caption: Option<&str>,
    ) -> Result<(), NotifyError>;

    /// Send a voice note with an optional caption.
    async fn send_voice(
        &self,
        recipient: &str,
        file_ref: &str,
        caption: Option<&str>,
    ) -> Result<(), NotifyError>;

    /// Send several media items as one logical group, caption on the
    /// first item.
    ///
    /// Default implementation delivers the items one by one for
    /// transports without native album support.
    async fn send_media_group(
        &self,
        recipient: &str,
        items: &[(MediaKind, String)],
        caption: Option<&str>,
    ) -> Result<(), NotifyError> {
        for (i, (kind, file_ref)) in items.iter().enumerate() {
            let item_caption = if i == 0 { caption } else { None };
            self.send_media(recipient, file_ref, *kind, item_caption)
                .await?;
        }
        Ok(())
    }

    /// Render a menu: a prompt plus a row of option labels.
    ///
    /// Default implementation flattens the menu into numbered text for
    /// transports without keyboards.
    async fn render_menu(
        &self,
        recipient: &str,
        prompt: &str,
        options: &[String],
    ) -> Result<(), NotifyError> {
        let mut text = prompt.to_string();
        for (i, option) in options.iter().enumerate() {
            text.push_str(&format!("\n{}. {}", i + 1, option));
        }
        self.send_text(recipient, &text).await
    }
}

/// A no-op notifier for testing that discards all deliveries.
#[derive(Debug, Clone, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn send_text(&self, _recipient: &str, _text: &str) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn send_media(
        &self,
        _recipient: &str,
        _file_ref: &str,
        _kind: MediaKind,
        _caption: Option<&str>,
    ) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn send_voice(
        &self,
        _recipient: &str,
        _file_ref: &str,
        _caption: Option<&str>,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// A logging notifier for debugging that logs all deliveries.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), NotifyError> {
        tracing::info!("[text] to {}: {}", recipient, text);
        Ok(())
    }

    async fn send_media(
        &self,
        recipient: &str,
        file_ref: &str,
        kind: MediaKind,
        caption: Option<&str>,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            "[{}] to {}: {} (caption: {:?})",
            kind.as_str(),
            recipient,
            file_ref,
            caption
        );
        Ok(())
    }

    async fn send_voice(
        &self,
        recipient: &str,
        file_ref: &str,
        caption: Option<&str>,
    ) -> Result<(), NotifyError> {
        tracing::info!("[voice] to {}: {} (caption: {:?})", recipient, file_ref, caption);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_notifier() {
        let notifier = NoOpNotifier;

        notifier.send_text("d1", "hello").await.unwrap();
        notifier
            .send_media("d1", "f1", MediaKind::Photo, Some("cap"))
            .await
            .unwrap();
        notifier.send_voice("d1", "v1", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_default_media_group_delivers_all_items() {
        let notifier = LoggingNotifier;
        let items = vec![
            (MediaKind::Photo, "f1".to_string()),
            (MediaKind::Video, "f2".to_string()),
        ];

        notifier
            .send_media_group("d1", &items, Some("two proofs"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_default_menu_renders_as_text() {
        let notifier = NoOpNotifier;
        let options = vec!["Task done".to_string(), "Skip task".to_string()];

        notifier.render_menu("d1", "Pick one:", &options).await.unwrap();
    }
}
