// notifier/telegram/sender.rs

use crate::model::NotifyError;
use crate::notifier::Message;
use crate::notifier::telegram::TelegramNotifier;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Telegram rejects messages longer than this.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Form parameters for a message: HTML when it fits, truncated plain text otherwise.
pub fn message_params(chat_id: i64, message: &Message) -> Vec<(&'static str, String)> {
    let mut params = vec![("chat_id", chat_id.to_string())];
    if message.html.chars().count() <= MAX_MESSAGE_CHARS {
        params.push(("text", message.html.clone()));
        params.push(("parse_mode", "HTML".to_string()));
    } else {
        warn!(
            "Message for #{} exceeds {} chars, sending truncated plain text",
            message.offer_id, MAX_MESSAGE_CHARS
        );
        params.push(("text", message.text.chars().take(MAX_MESSAGE_CHARS).collect()));
    }
    params.push(("disable_web_page_preview", "true".to_string()));
    params
}

/// Sends the notification for an offer.
pub async fn send_message(notifier: &TelegramNotifier, message: &Message) -> Result<(), NotifyError> {
    info!("📤 Sending Telegram message for #{}", message.offer_id);
    let params = message_params(notifier.chat_id, message);
    post(notifier, &params).await
}

async fn post(notifier: &TelegramNotifier, params: &[(&str, String)]) -> Result<(), NotifyError> {
    let url = notifier.send_message_url();
    let response = match timeout(
        Duration::from_secs(10),
        notifier.client.post(&url).form(params).send(),
    )
    .await
    {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => {
            warn!("❌ Telegram send() failed: {:?}", e);
            return Err(NotifyError::ApiError(format!("Send failed: {}", e)));
        }
        Err(_) => {
            warn!("⏳ Telegram send() timed out");
            return Err(NotifyError::Unreachable);
        }
    };
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "unknown".into());
    if !status.is_success() {
        warn!("❌ Telegram API responded [{}]: {}", status, body);
        return Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    info!("✅ Telegram response [{}]", status);
    Ok(())
}
