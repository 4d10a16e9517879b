use crate::model::NotifyError;
use crate::notifier::{Message, Notifier};
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

const DESCRIPTION_LIMIT: usize = 4096;
const EMBED_COLOR: u32 = 0xD50C2D;

#[derive(Debug, Serialize)]
pub struct DiscordField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Serialize)]
pub struct DiscordEmbed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: u32,
    pub timestamp: String,
    pub fields: Vec<DiscordField>,
}

/// Discord webhook message payload
#[derive(Debug, Serialize)]
pub struct DiscordMessage {
    pub embeds: Vec<DiscordEmbed>,
}

impl DiscordMessage {
    pub fn from_message(message: &Message) -> Self {
        let embed = DiscordEmbed {
            title: message.title.clone(),
            description: message.text.chars().take(DESCRIPTION_LIMIT).collect(),
            url: message.url.clone(),
            color: EMBED_COLOR,
            timestamp: Utc::now().to_rfc3339(),
            fields: message
                .fields
                .iter()
                .map(|(name, value)| DiscordField {
                    name: name.clone(),
                    value: value.clone(),
                    inline: true,
                })
                .collect(),
        };
        Self { embeds: vec![embed] }
    }
}

/// Posts notifications to a Discord webhook.
pub struct DiscordNotifier {
    webhook_url: String,
    client: Client,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::ApiError(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { webhook_url, client })
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn send(&self, message: &Message) -> Result<(), NotifyError> {
        let payload = DiscordMessage::from_message(message);
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::ApiError(format!("Send failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown".into());
            warn!("❌ Discord webhook responded [{}]: {}", status, body);
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        info!("✅ Discord webhook accepted #{}", message.offer_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_from_message() {
        let message = Message {
            offer_id: 3,
            title: "Hetzner server #3".into(),
            url: "https://www.hetzner.com/sb/#search=3".into(),
            html: String::new(),
            text: "y".repeat(DESCRIPTION_LIMIT + 10),
            fields: vec![("Price".into(), "10.00€".into())],
        };
        let payload = DiscordMessage::from_message(&message);
        let embed = &payload.embeds[0];
        assert_eq!(embed.title, "Hetzner server #3");
        assert_eq!(embed.description.chars().count(), DESCRIPTION_LIMIT);
        assert_eq!(embed.fields.len(), 1);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["embeds"][0]["fields"][0]["name"], "Price");
        assert_eq!(json["embeds"][0]["url"], "https://www.hetzner.com/sb/#search=3");
    }
}
