// Notifier module: message rendering and the providers that deliver it.

pub mod discord;
pub mod dummy;
pub mod message;
pub mod telegram;

pub use discord::DiscordNotifier;
pub use dummy::DummyNotifier;
pub use message::{render, Message};
pub use telegram::TelegramNotifier;

use crate::config::AppConfig;
use crate::model::{ConfigError, NotifyError};

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, message: &Message) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    Dummy,
    Telegram,
    Discord,
}

/// Builds the notifier for `provider`, taking credentials from the config file.
pub fn build_notifier(provider: Provider, config: &AppConfig) -> Result<Box<dyn Notifier>, ConfigError> {
    let notifier: Box<dyn Notifier> = match provider {
        Provider::Dummy => Box::new(DummyNotifier::new()),
        Provider::Telegram => {
            let token = config
                .telegram_bot_token
                .clone()
                .ok_or(ConfigError::MissingSetting("telegram_bot_token"))?;
            let chat_id = config
                .telegram_chat_id
                .ok_or(ConfigError::MissingSetting("telegram_chat_id"))?;
            Box::new(TelegramNotifier::new(token, chat_id).map_err(|e| ConfigError::InvalidValue {
                field: "telegram".into(),
                reason: e.to_string(),
            })?)
        }
        Provider::Discord => {
            let url = config
                .discord_webhook_url
                .clone()
                .ok_or(ConfigError::MissingSetting("discord_webhook_url"))?;
            Box::new(DiscordNotifier::new(url).map_err(|e| ConfigError::InvalidValue {
                field: "discord".into(),
                reason: e.to_string(),
            })?)
        }
    };
    Ok(notifier)
}

#[cfg(test)]
pub mod recording {
    use super::{Message, Notifier};
    use crate::model::NotifyError;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records sent messages; fails for the configured offer ids.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<Message>>,
        pub fail_for: HashSet<u64>,
    }

    impl RecordingNotifier {
        pub fn sent_ids(&self) -> Vec<u64> {
            self.sent.lock().unwrap().iter().map(|m| m.offer_id).collect()
        }
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, message: &Message) -> Result<(), NotifyError> {
            if self.fail_for.contains(&message.offer_id) {
                return Err(NotifyError::Unreachable);
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_dummy_needs_nothing() {
        let notifier = build_notifier(Provider::Dummy, &AppConfig::default()).unwrap();
        assert_eq!(notifier.name(), "dummy");
    }

    #[test]
    fn test_build_telegram_requires_credentials() {
        let err = build_notifier(Provider::Telegram, &AppConfig::default()).err().unwrap();
        assert!(matches!(err, ConfigError::MissingSetting("telegram_bot_token")));

        let config = AppConfig {
            telegram_bot_token: Some("t".into()),
            ..AppConfig::default()
        };
        let err = build_notifier(Provider::Telegram, &config).err().unwrap();
        assert!(matches!(err, ConfigError::MissingSetting("telegram_chat_id")));

        let config = AppConfig {
            telegram_bot_token: Some("t".into()),
            telegram_chat_id: Some(1),
            ..AppConfig::default()
        };
        assert_eq!(build_notifier(Provider::Telegram, &config).unwrap().name(), "telegram");
    }

    #[test]
    fn test_build_discord_requires_webhook() {
        assert!(build_notifier(Provider::Discord, &AppConfig::default()).is_err());
        let config = AppConfig {
            discord_webhook_url: Some("https://discord.com/api/webhooks/1/x".into()),
            ..AppConfig::default()
        };
        assert_eq!(build_notifier(Provider::Discord, &config).unwrap().name(), "discord");
    }
}
