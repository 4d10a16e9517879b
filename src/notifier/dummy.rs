use crate::model::NotifyError;
use crate::notifier::{Message, Notifier};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Prints notifications to stdout instead of sending them.
pub struct DummyNotifier;

impl DummyNotifier {
    pub fn new() -> Self {
        Self
    }
}

/// The two lines printed for a message; the body is base64 so it stays on one line.
pub fn dummy_lines(message: &Message) -> (String, String) {
    (
        format!("DUMMY NOTIFICATION TITLE: {}", message.title),
        format!("DUMMY NOTIFICATION BODY:  {}", STANDARD.encode(message.text.as_bytes())),
    )
}

#[async_trait::async_trait]
impl Notifier for DummyNotifier {
    fn name(&self) -> &'static str {
        "dummy"
    }

    async fn send(&self, message: &Message) -> Result<(), NotifyError> {
        let (title, body) = dummy_lines(message);
        println!("{title}");
        println!("{body}");
        Ok(())
    }
}
