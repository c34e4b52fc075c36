use std::time::Duration;

use rand::Rng;

use crate::error::ChatError;

const CANNED_OPENERS: [&str; 10] = [
    "Hello! I'm a mock AI assistant. How can I help you today?",
    "That's an interesting question! Let me think about that...",
    "I understand what you're asking. Here's what I think...",
    "Great question! Based on my knowledge, I would say...",
    "Thanks for sharing that with me. Here's my perspective...",
    "I'm here to help! What would you like to know more about?",
    "That's a fascinating topic. Let me break it down for you...",
    "I appreciate you asking that. Here's what I can tell you...",
    "Interesting point! Let me provide some insights on that...",
    "I'm glad you brought that up. Here's my take on it...",
];

/// Characters of the user's message echoed back in the default reply
const ECHO_CHARS: usize = 50;

/// Offline stand-in for a real provider, answering from canned replies.
#[derive(Debug, Clone)]
pub struct MockClient {
    min_delay: Duration,
    max_delay: Duration,
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClient {
    pub fn new() -> Self {
        Self::with_delay(Duration::from_millis(1000), Duration::from_millis(3000))
    }

    /// Each reply waits a random time between `min` and `max`.
    pub fn with_delay(min: Duration, max: Duration) -> Self {
        Self {
            min_delay: min,
            max_delay: max.max(min),
        }
    }

    pub fn instant() -> Self {
        Self::with_delay(Duration::ZERO, Duration::ZERO)
    }

    pub async fn send_message(&self, text: &str) -> Result<String, ChatError> {
        let delay = self.pick_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(reply_for(text))
    }

    fn pick_delay(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

fn reply_for(text: &str) -> String {
    let lower = text.to_lowercase();

    if lower.contains("hello") || lower.contains("hi") {
        return "Hello! 👋 I'm your AI assistant. How can I help you today?".to_string();
    }
    if lower.contains("how are you") {
        return "I'm doing great, thank you for asking! I'm here and ready to help you with any \
                questions you might have."
            .to_string();
    }
    if lower.contains("weather") {
        return "I'd be happy to help with weather information! However, I'm currently running in \
                mock mode. In a real implementation, I could fetch current weather data for you."
            .to_string();
    }
    if lower.contains("time") {
        return format!(
            "The current time is {}. Is there anything specific you'd like to know about time or \
             scheduling?",
            chrono::Local::now().format("%-I:%M:%S %p")
        );
    }
    if lower.contains("help") {
        return "I'm here to help! I can assist with questions, provide information, or just chat. \
                What would you like to know?"
            .to_string();
    }
    if lower.contains("thank") {
        return "You're very welcome! 😊 I'm glad I could help. Is there anything else you'd like \
                to know?"
            .to_string();
    }

    let opener = CANNED_OPENERS[rand::thread_rng().gen_range(0..CANNED_OPENERS.len())];
    let echo: String = text.chars().take(ECHO_CHARS).collect();
    let ellipsis = if text.chars().count() > ECHO_CHARS { "..." } else { "" };
    format!(
        "{} I noticed you mentioned \"{}{}\". That's a great topic to explore!",
        opener, echo, ellipsis
    )
}
