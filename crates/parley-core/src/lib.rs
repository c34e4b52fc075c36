pub mod ai;
pub mod config;
pub mod conversation;
pub mod error;
pub mod format;
pub mod provider;
pub mod render;
pub mod reveal;
pub mod state;

// Re-export main types for convenience
pub use ai::{Backend, ClientConfig, MockClient, PerplexityClient};
pub use config::{Config, ConfigError};
pub use conversation::{Conversation, ViewMode, FALLBACK_REPLY};
pub use error::ChatError;
pub use format::{clean_reply, extract_segments, format_letter, Segment, Segments};
pub use provider::Provider;
pub use render::{message_frame, Block, MessageFrame};
pub use reveal::Reveal;
pub use state::{ChatMessage, ChatRole, ConversationLog, MessageId};
