//! Conversation state: the message log, the loading and error flags, and the
//! welcome/chat view mode.
//!
//! A send is split in two so front ends can run the request in the background:
//! [`Conversation::begin_send`] records the user message and raises the
//! loading flag, [`Conversation::complete_send`] records the outcome and
//! lowers it again. Only one send can be outstanding at a time.

use crate::ai::Backend;
use crate::error::ChatError;
use crate::state::{ChatMessage, ChatRole, ConversationLog, MessageId};

/// Assistant message appended when a send fails
pub const FALLBACK_REPLY: &str =
    "Sorry, I encountered an error while processing your message. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Welcome,
    Chat,
}

#[derive(Debug, Default)]
pub struct Conversation {
    log: ConversationLog,
    view: ViewMode,
    loading: bool,
    error: Option<String>,
    next_id: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    /// Leave the welcome screen.
    pub fn start(&mut self) {
        self.view = ViewMode::Chat;
    }

    /// Return to the welcome screen. Pending sends and reveals keep going.
    pub fn back(&mut self) {
        self.view = ViewMode::Welcome;
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Banner text from the last failed send, cleared by the next send
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record the user's message and mark a send as outstanding.
    pub fn begin_send(&mut self, text: &str) -> Result<MessageId, ChatError> {
        if self.loading {
            tracing::debug!("Rejected send while another is outstanding");
            return Err(ChatError::Busy);
        }

        let id = self.append(ChatRole::User, text).id();
        self.loading = true;
        self.error = None;
        Ok(id)
    }

    /// Record the outcome of the outstanding send and clear the loading flag.
    ///
    /// A failure still produces an assistant message (the fixed fallback) so
    /// the log keeps alternating between user and assistant.
    pub fn complete_send(&mut self, result: Result<String, ChatError>) -> &ChatMessage {
        self.loading = false;
        let content = match result {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!("Send failed: {}", err);
                self.error = Some(err.to_string());
                FALLBACK_REPLY.to_string()
            }
        };
        self.append(ChatRole::Assistant, content)
    }

    /// Run a whole send against `backend` and return the assistant message.
    pub async fn send(&mut self, backend: &Backend, text: &str) -> Result<&ChatMessage, ChatError> {
        self.begin_send(text)?;
        let result = backend.send_message(text).await;
        Ok(self.complete_send(result))
    }

    fn append(&mut self, role: ChatRole, content: impl Into<String>) -> &ChatMessage {
        self.next_id += 1;
        self.log
            .push(ChatMessage::new(MessageId::new(self.next_id), role, content))
    }
}
