use std::collections::HashMap;
use std::time::{Duration, Instant};

use parley_core::{
    message_frame, Backend, ChatError, ChatMessage, Conversation, MessageFrame, MessageId, Reveal,
    ViewMode,
};
use ratatui::layout::Rect;
use tokio::task::JoinHandle;

use crate::clipboard::copy_to_clipboard;

/// How long the "Copied!" marker stays on a code block
pub const COPIED_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// A code block the user copied, and when
#[derive(Debug, Clone, Copy)]
pub struct CopiedIndicator {
    pub block: usize,
    pub at: Instant,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub conversation: Conversation,
    pub backend: Backend,

    // Input box
    pub input: String,
    pub input_cursor: usize, // cursor position in chars

    // Outstanding request, polled from the main loop
    pub pending: Option<JoinHandle<Result<String, ChatError>>>,

    // Typewriter state per assistant message
    pub reveals: HashMap<MessageId, Reveal>,

    // Chat viewport
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of the chat area
    pub chat_width: u16,  // inner width of the chat area
    pub follow_bottom: bool,
    pub chat_area: Option<Rect>,

    // Code block selection and copy feedback
    pub selected_code: Option<usize>,
    pub copied: Option<CopiedIndicator>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
    pub cursor_visible: bool,
}

impl App {
    pub fn new(backend: Backend) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            conversation: Conversation::new(),
            backend,

            input: String::new(),
            input_cursor: 0,

            pending: None,
            reveals: HashMap::new(),

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            follow_bottom: true,
            chat_area: None,

            selected_code: None,
            copied: None,

            animation_frame: 0,
            cursor_visible: true,
        }
    }

    pub fn view(&self) -> ViewMode {
        self.conversation.view()
    }

    pub fn start_chat(&mut self) {
        self.conversation.start();
        self.input_mode = InputMode::Editing;
    }

    /// Back to the welcome screen; requests and reveals keep running.
    pub fn back_to_welcome(&mut self) {
        self.conversation.back();
        self.input_mode = InputMode::Normal;
    }

    /// The input box is disabled while a reply is outstanding.
    pub fn input_enabled(&self) -> bool {
        !self.conversation.is_loading()
    }

    /// Send what's in the input box, running the request in the background.
    pub fn submit_input(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return;
        }

        if let Err(e) = self.conversation.begin_send(&text) {
            tracing::debug!("Input not sent: {}", e);
            return;
        }

        self.input.clear();
        self.input_cursor = 0;
        self.follow_bottom = true;

        tracing::info!(
            provider = self.backend.provider().as_str(),
            chars = text.chars().count(),
            "Sending message"
        );
        let backend = self.backend.clone();
        self.pending = Some(tokio::spawn(async move { backend.send_message(&text).await }));
    }

    /// Collect a finished request, if any, and start revealing its reply.
    /// Returns whether a reply arrived.
    pub async fn poll_pending(&mut self) -> bool {
        let finished = self.pending.as_ref().is_some_and(|task| task.is_finished());
        if !finished {
            return false;
        }
        let Some(task) = self.pending.take() else {
            return false;
        };

        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(ChatError::Request(format!("request task failed: {}", e))),
        };
        self.finish_send(result);
        true
    }

    /// Record a send outcome and start the reveal of the assistant reply.
    pub fn finish_send(&mut self, result: Result<String, ChatError>) {
        let message = self.conversation.complete_send(result);
        let id = message.id();
        let reveal = Reveal::new(message.content());
        self.reveals.insert(id, reveal);
        self.follow_bottom = true;
    }

    /// Advance every unfinished reveal by one character.
    pub fn tick_reveal(&mut self) -> bool {
        let mut advanced = false;
        for reveal in self.reveals.values_mut() {
            advanced |= reveal.tick().is_some();
        }
        advanced
    }

    pub fn is_revealing(&self) -> bool {
        self.reveals.values().any(|r| !r.is_complete())
    }

    /// Show every reply in full right away.
    pub fn finish_reveals(&mut self) {
        for reveal in self.reveals.values_mut() {
            reveal.finish();
        }
    }

    /// Tick animation frame (called by Tick event). Returns whether anything
    /// on screen moved: the ellipsis, the typing cursor or the copy marker.
    pub fn tick_animation(&mut self) -> bool {
        let mut changed = false;
        if self.conversation.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
            changed = true;
        }
        self.cursor_visible = !self.cursor_visible;
        changed |= self.is_revealing();

        if self.copied.is_some_and(|c| c.at.elapsed() >= COPIED_DURATION) {
            self.copied = None;
            changed = true;
        }
        changed
    }

    /// Frames for every message in display order.
    pub fn message_frames(&self) -> Vec<(&ChatMessage, MessageFrame)> {
        self.conversation
            .log()
            .iter()
            .map(|msg| (msg, message_frame(msg, self.reveals.get(&msg.id()))))
            .collect()
    }

    /// Visible code blocks across the conversation as (language, code), in order.
    pub fn code_blocks(&self) -> Vec<(String, String)> {
        self.message_frames()
            .iter()
            .flat_map(|(_, frame)| {
                frame
                    .code_blocks()
                    .map(|(lang, code)| (lang.to_string(), code.to_string()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn select_next_code(&mut self) {
        let count = self.code_blocks().len();
        if count == 0 {
            self.selected_code = None;
            return;
        }
        self.selected_code = Some(match self.selected_code {
            Some(i) => (i + 1).min(count - 1),
            None => count - 1,
        });
    }

    pub fn select_prev_code(&mut self) {
        let count = self.code_blocks().len();
        if count == 0 {
            self.selected_code = None;
            return;
        }
        self.selected_code = Some(match self.selected_code {
            Some(i) => i.saturating_sub(1).min(count - 1),
            None => count - 1,
        });
    }

    /// Copy the selected code block, or the latest one when none is selected.
    /// Failures are logged and otherwise ignored.
    pub fn copy_selected_code(&mut self) {
        let blocks = self.code_blocks();
        let Some(index) = self
            .selected_code
            .filter(|&i| i < blocks.len())
            .or_else(|| blocks.len().checked_sub(1))
        else {
            return;
        };

        match copy_to_clipboard(&blocks[index].1) {
            Ok(()) => {
                self.selected_code = Some(index);
                self.copied = Some(CopiedIndicator {
                    block: index,
                    at: Instant::now(),
                });
            }
            Err(e) => tracing::warn!("Failed to copy code: {:#}", e),
        }
    }

    pub fn is_copied(&self, block: usize) -> bool {
        self.copied
            .is_some_and(|c| c.block == block && c.at.elapsed() < COPIED_DURATION)
    }

    // Scrolling
    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_bottom = false;
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_bottom = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_bottom = true;
    }

    /// Clamp the scroll offset once the rendered height is known.
    pub fn fit_scroll(&mut self, total_lines: u16) {
        let max_scroll = total_lines.saturating_sub(self.chat_height);
        if self.follow_bottom || self.chat_scroll >= max_scroll {
            self.chat_scroll = max_scroll;
            self.follow_bottom = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::{ChatRole, MockClient};

    fn app() -> App {
        App::new(Backend::Mock(MockClient::instant()))
    }

    #[test]
    fn reply_is_revealed_one_character_per_tick() {
        let mut app = app();
        app.conversation.begin_send("hi").unwrap();
        app.finish_send(Ok("abc".to_string()));

        assert!(app.is_revealing());
        assert!(app.tick_reveal());
        assert!(app.tick_reveal());
        assert!(app.tick_reveal());
        assert!(!app.tick_reveal());
        assert!(!app.is_revealing());
    }

    #[test]
    fn code_blocks_follow_the_reveal() {
        let mut app = app();
        app.conversation.begin_send("code please").unwrap();
        app.finish_send(Ok("```rust\nfn x() {}\n```".to_string()));
        assert!(app.code_blocks().is_empty());

        app.finish_reveals();
        assert_eq!(
            app.code_blocks(),
            vec![("rust".to_string(), "fn x() {}".to_string())]
        );
    }

    #[test]
    fn code_selection_stays_in_range() {
        let mut app = app();
        app.conversation.begin_send("two blocks").unwrap();
        app.finish_send(Ok("```\na\n```\n```\nb\n```".to_string()));
        app.finish_reveals();

        app.select_prev_code();
        assert_eq!(app.selected_code, Some(1));
        app.select_next_code();
        assert_eq!(app.selected_code, Some(1));
        app.select_prev_code();
        app.select_prev_code();
        assert_eq!(app.selected_code, Some(0));
    }

    #[test]
    fn empty_input_is_not_sent() {
        let mut app = app();
        app.input = "   ".to_string();
        app.submit_input();
        assert!(app.conversation.log().is_empty());
        assert!(app.pending.is_none());
    }

    #[tokio::test]
    async fn submitted_input_comes_back_as_a_reply() {
        let mut app = app();
        app.start_chat();
        app.input = "thank you".to_string();
        app.submit_input();
        assert!(!app.input_enabled());
        assert!(app.input.is_empty());

        while app.pending.is_some() {
            tokio::task::yield_now().await;
            app.poll_pending().await;
        }

        assert!(app.input_enabled());
        let last = app.conversation.log().last().unwrap();
        assert_eq!(last.role(), ChatRole::Assistant);
        assert!(app.reveals.contains_key(&last.id()));
    }

    #[test]
    fn follow_bottom_pins_scroll_to_the_end() {
        let mut app = app();
        app.chat_height = 10;
        app.fit_scroll(30);
        assert_eq!(app.chat_scroll, 20);

        app.scroll_up(5);
        app.fit_scroll(40);
        assert_eq!(app.chat_scroll, 15);
        assert!(!app.follow_bottom);
    }
}
