//! Display model for a single message, independent of the UI toolkit.

use std::borrow::Cow;

use crate::format::{extract_segments, format_letter, Segment};
use crate::reveal::Reveal;
use crate::state::ChatMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Reflowable text, letters already split into paragraphs
    Text(String),
    /// Fenced code with its declared language
    Code { language: String, code: String },
}

/// What a message looks like at one reveal step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFrame {
    pub blocks: Vec<Block>,
    /// Show the typing cursor after the last block
    pub cursor: bool,
}

impl MessageFrame {
    pub fn code_blocks(&self) -> impl Iterator<Item = (&str, &str)> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Code { language, code } => Some((language.as_str(), code.as_str())),
            Block::Text(_) => None,
        })
    }
}

/// Build the frame for `message`.
///
/// User messages are shown whole as one text block. Assistant messages show
/// the prefix revealed so far (everything when there is no reveal), split into
/// text and code blocks.
pub fn message_frame(message: &ChatMessage, reveal: Option<&Reveal>) -> MessageFrame {
    if !message.is_assistant() {
        return MessageFrame {
            blocks: vec![Block::Text(message.content().to_string())],
            cursor: false,
        };
    }

    let (visible, cursor) = match reveal {
        Some(reveal) => (reveal.revealed(), !reveal.is_complete()),
        None => (message.content(), false),
    };

    let blocks = extract_segments(visible)
        .map(|segment| match segment {
            Segment::Text(text) => Block::Text(display_text(text)),
            Segment::Code { content, language } => Block::Code {
                language: language.to_string(),
                code: content.to_string(),
            },
        })
        .collect();

    MessageFrame { blocks, cursor }
}

/// Letter-shaped text is reflowed and trimmed; anything else passes through.
fn display_text(text: &str) -> String {
    match format_letter(text) {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(letter) => letter.trim().to_string(),
    }
}
