//! Typewriter reveal of assistant replies
//!
//! A [`Reveal`] starts from an empty prefix and grows it by one character per
//! [`Reveal::tick`] until the whole reply is visible. The segments shown at
//! each step are parsed again from the current prefix, so a code fence only
//! turns into a code block once its closing marker has been revealed.

use std::str::CharIndices;

use crate::format::{extract_segments, Segment, Segments};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    content: String,
    revealed_bytes: usize,
    revealed_chars: usize,
    total_chars: usize,
}

impl Reveal {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let total_chars = content.chars().count();
        Self {
            content,
            revealed_bytes: 0,
            revealed_chars: 0,
            total_chars,
        }
    }

    /// Reveal one more character. Returns the new revealed length, or `None`
    /// once everything is visible; a finished reveal never grows again.
    pub fn tick(&mut self) -> Option<usize> {
        let next = self.content[self.revealed_bytes..].chars().next()?;
        self.revealed_bytes += next.len_utf8();
        self.revealed_chars += 1;
        Some(self.revealed_chars)
    }

    /// Skip straight to the end.
    pub fn finish(&mut self) {
        self.revealed_bytes = self.content.len();
        self.revealed_chars = self.total_chars;
    }

    pub fn is_complete(&self) -> bool {
        self.revealed_bytes == self.content.len()
    }

    pub fn revealed(&self) -> &str {
        &self.content[..self.revealed_bytes]
    }

    /// Revealed length in characters
    pub fn revealed_len(&self) -> usize {
        self.revealed_chars
    }

    /// Full length in characters
    pub fn total_len(&self) -> usize {
        self.total_chars
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Segments of what is visible right now.
    pub fn segments(&self) -> Segments<'_> {
        extract_segments(self.revealed())
    }

    /// Every display state from the first character to the full reply, one
    /// per character, independent of how far this reveal has ticked.
    pub fn frames(&self) -> Frames<'_> {
        Frames {
            content: &self.content,
            chars: self.content.char_indices(),
        }
    }
}

/// Iterator over successive segment lists of a growing prefix
pub struct Frames<'a> {
    content: &'a str,
    chars: CharIndices<'a>,
}

impl<'a> Iterator for Frames<'a> {
    type Item = Vec<Segment<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, c) = self.chars.next()?;
        let prefix = &self.content[..start + c.len_utf8()];
        Some(extract_segments(prefix).collect())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chars.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reaches_full_length_after_n_ticks_then_stops() {
        let mut reveal = Reveal::new("Hi there");
        let n = reveal.total_len();
        assert_eq!(reveal.revealed(), "");

        let lengths: Vec<usize> = std::iter::from_fn(|| reveal.tick()).collect();
        assert_eq!(lengths, (1..=n).collect::<Vec<_>>());
        assert!(reveal.is_complete());
        assert_eq!(reveal.revealed(), "Hi there");

        assert_eq!(reveal.tick(), None);
        assert_eq!(reveal.tick(), None);
        assert_eq!(reveal.revealed_len(), n);
    }

    #[test]
    fn ticks_by_character_not_byte() {
        let mut reveal = Reveal::new("héllo 👋");
        assert_eq!(reveal.total_len(), 7);
        reveal.tick();
        reveal.tick();
        assert_eq!(reveal.revealed(), "hé");
        while reveal.tick().is_some() {}
        assert_eq!(reveal.revealed(), "héllo 👋");
    }

    #[test]
    fn empty_reply_is_complete_immediately() {
        let mut reveal = Reveal::new("");
        assert!(reveal.is_complete());
        assert_eq!(reveal.tick(), None);
    }

    #[test]
    fn finish_skips_to_the_end() {
        let mut reveal = Reveal::new("abc");
        reveal.tick();
        reveal.finish();
        assert!(reveal.is_complete());
        assert_eq!(reveal.revealed_len(), 3);
        assert_eq!(reveal.tick(), None);
    }

    #[test]
    fn code_block_appears_once_fence_closes() {
        let content = "a\n```\nb\n```";
        let mut reveal = Reveal::new(content);
        while reveal.revealed_len() < content.len() - 1 {
            reveal.tick();
        }
        assert!(reveal.segments().all(|s| !s.is_code()));

        reveal.tick();
        assert!(reveal.segments().any(|s| s.is_code()));
    }

    #[test]
    fn frames_yield_one_state_per_character() {
        let reveal = Reveal::new("x\n```sh\nls\n```");
        let frames: Vec<_> = reveal.frames().collect();
        assert_eq!(frames.len(), reveal.total_len());
        assert_eq!(frames[0], vec![Segment::Text("x")]);
        assert_eq!(
            frames.last().cloned(),
            Some(vec![
                Segment::Text("x\n"),
                Segment::Code { content: "ls", language: "sh" },
            ])
        );
    }

    #[test]
    fn every_frame_rebuilds_its_prefix_while_no_fence_is_closed() {
        let content = "Plain. Then ```rust\nunfinished";
        let reveal = Reveal::new(content);
        for (i, frame) in reveal.frames().enumerate() {
            let rebuilt: String = frame.iter().map(|s| s.content()).collect();
            assert_eq!(rebuilt, &content[..i + 1]);
        }
    }
}
