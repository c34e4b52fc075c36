use once_cell::sync::Lazy;
use regex::{CaptureMatches, Regex};

/// Language reported for a fence that declares none
pub const DEFAULT_LANGUAGE: &str = "text";

/// Opening fence, optional tag, newline, shortest body, closing fence.
/// A fence without its closing marker never matches and stays plain text.
static FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```([A-Za-z0-9_]+)?\n((?s:.*?))```").expect("fence pattern is valid")
});

/// One parsed unit of a reply, borrowed from the text it was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Code { content: &'a str, language: &'a str },
}

impl<'a> Segment<'a> {
    pub fn content(&self) -> &'a str {
        match self {
            Segment::Text(content) => content,
            Segment::Code { content, .. } => content,
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Segment::Code { .. })
    }
}

/// Lazy left-to-right walk over the segments of a text.
///
/// Created by [`extract_segments`]. Calling that again restarts the walk.
pub struct Segments<'a> {
    text: &'a str,
    fences: CaptureMatches<'static, 'a>,
    cursor: usize,
    pending: Option<Segment<'a>>,
    emitted: bool,
    exhausted: bool,
}

/// Split `text` into plain-text and fenced-code segments.
///
/// Code bodies are trimmed and tagged with the declared language, or
/// [`DEFAULT_LANGUAGE`] when the fence has no tag. Text without any complete
/// fence comes back as a single `Text` segment equal to the input.
pub fn extract_segments(text: &str) -> Segments<'_> {
    Segments {
        text,
        fences: FENCE.captures_iter(text),
        cursor: 0,
        pending: None,
        emitted: false,
        exhausted: false,
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(segment) = self.pending.take() {
            return Some(segment);
        }
        if self.exhausted {
            return None;
        }

        if let Some(caps) = self.fences.next() {
            // group 0 always participates in a match
            let whole = caps.get(0)?;
            let code = Segment::Code {
                content: caps.get(2).map_or("", |m| m.as_str()).trim(),
                language: caps.get(1).map_or(DEFAULT_LANGUAGE, |m| m.as_str()),
            };

            let before = &self.text[self.cursor..whole.start()];
            self.cursor = whole.end();
            self.emitted = true;

            if before.is_empty() {
                return Some(code);
            }
            self.pending = Some(code);
            return Some(Segment::Text(before));
        }

        self.exhausted = true;
        if self.cursor < self.text.len() {
            self.emitted = true;
            Some(Segment::Text(&self.text[self.cursor..]))
        } else if !self.emitted {
            // empty input still yields one (empty) text segment
            self.emitted = true;
            Some(Segment::Text(self.text))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn collect(text: &str) -> Vec<Segment<'_>> {
        extract_segments(text).collect()
    }

    #[test]
    fn text_without_fences_is_one_segment() {
        let input = "Just a plain answer.\nWith two lines.";
        assert_eq!(collect(input), vec![Segment::Text(input)]);
    }

    #[test]
    fn empty_input_is_one_empty_text_segment() {
        assert_eq!(collect(""), vec![Segment::Text("")]);
    }

    #[test]
    fn fenced_block_splits_text_and_code() {
        let input = "Try this:\n```rust\nfn main() {}\n```\nDone.";
        assert_eq!(
            collect(input),
            vec![
                Segment::Text("Try this:\n"),
                Segment::Code { content: "fn main() {}", language: "rust" },
                Segment::Text("\nDone."),
            ]
        );
    }

    #[test]
    fn untagged_fence_defaults_to_text_language() {
        let input = "```\n  echo hi  \n```";
        assert_eq!(
            collect(input),
            vec![Segment::Code { content: "echo hi", language: DEFAULT_LANGUAGE }]
        );
    }

    #[test]
    fn unclosed_fence_stays_plain_text() {
        let input = "Start:\n```python\nprint('hi')\n";
        let segments = collect(input);
        assert_eq!(segments, vec![Segment::Text(input)]);
        assert!(segments.iter().all(|s| !s.is_code()));
    }

    #[test]
    fn tag_must_be_followed_by_newline() {
        let input = "``` rust\nlet x = 1;\n```";
        assert_eq!(collect(input), vec![Segment::Text(input)]);
    }

    #[test]
    fn multiple_blocks_keep_source_order() {
        let input = "a\n```js\n1\n```\nb\n```sh\n2\n```";
        let languages: Vec<&str> = collect(input)
            .iter()
            .filter_map(|s| match s {
                Segment::Code { language, .. } => Some(*language),
                Segment::Text(_) => None,
            })
            .collect();
        assert_eq!(languages, vec!["js", "sh"]);
        assert_eq!(collect(input).len(), 4);
    }

    #[test]
    fn second_unclosed_fence_after_closed_one_is_text() {
        let input = "```\none\n```\ntail ```rust\ntwo";
        assert_eq!(
            collect(input),
            vec![
                Segment::Code { content: "one", language: "text" },
                Segment::Text("\ntail ```rust\ntwo"),
            ]
        );
    }

    #[test]
    fn segments_reconstruct_input_modulo_fences() {
        let input = "intro\n```go\nfmt.Println(1)\n```\nmiddle\n```\nx\n```\nend";
        let rebuilt: String = collect(input)
            .iter()
            .map(|s| match s {
                Segment::Text(t) => t.to_string(),
                Segment::Code { content, language } => {
                    format!("```{}\n{}\n```", language, content)
                }
            })
            .collect();
        // the untagged fence picks up the default tag when rebuilt
        assert_eq!(rebuilt, input.replacen("```\nx", "```text\nx", 1));
    }

    #[test]
    fn extraction_restarts_from_the_beginning() {
        let input = "x\n```\ny\n```";
        let first: Vec<_> = extract_segments(input).collect();
        let second: Vec<_> = extract_segments(input).collect();
        assert_eq!(first, second);
    }
}
