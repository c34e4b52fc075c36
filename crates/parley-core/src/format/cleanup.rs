use once_cell::sync::Lazy;
use regex::Regex;

use super::letter::format_letter;

static BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"));

static CITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[0-9]+\]").expect("citation pattern is valid"));

static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank line pattern is valid"));

/// Tidy a raw provider reply for display.
///
/// Drops `**bold**` markers (keeping the text) and `[3]`-style citation
/// markers, squeezes blank-line runs into a single blank line, trims, and
/// spaces out letter-shaped replies.
pub fn clean_reply(raw: &str) -> String {
    let text = BOLD.replace_all(raw, "${1}");
    let text = CITATION.replace_all(&text, "");
    let text = BLANK_LINES.replace_all(&text, "\n\n");

    format_letter(text.trim()).trim().to_string()
}
