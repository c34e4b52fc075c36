use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// Phrases that start a new paragraph in a letter-shaped reply
const LETTER_MARKERS: [&str; 5] = [
    "Subject:",
    "Dear",
    "Best regards,",
    "Yours sincerely,",
    "Sincerely,",
];

static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([.!?])\s+([A-Z])").expect("sentence pattern is valid"));

static EXCESS_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("line break pattern is valid"));

/// A reply counts as a letter when it has both a subject line and a greeting.
pub fn is_letter(text: &str) -> bool {
    text.contains("Subject:") && text.contains("Dear")
}

/// Put letter-shaped replies on separate paragraphs.
///
/// Heuristic only: a capital letter after sentence punctuation always starts a
/// new paragraph, even mid-thought. Text that isn't a letter is returned
/// borrowed and untouched.
pub fn format_letter(text: &str) -> Cow<'_, str> {
    if !is_letter(text) {
        return Cow::Borrowed(text);
    }

    let mut formatted = text.to_string();
    for marker in LETTER_MARKERS {
        formatted = formatted.replace(marker, &format!("\n\n{}", marker));
    }

    let formatted = SENTENCE_BREAK.replace_all(&formatted, "${1}\n\n${2}");
    let formatted = EXCESS_BREAKS.replace_all(&formatted, "\n\n");

    Cow::Owned(formatted.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn non_letter_is_returned_unchanged() {
        let input = "Hello there. How are you? Fine!";
        let out = format_letter(input);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, input);
    }

    #[test]
    fn subject_alone_is_not_a_letter() {
        let input = "Subject: lunch. See you there.";
        assert_eq!(format_letter(input), input);
    }

    #[test]
    fn letter_gets_paragraph_breaks() {
        let input = "Subject: Hi\nDear Sam. Hello there. Best regards,\nAlex";
        assert_eq!(
            format_letter(input),
            "\n\nSubject: Hi\n\nDear Sam.\n\nHello there.\n\nBest regards,\nAlex"
        );
    }

    #[test]
    fn closings_are_split_off() {
        let input = "Subject: x\nDear Jo, thanks Yours sincerely,\nA Sincerely,\nB";
        let out = format_letter(input);
        assert!(out.contains("\n\nYours sincerely,"));
        assert!(out.contains("\n\nSincerely,"));
    }

    #[test]
    fn runs_of_breaks_collapse_to_two() {
        let input = "Subject: x\n\n\n\nDear Kim.\n\n\n\nThanks.";
        let out = format_letter(input);
        assert!(!out.contains("\n\n\n"));
    }

    #[test]
    fn formatting_twice_is_stable() {
        let input = "Subject: Plans\nDear team. We ship Friday! Best regards,\nRo";
        let once = format_letter(input).into_owned();
        let twice = format_letter(&once).into_owned();
        assert_eq!(once, twice);
    }
}
