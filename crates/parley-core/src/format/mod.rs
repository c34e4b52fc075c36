//! Pure text transforms applied to assistant replies
//!
//! - [`extract_segments`] splits a reply into plain text and fenced code.
//! - [`format_letter`] spaces out replies that look like a letter or email.
//! - [`clean_reply`] is the cleanup pass run on every raw provider reply.

mod cleanup;
mod fence;
mod letter;

pub use cleanup::clean_reply;
pub use fence::{extract_segments, Segment, Segments, DEFAULT_LANGUAGE};
pub use letter::{format_letter, is_letter};
