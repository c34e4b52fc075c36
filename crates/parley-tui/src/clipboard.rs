use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{anyhow, Context, Result};

/// Clipboard helpers tried in order; the first one that runs wins.
const CLIPBOARD_COMMANDS: [(&str, &[&str]); 4] = [
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Copy `text` to the system clipboard by piping it into a helper program.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut last_err = None;

    for (program, args) in CLIPBOARD_COMMANDS {
        match pipe_into(program, args, text) {
            Ok(()) => {
                tracing::debug!("Copied {} bytes with {}", text.len(), program);
                return Ok(());
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("no clipboard command available")))
}

fn pipe_into(program: &str, args: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to start {}", program))?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(text.as_bytes()) {
            // Reap the helper before bailing out
            let _ = child.kill();
            let _ = child.wait();
            return Err(e).with_context(|| format!("failed to write to {}", program));
        }
    }

    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("{} exited with {}", program, status))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn helper_that_reads_everything_succeeds() {
        assert!(pipe_into("cat", &[], "fn main() {}").is_ok());
    }

    #[test]
    fn failing_or_missing_helper_is_an_error() {
        assert!(pipe_into("false", &[], "x").is_err());
        assert!(pipe_into("parley-no-such-clipboard-helper", &[], "x").is_err());
    }

    #[test]
    fn helper_that_stops_reading_reports_the_write_failure() {
        // `true` exits without reading, so a payload larger than the pipe
        // buffer hits a closed pipe.
        let payload = "x".repeat(1 << 20);
        let err = pipe_into("true", &[], &payload).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to write to true"), "{:#}", err);
    }
}
