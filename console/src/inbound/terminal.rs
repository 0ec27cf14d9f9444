//! Terminal implementation of the operator feedback port.

use std::io::{self, BufRead, BufReader, Stderr, Stdin, Write};
use std::sync::Mutex;

use tracing::warn;

use crate::domain::ports::UserFeedback;

/// Feedback over a line-oriented reader and writer.
///
/// Alerts are written as single lines. Prompts accept `y` or `yes`
/// (any case); anything else, including end of input, declines.
#[derive(Debug)]
pub struct TerminalFeedback<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
    assume_yes: bool,
}

/// Feedback on the process's stdin and stderr.
pub type StdioFeedback = TerminalFeedback<BufReader<Stdin>, Stderr>;

impl StdioFeedback {
    /// Feedback on stdin/stderr; `assume_yes` accepts every prompt unread.
    #[must_use]
    pub fn stdio(assume_yes: bool) -> Self {
        Self::new(BufReader::new(io::stdin()), io::stderr(), assume_yes)
    }
}

impl<R, W> TerminalFeedback<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    /// Feedback over `input` and `output`.
    pub fn new(input: R, output: W, assume_yes: bool) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
            assume_yes,
        }
    }

    /// Recover the writer, e.g. to inspect what was shown.
    ///
    /// # Errors
    ///
    /// Fails when a writer thread panicked while holding the lock.
    pub fn into_output(self) -> Result<W, io::Error> {
        self.output
            .into_inner()
            .map_err(|err| io::Error::other(err.to_string()))
    }

    /// Show `prompt` and read one line, without the line terminator.
    ///
    /// # Errors
    ///
    /// Fails when the prompt cannot be written or the answer read.
    pub fn ask(&self, prompt: &str) -> io::Result<String> {
        self.write_line(prompt, false)?;
        let answer = self.read_answer()?;
        Ok(answer.trim_end_matches(['\r', '\n']).to_owned())
    }

    fn write_line(&self, text: &str, newline: bool) -> io::Result<()> {
        let mut output = self
            .output
            .lock()
            .map_err(|err| io::Error::other(err.to_string()))?;
        if newline {
            writeln!(output, "{text}")?;
        } else {
            write!(output, "{text}")?;
        }
        output.flush()
    }

    fn read_answer(&self) -> io::Result<String> {
        let mut input = self
            .input
            .lock()
            .map_err(|err| io::Error::other(err.to_string()))?;
        let mut line = String::new();
        input.read_line(&mut line)?;
        Ok(line)
    }
}

impl<R, W> UserFeedback for TerminalFeedback<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn alert(&self, message: &str) {
        if let Err(err) = self.write_line(message, true) {
            warn!(error = %err, %message, "could not show alert");
        }
    }

    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let asked = self.write_line(&format!("{prompt} [y/N] "), false);
        match asked.and_then(|()| self.read_answer()) {
            Ok(answer) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(err) => {
                warn!(error = %err, "could not read confirmation; declining");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn feedback(answer: &str, assume_yes: bool) -> TerminalFeedback<&[u8], Vec<u8>> {
        TerminalFeedback::new(answer.as_bytes(), Vec::new(), assume_yes)
    }

    #[rstest]
    #[case("y\n", true)]
    #[case("YES\n", true)]
    #[case("n\n", false)]
    #[case("\n", false)]
    #[case("", false)]
    fn prompts_accept_only_yes(#[case] answer: &str, #[case] expected: bool) {
        let terminal = feedback(answer, false);
        assert_eq!(terminal.confirm("Delete this note?"), expected);
        let shown = terminal.into_output().expect("output");
        assert_eq!(String::from_utf8_lossy(&shown), "Delete this note? [y/N] ");
    }

    #[test]
    fn assume_yes_skips_the_prompt() {
        let terminal = feedback("", true);
        assert!(terminal.confirm("Delete this service?"));
        assert!(terminal.into_output().expect("output").is_empty());
    }

    #[test]
    fn alerts_are_written_as_lines() {
        let terminal = feedback("", false);
        terminal.alert("Council name is required");
        let shown = terminal.into_output().expect("output");
        assert_eq!(String::from_utf8_lossy(&shown), "Council name is required\n");
    }

    #[test]
    fn asked_lines_lose_their_terminator() {
        let terminal = feedback("s3cret\r\n", false);
        assert_eq!(terminal.ask("Password: ").expect("answer"), "s3cret");
        let shown = terminal.into_output().expect("output");
        assert_eq!(String::from_utf8_lossy(&shown), "Password: ");
    }
}
