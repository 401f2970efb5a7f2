//! Sources of command lines for the shell's input loop.

use std::io::{BufRead, Write};

use failure::ResultExt;

use crate::errors::{ErrorKind, Result};

/// Something the shell can read command lines from.
pub trait LineReader {
    /// Shows `prompt` and reads one line, without its line terminator.
    /// Returns `None` when the input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Reads lines from any buffered reader, e.g. a pipe or a file, echoing the
/// prompt to `prompt_out` when the prompt is not empty.
#[derive(Debug)]
pub struct StreamReader<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> StreamReader<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }
}

impl<R: BufRead, W: Write> LineReader for StreamReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        if !prompt.is_empty() {
            write!(self.prompt_out, "{}", prompt).context(ErrorKind::Io)?;
            self.prompt_out.flush().context(ErrorKind::Io)?;
        }

        let mut line = String::new();
        if self.input.read_line(&mut line).context(ErrorKind::Io)? == 0 {
            return Ok(None);
        }

        let len = line.trim_end_matches(&['\r', '\n'][..]).len();
        line.truncate(len);
        Ok(Some(line))
    }
}
