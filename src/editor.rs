use std::fmt;
use std::io;
use std::path::Path;

use failure::{Fail, ResultExt};
use log::debug;
use rustyline::{error::ReadlineError, Config};

use crate::{
    errors::{ErrorKind, Result},
    input::LineReader,
};

/// Line editor for terminals, with command history.
pub struct Editor {
    internal: rustyline::Editor<()>,
}

impl Editor {
    pub fn with_capacity(history_capacity: usize) -> Editor {
        let config = Config::builder()
            .max_history_size(history_capacity)
            .history_ignore_space(true)
            .history_ignore_dups(true)
            .build();

        Editor {
            internal: rustyline::Editor::with_config(config),
        }
    }

    /// A missing history file is not an error.
    pub fn load_history<P: AsRef<Path> + ?Sized>(&mut self, path: &P) -> Result<()> {
        match self.internal.load_history(path) {
            Ok(()) => Ok(()),
            Err(ReadlineError::Io(ref inner)) if inner.kind() == io::ErrorKind::NotFound => {
                debug!("no history file at {}", path.as_ref().display());
                Ok(())
            }
            Err(e) => Err(e.context(ErrorKind::Readline).into()),
        }
    }

    pub fn save_history<P: AsRef<Path> + ?Sized>(&mut self, path: &P) -> Result<()> {
        self.internal
            .save_history(path)
            .context(ErrorKind::Readline)?;
        Ok(())
    }
}

impl LineReader for Editor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.internal.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.internal.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) => Ok(None),
            // ^C abandons the current line
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(e) => Err(e.context(ErrorKind::Readline).into()),
        }
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} history entries", self.internal.history().len())
    }
}
