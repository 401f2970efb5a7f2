//! jobsh - Shell Module
//!
//! The Shell owns the job runner and drives it from a line reader, a command
//! string, or a script file.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use failure::ResultExt;
use log::{debug, error, info};

use crate::{
    errors::{Error, ErrorKind, Result},
    input::LineReader,
    job_runner::{Flow, JobRunner},
    remote::{HttpJobSource, JobSource, DEFAULT_HTTP_PORT},
};

const INTERACTIVE_PROMPT: &str = "> ";

/// jobsh Shell
#[derive(Debug)]
pub struct Shell {
    runner: JobRunner,
    config: ShellConfig,
}

impl Shell {
    /// Constructs a Shell that fetches job lists over HTTP.
    pub fn new(config: ShellConfig) -> Self {
        let source = HttpJobSource::new(config.http_port());
        Self::with_source(config, Box::new(source))
    }

    pub fn with_source(config: ShellConfig, source: Box<dyn JobSource>) -> Self {
        Self {
            runner: JobRunner::new(source),
            config,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Runs one line of input.
    pub fn execute_command_string(&mut self, input: &str, stdout: &mut dyn Write) -> Result<Flow> {
        debug!("executing '{}'", input);
        self.runner.dispatch_line(input, stdout)
    }

    /// Runs each line of the file at `path`, stopping at `exit` or the first
    /// error.
    pub fn execute_commands_from_file(&mut self, path: &Path, stdout: &mut dyn Write) -> Result<()> {
        let f = File::open(path).context(ErrorKind::Io)?;
        for line in BufReader::new(f).lines() {
            let line = line.context(ErrorKind::Io)?;
            if self.execute_command_string(&line, stdout)? == Flow::Exit {
                break;
            }
        }

        Ok(())
    }

    /// The input loop: prompts, reads and runs lines until `exit` or end of
    /// input. Errors from individual lines are reported and the loop goes on.
    pub fn execute_from(&mut self, reader: &mut dyn LineReader, stdout: &mut dyn Write) -> Result<()> {
        info!("jobsh started up");
        loop {
            let input = match reader.read_line(&self.config.prompt)? {
                Some(line) => line,
                None => break,
            };

            match self.execute_command_string(input.trim(), stdout) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(e) => report_error(&e),
            }
        }

        if self.config.display_messages {
            let temp_result = writeln!(stdout, "exit");
            log_if_err!(temp_result, "failed to write exit message");
        }
        info!("jobsh has shut down");
        Ok(())
    }
}

fn report_error(e: &Error) {
    let message = e.display_chain();
    error!("{}", message);
    eprintln!("jobsh: {}", message);
}

/// Policy object to control a Shell's behavior
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Shown before each line is read.
    prompt: String,

    /// Determines if new command entries will be added to the shell's command history.
    ///
    /// Note: This is checked before the other command history config fields.
    enable_command_history: bool,

    /// Number of entries to store in the shell's command history
    command_history_capacity: usize,

    /// Determines if some messages (e.g. "exit") should be displayed.
    display_messages: bool,

    /// Port used for job list URLs that do not name one.
    http_port: u16,
}

impl ShellConfig {
    /// Creates an interactive shell, e.g. prompt, command history
    ///
    /// # Complete List
    /// - The prompt is `> `
    /// - Command History is enabled
    /// - Some additional messages are displayed
    pub fn interactive(command_history_capacity: usize) -> Self {
        Self {
            prompt: INTERACTIVE_PROMPT.to_string(),
            enable_command_history: true,
            command_history_capacity,
            display_messages: true,
            http_port: DEFAULT_HTTP_PORT,
        }
    }

    /// Creates a noninteractive shell, e.g. no prompt, no command history
    ///
    /// # Complete List
    /// - The prompt is empty
    /// - Command History is disabled
    /// - Fewer messages are displayed
    pub fn noninteractive() -> Self {
        Default::default()
    }

    pub fn with_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_http_port(mut self, http_port: u16) -> Self {
        self.http_port = http_port;
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// `Some(capacity)` when command history is enabled.
    pub fn command_history_capacity(&self) -> Option<usize> {
        if self.enable_command_history {
            Some(self.command_history_capacity)
        } else {
            None
        }
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            enable_command_history: false,
            command_history_capacity: 0,
            display_messages: false,
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}
