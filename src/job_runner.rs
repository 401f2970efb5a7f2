//! Dispatches tokenized command lines.
//!
//! The first word of a line selects what happens to it:
//!
//! - `exit` ends the session.
//! - an empty line, or a first word starting with `#`, is skipped.
//! - `SERIAL <url>` runs every command of a remote job list, one at a time.
//! - `PARALLEL <url>` starts every `sleep` job of a remote job list, then
//!   waits for all of them.
//! - anything else is run as a command in the foreground.

use std::fmt;
use std::io::Write;

use failure::ResultExt;
use log::{debug, error, info, warn};

use crate::{
    command::Command,
    errors::{Error, ErrorKind, Result},
    process::{exec_failure_exit_status, ProcessHandle},
    remote::JobSource,
    tokenizer::tokenize,
};

const EXIT_NAME: &str = "exit";
const SERIAL_NAME: &str = "SERIAL";
const PARALLEL_NAME: &str = "PARALLEL";
const SLEEP_NAME: &str = "sleep";
const COMMENT_PREFIX: &str = "#";
const HTTP_STATUS_PREFIX: &str = "HTTP/1.1";

/// Whether the input loop should keep reading lines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Flow {
    Continue,
    Exit,
}

#[derive(Debug, PartialEq)]
enum Directive {
    Exit,
    Skip,
    Serial(String),
    Parallel(String),
    Literal(Command),
}

impl Directive {
    fn parse(words: &[String]) -> Result<Self> {
        let first = match words.first() {
            Some(first) => first.as_str(),
            None => return Ok(Directive::Skip),
        };

        let directive = match first {
            EXIT_NAME => Directive::Exit,
            SERIAL_NAME => Directive::Serial(url_operand(SERIAL_NAME, words)?),
            PARALLEL_NAME => Directive::Parallel(url_operand(PARALLEL_NAME, words)?),
            _ if is_comment(first) => Directive::Skip,
            _ => Directive::Literal(Command::new(words)?),
        };
        Ok(directive)
    }
}

fn url_operand(name: &str, words: &[String]) -> Result<String> {
    if words.len() > 2 {
        warn!("{}: ignoring extra operands {:?}", name, &words[2..]);
    }

    words
        .get(1)
        .cloned()
        .ok_or_else(|| Error::usage(format!("{}: usage: {} <url>", name, name)))
}

fn is_comment(word: &str) -> bool {
    word.starts_with(COMMENT_PREFIX)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JobMode {
    /// Waited for before the next job starts.
    Foreground,
    /// Added to the pending list and waited for by `drain_pending`.
    BackgroundTracked,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Job {
    pub command: Command,
    pub mode: JobMode,
}

impl Job {
    pub fn foreground(command: Command) -> Self {
        Self {
            command,
            mode: JobMode::Foreground,
        }
    }

    pub fn background(command: Command) -> Self {
        Self {
            command,
            mode: JobMode::BackgroundTracked,
        }
    }
}

struct PendingJob {
    command: Command,
    handle: ProcessHandle,
}

/// Runs jobs and tracks the background jobs that have not been waited for.
pub struct JobRunner {
    source: Box<dyn JobSource>,
    pending: Vec<PendingJob>,
}

impl JobRunner {
    pub fn new(source: Box<dyn JobSource>) -> Self {
        Self {
            source,
            pending: Vec::new(),
        }
    }

    /// Number of background jobs not yet waited for.
    pub fn pending_jobs(&self) -> usize {
        self.pending.len()
    }

    /// Tokenizes and dispatches one line of input.
    pub fn dispatch_line(&mut self, line: &str, stdout: &mut dyn Write) -> Result<Flow> {
        self.dispatch(&tokenize(line), stdout)
    }

    pub fn dispatch(&mut self, words: &[String], stdout: &mut dyn Write) -> Result<Flow> {
        let directive = Directive::parse(words)?;
        debug!("dispatching {:?}", directive);

        match directive {
            Directive::Exit => return Ok(Flow::Exit),
            Directive::Skip => {}
            Directive::Serial(url) => self.run_serial(&url, stdout)?,
            Directive::Parallel(url) => self.run_parallel(&url, stdout)?,
            Directive::Literal(command) => {
                self.run_job(Job::foreground(command), stdout)?;
            }
        }

        Ok(Flow::Continue)
    }

    /// Runs each command of the job list at `url` in order, waiting for each
    /// to exit before starting the next.
    pub fn run_serial(&mut self, url: &str, stdout: &mut dyn Write) -> Result<()> {
        info!("running job list {} serially", url);
        for line in self.source.fetch(url)? {
            let words = tokenize(&line?);
            let runnable = match words.first() {
                Some(first) => !is_comment(first) && first != HTTP_STATUS_PREFIX,
                None => false,
            };
            if !runnable {
                continue;
            }

            self.run_job(Job::foreground(Command::new(&words)?), stdout)?;
        }

        Ok(())
    }

    /// Starts every `sleep` job of the job list at `url` without waiting, then
    /// waits for each of them in the order they were started. Jobs that were
    /// started are waited for even if reading the job list fails.
    pub fn run_parallel(&mut self, url: &str, stdout: &mut dyn Write) -> Result<()> {
        info!("running job list {} in parallel", url);
        let scanned = self.start_sleep_jobs(url, stdout);
        let drained = self.drain_pending(stdout);
        scanned.and(drained.map(|_| ()))
    }

    fn start_sleep_jobs(&mut self, url: &str, stdout: &mut dyn Write) -> Result<()> {
        for line in self.source.fetch(url)? {
            let words = tokenize(&line?);
            if words.first().map(String::as_str) != Some(SLEEP_NAME) {
                continue;
            }

            match words.get(1) {
                Some(duration) => {
                    let command = Command::new(vec![SLEEP_NAME, duration.as_str()])?;
                    self.run_job(Job::background(command), stdout)?;
                }
                None => {
                    let e = Error::usage(format!("{}: missing operand", SLEEP_NAME));
                    warn!("{}: skipping job: {}", url, e);
                    eprintln!("jobsh: {}", e);
                }
            }
        }

        Ok(())
    }

    /// Starts `job`. Foreground jobs are waited for and their exit code is
    /// returned; background jobs join the pending list and `None` is returned.
    pub fn run_job(&mut self, job: Job, stdout: &mut dyn Write) -> Result<Option<i32>> {
        report_running(stdout, &job.command)?;

        let mut handle = ProcessHandle::new();
        if let Err(e) = handle.spawn(&job.command) {
            let code = match exec_failure_exit_status(&e) {
                Some(code) => code,
                None => return Err(e),
            };
            eprintln!("jobsh: {}", e.display_chain());
            report_exit_code(stdout, code)?;
            return Ok(Some(code));
        }

        match job.mode {
            JobMode::Foreground => {
                let code = handle.wait()?;
                report_exit_code(stdout, code)?;
                Ok(Some(code))
            }
            JobMode::BackgroundTracked => {
                self.pending.push(PendingJob {
                    command: job.command,
                    handle,
                });
                Ok(None)
            }
        }
    }

    /// Waits for every pending job exactly once, in the order they were
    /// started, reporting each exit code. Returns the exit codes.
    pub fn drain_pending(&mut self, stdout: &mut dyn Write) -> Result<Vec<i32>> {
        let mut codes = Vec::with_capacity(self.pending.len());
        let mut result = Ok(());

        for mut job in self.pending.drain(..) {
            let outcome = job.handle.wait().and_then(|code| {
                report_exit_code(stdout, code)?;
                Ok(code)
            });
            match outcome {
                Ok(code) => codes.push(code),
                Err(e) => {
                    error!("failed to wait for '{}': {}", job.command, e);
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
        }

        result.map(|()| codes)
    }
}

impl fmt::Debug for JobRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} pending jobs", self.pending.len())?;
        for job in &self.pending {
            writeln!(f, "{:?}\t{}", job.handle.pid(), job.command)?;
        }

        Ok(())
    }
}

fn report_running(stdout: &mut dyn Write, command: &Command) -> Result<()> {
    writeln!(stdout, "Running: {}", command).context(ErrorKind::Io)?;
    stdout.flush().context(ErrorKind::Io)?;
    Ok(())
}

fn report_exit_code(stdout: &mut dyn Write, code: i32) -> Result<()> {
    writeln!(stdout, "Exit code: {}", code).context(ErrorKind::Io)?;
    stdout.flush().context(ErrorKind::Io)?;
    Ok(())
}
