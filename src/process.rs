//! Child processes with an explicit spawn/wait life cycle.

use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::process::{self, Child, Stdio};

use failure::{Fail, ResultExt};
use log::{debug, warn};
use nix::errno::Errno;

use crate::{
    command::Command,
    errors::{Error, ErrorKind, Result},
    util::JobshExitStatusExt,
};

/// Exit code reported for a command whose executable could not be found.
pub const COMMAND_NOT_FOUND_EXIT_STATUS: i32 = 127;
/// Exit code reported for a command that was found but could not be executed.
pub const COMMAND_NOT_EXECUTABLE_EXIT_STATUS: i32 = 126;

/// The exit code to report when `error` means the child could not replace
/// itself with the program. `None` for errors that are not exec failures.
pub fn exec_failure_exit_status(error: &Error) -> Option<i32> {
    match *error.kind() {
        ErrorKind::CommandNotFound(_) => Some(COMMAND_NOT_FOUND_EXIT_STATUS),
        ErrorKind::CommandNotExecutable(_) => Some(COMMAND_NOT_EXECUTABLE_EXIT_STATUS),
        _ => None,
    }
}

/// Failures of process creation itself, as opposed to failures to exec the
/// program in the new process.
fn is_fork_failure(e: &io::Error) -> bool {
    match e.raw_os_error() {
        Some(errno) => errno == Errno::EAGAIN as i32 || errno == Errno::ENOMEM as i32,
        None => false,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessId(u32);

impl From<u32> for ProcessId {
    fn from(value: u32) -> Self {
        ProcessId(value)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProcessState {
    Unstarted,
    Running,
    Exited(i32),
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ProcessState::Unstarted => write!(f, "Unstarted"),
            ProcessState::Running => write!(f, "Running"),
            ProcessState::Exited(code) => write!(f, "Exited({})", code),
        }
    }
}

/// Owns at most one child process.
///
/// A handle moves from `Unstarted` to `Running` on [`spawn`](#method.spawn)
/// and from `Running` to `Exited` on [`wait`](#method.wait); each transition
/// happens once. Waiting reaps the child.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Option<Child>,
    state: ProcessState,
}

impl ProcessHandle {
    pub fn new() -> Self {
        Self {
            child: None,
            state: ProcessState::Unstarted,
        }
    }

    /// `None` until the process has been spawned.
    pub fn pid(&self) -> Option<ProcessId> {
        self.child.as_ref().map(|child| child.id().into())
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Starts `command` as a child process with inherited stdio and returns
    /// immediately.
    pub fn spawn(&mut self, command: &Command) -> Result<ProcessId> {
        if self.state != ProcessState::Unstarted {
            return Err(Error::invalid_process_state(format!(
                "cannot spawn '{}': process is already {}",
                command, self.state
            )));
        }

        let mut os_command = process::Command::new(OsStr::new(command.program()));
        os_command
            .args(command.args().iter().map(OsStr::new))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = os_command.spawn().map_err(|e| -> Error {
            let program = command.program().to_string();
            if e.kind() == io::ErrorKind::NotFound {
                Error::command_not_found(program)
            } else if is_fork_failure(&e) {
                e.context(ErrorKind::Spawn(program)).into()
            } else {
                e.context(ErrorKind::CommandNotExecutable(program)).into()
            }
        })?;

        let pid = ProcessId::from(child.id());
        debug!("spawned '{}' as pid {}", command, pid);
        self.child = Some(child);
        self.state = ProcessState::Running;
        Ok(pid)
    }

    /// Blocks until the child exits and returns its normalized exit code.
    pub fn wait(&mut self) -> Result<i32> {
        let child = match (self.state, self.child.as_mut()) {
            (ProcessState::Running, Some(child)) => child,
            (state, _) => {
                return Err(Error::invalid_process_state(format!(
                    "cannot wait on a process that is {}",
                    state
                )));
            }
        };

        let exit_status = child.wait().context(ErrorKind::Io)?;
        if let Some(signal) = exit_status.terminating_signal() {
            warn!("pid {} was terminated by {}", child.id(), signal);
        }

        let code = exit_status.normalized_code();
        debug!("pid {} exited with {}", child.id(), code);
        self.state = ProcessState::Exited(code);
        Ok(code)
    }
}

impl Default for ProcessHandle {
    fn default() -> Self {
        Self::new()
    }
}
