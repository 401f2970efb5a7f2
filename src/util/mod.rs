use std::convert::TryFrom;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use nix::sys::signal::Signal;

/// Added to a signal number to form the exit code of a signaled process.
const SIGNAL_EXIT_CODE_BASE: i32 = 128;

/// jobsh Utility Extensions for `ExitStatus`
pub trait JobshExitStatusExt {
    /// The exit code reported for this status: the process's own exit code,
    /// or `128 + signal` if it was terminated by a signal.
    fn normalized_code(&self) -> i32;

    /// The signal that terminated the process, if any.
    fn terminating_signal(&self) -> Option<Signal>;
}

impl JobshExitStatusExt for ExitStatus {
    /// # Examples
    /// ```rust
    /// use jobsh::JobshExitStatusExt;
    /// use std::os::unix::process::ExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert_eq!(ExitStatus::from_raw(3 << 8).normalized_code(), 3);
    /// ```
    fn normalized_code(&self) -> i32 {
        match (self.code(), self.signal()) {
            (Some(code), _) => code,
            (None, Some(signal)) => SIGNAL_EXIT_CODE_BASE + signal,
            (None, None) => SIGNAL_EXIT_CODE_BASE,
        }
    }

    fn terminating_signal(&self) -> Option<Signal> {
        self.signal().and_then(|signal| Signal::try_from(signal).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exited_with(code: i32) -> ExitStatus {
        ExitStatus::from_raw(code << 8)
    }

    #[test]
    fn test_normalized_code_of_exit() {
        assert_eq!(exited_with(0).normalized_code(), 0);
        assert_eq!(exited_with(85).normalized_code(), 85);
    }

    #[test]
    fn test_normalized_code_of_signal() {
        // raw wait status for a process killed by SIGKILL
        let status = ExitStatus::from_raw(9);
        assert_eq!(status.normalized_code(), 137);
        assert_eq!(status.terminating_signal(), Some(Signal::SIGKILL));
    }
}
