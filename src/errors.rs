//! Error module. See the [failure](https://crates.io/crates/failure) crate for details.

use std::fmt;
use std::result;

use failure::{Backtrace, Context, Fail};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    ctx: Context<ErrorKind>,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.ctx.get_context()
    }

    /// Formats this error followed by each of its causes, separated by `: `.
    pub fn display_chain(&self) -> String {
        let mut message = self.to_string();
        let mut cause = self.ctx.cause();
        while let Some(c) = cause {
            message.push_str(": ");
            message.push_str(&c.to_string());
            cause = c.cause();
        }
        message
    }

    pub(crate) fn command_not_found<T: AsRef<str>>(command: T) -> Error {
        Error::from(ErrorKind::CommandNotFound(command.as_ref().to_string()))
    }

    pub(crate) fn invalid_process_state<T: AsRef<str>>(message: T) -> Error {
        Error::from(ErrorKind::InvalidProcessState(message.as_ref().to_string()))
    }

    pub(crate) fn usage<T: AsRef<str>>(message: T) -> Error {
        Error::from(ErrorKind::Usage(message.as_ref().to_string()))
    }

    pub(crate) fn malformed_url<T: AsRef<str>>(url: T) -> Error {
        Error::from(ErrorKind::MalformedUrl(url.as_ref().to_string()))
    }

    pub(crate) fn http_status<T: AsRef<str>>(url: T, status: String) -> Error {
        Error::from(ErrorKind::HttpStatus {
            url: url.as_ref().to_string(),
            status,
        })
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.ctx.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.ctx.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ctx.fmt(f)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    CommandNotFound(String),
    CommandNotExecutable(String),
    Spawn(String),
    InvalidProcessState(String),
    Usage(String),
    MalformedUrl(String),
    Transport(String),
    HttpStatus { url: String, status: String },
    Docopt,
    Io,
    Readline,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ErrorKind::CommandNotFound(ref command) => write!(f, "{}: command not found", command),
            ErrorKind::CommandNotExecutable(ref command) => write!(f, "{}: cannot execute", command),
            ErrorKind::Spawn(ref command) => write!(f, "{}: failed to start process", command),
            ErrorKind::InvalidProcessState(ref message) => write!(f, "{}", message),
            ErrorKind::Usage(ref message) => write!(f, "{}", message),
            ErrorKind::MalformedUrl(ref url) => write!(f, "{}: malformed url", url),
            ErrorKind::Transport(ref url) => write!(f, "{}: unable to fetch job list", url),
            ErrorKind::HttpStatus {
                ref url,
                ref status,
            } => write!(f, "{}: server responded with '{}'", url, status),
            ErrorKind::Docopt => write!(f, "Docopt error occurred"),
            ErrorKind::Io => write!(f, "I/O error occurred"),
            ErrorKind::Readline => write!(f, "Readline error occurred"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error::from(Context::new(kind))
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(ctx: Context<ErrorKind>) -> Error {
        Error { ctx }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use failure::ResultExt;

    use super::*;

    #[test]
    fn test_display_chain_includes_cause() {
        let result: result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        let error: Error = result
            .context(ErrorKind::Transport("http://localhost/jobs".into()))
            .unwrap_err()
            .into();

        assert_eq!(
            *error.kind(),
            ErrorKind::Transport("http://localhost/jobs".into())
        );
        assert_eq!(
            error.display_chain(),
            "http://localhost/jobs: unable to fetch job list: refused"
        );
    }

    #[test]
    fn test_display_chain_without_cause() {
        let error = Error::usage("SERIAL: usage: SERIAL <url>");
        assert_eq!(error.display_chain(), "SERIAL: usage: SERIAL <url>");
    }
}
