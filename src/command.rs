use std::fmt;

use crate::errors::{Error, Result};

/// A program and its arguments, ready to be run as a child process.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    argv: Vec<String>,
}

impl Command {
    /// Fails with a usage error if `words` is empty.
    pub fn new<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let argv: Vec<String> = words.into_iter().map(|w| w.as_ref().to_string()).collect();
        if argv.is_empty() {
            return Err(Error::usage("empty command"));
        }

        Ok(Self { argv })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_program_and_args() {
        let command = Command::new(&["echo", "a b", "c"]).unwrap();
        assert_eq!(command.program(), "echo");
        assert_eq!(command.args(), &["a b".to_string(), "c".to_string()][..]);
        assert_eq!(command.to_string(), "echo a b c");
    }

    #[test]
    fn test_empty_command_is_usage_error() {
        let words: Vec<String> = Vec::new();
        let err = Command::new(words).unwrap_err();
        assert_eq!(*err.kind(), ErrorKind::Usage("empty command".into()));
    }
}
