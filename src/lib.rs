//! jobsh - Job Shell
//!
//! A small command shell that runs command lines typed at a prompt, or job
//! lists fetched over HTTP, either one at a time or concurrently.

#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces
)]

/// Logs the error of a `Result` that is otherwise ignored.
macro_rules! log_if_err {
    ($result:expr, $fmt:expr) => {{
        if let Err(ref e) = $result {
            log::error!("{}: {}", $fmt, e);
        }
    }};
    ($result:expr, $fmt:expr, $($arg:tt)*) => {{
        if let Err(ref e) = $result {
            log::error!("{}: {}", format!($fmt, $($arg)*), e);
        }
    }};
}

pub mod command;
mod editor;
pub mod errors;
mod input;
pub mod job_runner;
pub mod process;
pub mod remote;
mod shell;
pub mod tokenizer;
mod util;

pub use crate::editor::Editor;
pub use crate::input::{LineReader, StreamReader};
pub use crate::job_runner::{Flow, JobRunner};
pub use crate::shell::{Shell, ShellConfig};
pub use crate::util::JobshExitStatusExt;
