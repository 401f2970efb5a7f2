use std::io;
use std::path::{Path, PathBuf};
use std::process;

use atty::Stream;
use docopt::Docopt;
use jobsh::{errors::Result, Editor, Shell, ShellConfig, StreamReader};
use log::{debug, error, warn};
use nix::unistd::Pid;
use serde_derive::Deserialize;

const COMMAND_HISTORY_CAPACITY: usize = 100;
const HISTORY_FILE_NAME: &str = ".jobsh_history";
const LOG_FILE_NAME: &str = ".jobsh_log";
const FAILURE_EXIT_STATUS: i32 = 1;

const USAGE: &str = "
jobsh.

Usage:
    jobsh [options]
    jobsh [options] -c <command>
    jobsh [options] <file>
    jobsh (-h | --help)
    jobsh --version

Options:
    -h --help          Show this screen.
    --version          Show version.
    -c                 If the -c option is present, then commands are read from the first
                           non-option argument command_string.
    --prompt=<prompt>  Prompt shown before each line, defaults to '> ' on a terminal.
    --port=<port>      Port for job list URLs that do not name one, defaults to 80.
    --log=<path>       File to write log to, defaults to ~/.jobsh_log
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_command: Option<String>,
    arg_file: Option<String>,
    flag_version: bool,
    flag_c: bool,
    flag_prompt: Option<String>,
    flag_port: Option<u16>,
    flag_log: Option<String>,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    init_logger(&args.flag_log);
    debug!("{:?}", args);

    if args.flag_version {
        println!("jobsh version {}", env!("CARGO_PKG_VERSION"));
    } else if args.flag_c || args.arg_file.is_some() {
        execute_from_command_string_or_file(&args);
    } else {
        execute_from_stdin(&args);
    }
}

fn init_logger(path: &Option<String>) {
    let log_path = match path.clone().map(PathBuf::from).or_else(default_log_path) {
        Some(log_path) => log_path,
        None => {
            eprintln!("jobsh: unable to find home directory, logging is disabled");
            return;
        }
    };

    let log_file = match fern::log_file(&log_path) {
        Ok(log_file) => log_file,
        Err(e) => {
            eprintln!("jobsh: {}: {}, logging is disabled", log_path.display(), e);
            return;
        }
    };

    let pid = Pid::this();
    let result = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Trace)
        .chain(log_file)
        .apply();
    if let Err(e) = result {
        eprintln!("jobsh: failed to initialize logging: {}", e);
    }
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOG_FILE_NAME))
}

fn configure(config: ShellConfig, args: &Args) -> ShellConfig {
    let config = match args.flag_prompt {
        Some(ref prompt) => config.with_prompt(prompt.as_str()),
        None => config,
    };

    match args.flag_port {
        Some(port) => config.with_http_port(port),
        None => config,
    }
}

fn execute_from_command_string_or_file(args: &Args) -> ! {
    let mut shell = Shell::new(configure(ShellConfig::noninteractive(), args));
    let mut stdout = io::stdout();

    let result = if let Some(ref command) = args.arg_command {
        shell
            .execute_command_string(command, &mut stdout)
            .map(|_| ())
    } else if let Some(ref file_path) = args.arg_file {
        shell.execute_commands_from_file(Path::new(file_path), &mut stdout)
    } else {
        unreachable!();
    };

    exit(result);
}

fn execute_from_stdin(args: &Args) -> ! {
    let is_terminal = atty::is(Stream::Stdin);
    let config = if is_terminal {
        ShellConfig::interactive(COMMAND_HISTORY_CAPACITY)
    } else {
        ShellConfig::noninteractive()
    };
    let mut shell = Shell::new(configure(config, args));
    let mut stdout = io::stdout();

    let result = match shell.config().command_history_capacity() {
        Some(capacity) if is_terminal => {
            let history_file = dirs::home_dir().map(|home| home.join(HISTORY_FILE_NAME));
            let mut editor = Editor::with_capacity(capacity);
            if let Some(ref history_file) = history_file {
                if let Err(e) = editor.load_history(history_file) {
                    warn!("failed to load history: {}", e);
                }
            } else {
                warn!("unable to get home directory");
            }

            let result = shell.execute_from(&mut editor, &mut stdout);

            if let Some(ref history_file) = history_file {
                if let Err(e) = editor.save_history(history_file) {
                    error!("failed to save history during shutdown: {}", e);
                }
            }
            result
        }
        _ => {
            let stdin = io::stdin();
            let mut reader = StreamReader::new(stdin.lock(), io::stdout());
            shell.execute_from(&mut reader, &mut stdout)
        }
    };

    exit(result);
}

fn exit(result: Result<()>) -> ! {
    if let Err(e) = result {
        error!("{}", e.display_chain());
        eprintln!("jobsh: {}", e.display_chain());
        process::exit(FAILURE_EXIT_STATUS);
    }

    process::exit(0);
}
