use anyhow::Result;
use argh::FromArgs;
use run_commands::{Command, ExitStatusError, RunOptions};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(FromArgs)]
/// Run a command line without a shell: quoting and whitespace are handled by
/// an explicit tokenizer and the program is spawned directly. With no
/// command, an interactive prompt starts.
struct Args {
    /// log only the command banner, not its output
    #[argh(switch, short = 's')]
    silent: bool,

    /// run log verbosity: 0 quiet, 1 banner and stderr, 2 everything
    #[argh(option, short = 'v', default = "2")]
    verbosity: u8,

    /// working directory for the command
    #[argh(option)]
    cwd: Option<PathBuf>,

    /// extra directory to prepend to PATH (repeatable)
    #[argh(option)]
    path: Vec<PathBuf>,

    /// the command line to run
    #[argh(positional)]
    command: Option<String>,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let mut opts = RunOptions {
        silent: args.silent,
        verbosity: args.verbosity,
        extra_paths: args.path,
        ..RunOptions::default()
    };
    if let Some(cwd) = args.cwd {
        opts.cwd = cwd;
    }

    match args.command {
        Some(line) => run_once(&line, opts),
        None => repl(opts),
    }
}

/// Run a single command: stdin is forwarded to the child, the child's
/// stdout goes to our stdout, and a non-zero exit becomes our exit code.
fn run_once(line: &str, opts: RunOptions) -> Result<()> {
    let command = Command::with_options(line, opts);
    match command.exec(io::stdin()) {
        Ok(output) => {
            io::stdout().write_all(&output.stdout)?;
            Ok(())
        }
        Err(err) => {
            if let Some(exit) = err.downcast_ref::<ExitStatusError>() {
                eprintln!("{exit}");
                std::process::exit(exit.code);
            }
            Err(err)
        }
    }
}

/// Interactive loop: one command per line. Ctrl-C drops the current line,
/// Ctrl-D exits.
fn repl(opts: RunOptions) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("run> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                rl.add_history_entry(line.as_str())?;
                let command = Command::with_options(line.as_str(), opts.clone());
                match command.exec(io::empty()) {
                    Ok(output) => io::stdout().write_all(&output.stdout)?,
                    Err(err) => eprintln!("{err:#}"),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
