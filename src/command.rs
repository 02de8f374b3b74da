//! Building and executing a command line without a shell.
//!
//! A [`Command`] wraps a template string. Executing it renders the template,
//! tokenizes the result into a program and arguments, and spawns the program
//! directly — each argument is passed as one opaque string, with no further
//! shell interpretation. Quote and whitespace handling therefore lives
//! entirely in the tokenizer, where it is explicit and auditable.

use crate::env::Environment;
use crate::logger::Logger;
use crate::template;
use crate::tokenizer;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Command as Process, ExitStatus, Stdio};
use std::thread;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line
/// tools.
pub type ExitCode = i32;

/// Options controlling where and how a [`Command`] runs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Working directory for the child process.
    pub cwd: PathBuf,
    /// Environment the child process sees.
    pub env: Environment,
    /// When set, caps the verbosity at 1 so child output is not logged.
    pub silent: bool,
    /// Log verbosity: 0 logs nothing, 1 logs the banner and child stderr,
    /// 2 additionally logs child stdout.
    pub verbosity: u8,
    /// Directories prepended to PATH for the child, ahead of the existing
    /// entries (e.g. a project-local bin directory).
    pub extra_paths: Vec<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        let env = Environment::new();
        Self {
            cwd: env.current_dir.clone(),
            env,
            silent: false,
            verbosity: 2,
            extra_paths: Vec::new(),
        }
    }
}

impl RunOptions {
    fn effective_verbosity(&self) -> u8 {
        if self.silent {
            self.verbosity.min(1)
        } else {
            self.verbosity
        }
    }
}

/// What a successful execution produced.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// Everything the child wrote to stdout.
    pub stdout: Vec<u8>,
    /// The child's exit code. Always 0 on this path; non-zero exits are
    /// reported as [`ExitStatusError`].
    pub status: ExitCode,
}

/// Error returned when the child ran but exited unsuccessfully.
///
/// Kept as a distinct type so callers can recover the exit code, e.g. to
/// propagate it as their own process exit status.
#[derive(Debug, Clone)]
pub struct ExitStatusError {
    /// The rendered command line that was executed.
    pub command: String,
    /// The child's exit code (128+signal for signal deaths on Unix).
    pub code: ExitCode,
}

impl fmt::Display for ExitStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command `{}` exited with code {}", self.command, self.code)
    }
}

impl std::error::Error for ExitStatusError {}

/// A runnable command built from a template string.
///
/// Example
/// ```no_run
/// use run_commands::Command;
/// use std::io;
///
/// let output = Command::new("echo hello world").exec(io::empty()).unwrap();
/// assert_eq!(output.stdout, b"hello world\n");
/// ```
pub struct Command {
    template: String,
    opts: RunOptions,
    vars: HashMap<String, String>,
}

impl Command {
    /// Create a command with default [`RunOptions`].
    pub fn new(template: impl Into<String>) -> Self {
        Self::with_options(template, RunOptions::default())
    }

    /// Create a command with explicit options.
    pub fn with_options(template: impl Into<String>, opts: RunOptions) -> Self {
        Self {
            template: template.into(),
            opts,
            vars: HashMap::new(),
        }
    }

    /// Bind a template variable for `<%= name %>` placeholders.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Execute the command, feeding it `stdin` and logging to stderr.
    ///
    /// See [`Command::exec_with_log`] for the full contract.
    pub fn exec<R: Read + Send>(&self, stdin: R) -> Result<ExecOutput> {
        self.exec_with_log(stdin, &mut io::stderr())
    }

    /// Execute the command, feeding it `stdin` and emitting the run log to
    /// `log_sink`.
    ///
    /// The template is rendered and tokenized first; any rendering or parse
    /// failure surfaces synchronously, before a process is spawned. The
    /// child's stdout is captured and returned; its stderr goes to the log.
    /// Logs are buffered and written to `log_sink` in one block after the
    /// child exits, so concurrent commands do not interleave their output.
    ///
    /// A non-zero exit status is an error carrying an [`ExitStatusError`].
    pub fn exec_with_log<R: Read + Send>(
        &self,
        stdin: R,
        log_sink: &mut dyn Write,
    ) -> Result<ExecOutput> {
        let line = template::render(&self.template, &self.vars)
            .with_context(|| format!("cannot render command `{}`", self.template))?;
        let parsed = tokenizer::tokenize(&line)
            .with_context(|| format!("cannot parse command `{line}`"))?;

        let mut env = self.opts.env.clone();
        env.prepend_paths(&self.opts.extra_paths);

        let mut child = Process::new(parsed.program())
            .args(parsed.args())
            .env_clear()
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&self.opts.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("cannot spawn `{}`", parsed.program()))?;

        let child_stdin = child.stdin.take().context("child stdin not piped")?;
        let mut child_stdout = child.stdout.take().context("child stdout not piped")?;
        let child_stderr = child.stderr.take().context("child stderr not piped")?;

        // Pump stdin and drain stderr on their own threads so a child that
        // fills one pipe while we block on another cannot deadlock us.
        let (stdout_buf, stderr_buf) = thread::scope(|scope| {
            scope.spawn(move || {
                let mut stdin = stdin;
                let mut child_stdin = child_stdin;
                // The child may exit without draining stdin; a broken pipe
                // here is not an error. Dropping child_stdin sends EOF.
                let _ = io::copy(&mut stdin, &mut child_stdin);
            });
            let stderr_pump = scope.spawn(move || {
                let mut child_stderr = child_stderr;
                let mut buf = Vec::new();
                let _ = child_stderr.read_to_end(&mut buf);
                buf
            });
            let mut out = Vec::new();
            let read_res = child_stdout.read_to_end(&mut out);
            let err = stderr_pump.join().unwrap_or_default();
            read_res.map(|_| (out, err))
        })
        .context("failed to read child output")?;

        let status = child.wait().context("failed to wait for child")?;

        let verbosity = self.opts.effective_verbosity();
        let mut logger = Logger::new(verbosity);
        let silenced = if verbosity < 2 { " # silenced" } else { "" };
        logger.log(1, &format!("$ {line}{silenced}"))?;
        logger.write(2, &stdout_buf)?;
        logger.write(1, &stderr_buf)?;
        logger.flush_to(log_sink)?;

        let code = exit_code(status);
        if code != 0 {
            return Err(ExitStatusError {
                command: line,
                code,
            }
            .into());
        }
        Ok(ExecOutput {
            stdout: stdout_buf,
            status: code,
        })
    }
}

impl fmt::Display for Command {
    /// The command template, unrendered.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::MemReader;

    fn exec_logged(command: &Command) -> (Result<ExecOutput>, String) {
        let mut log = Vec::new();
        let result = command.exec_with_log(io::empty(), &mut log);
        (result, String::from_utf8_lossy(&log).into_owned())
    }

    #[test]
    #[cfg(unix)]
    fn echo_round_trip() {
        let output = Command::new("echo hello world").exec(io::empty()).unwrap();
        assert_eq!(output.stdout, b"hello world\n");
        assert_eq!(output.status, 0);
    }

    #[test]
    #[cfg(unix)]
    fn quoted_argument_reaches_the_child_verbatim() {
        let output = Command::new("echo 'a  b'").exec(io::empty()).unwrap();
        assert_eq!(output.stdout, b"a  b\n");
    }

    #[test]
    #[cfg(unix)]
    fn stdin_is_piped_to_the_child() {
        let stdin = MemReader::new(b"line one\nline two\n".to_vec());
        let output = Command::new("cat").exec(stdin).unwrap();
        assert_eq!(output.stdout, b"line one\nline two\n");
    }

    #[test]
    #[cfg(unix)]
    fn nonzero_exit_is_reported_with_its_code() {
        let err = Command::new("false").exec(io::empty()).unwrap_err();
        let exit = err
            .downcast_ref::<ExitStatusError>()
            .expect("expected an ExitStatusError");
        assert_eq!(exit.code, 1);
        assert!(exit.to_string().contains("exited with code 1"));
    }

    #[test]
    fn parse_failure_prevents_any_spawn() {
        let err = Command::new("echo 'oops").exec(io::empty()).unwrap_err();
        let parse = err
            .downcast_ref::<tokenizer::ParseError>()
            .expect("expected a ParseError in the chain");
        assert_eq!(parse.expected(), "closing single quote");
    }

    #[test]
    fn unknown_template_variable_fails_before_spawning() {
        let err = Command::new("echo <%= nope %>").exec(io::empty()).unwrap_err();
        assert!(err.to_string().contains("cannot render"));
    }

    #[test]
    #[cfg(unix)]
    fn template_variables_are_rendered_before_tokenizing() {
        let output = Command::new("echo <%= greeting %>")
            .var("greeting", "hi")
            .exec(io::empty())
            .unwrap();
        assert_eq!(output.stdout, b"hi\n");
    }

    #[test]
    #[cfg(unix)]
    fn log_contains_the_banner_and_child_output() {
        let (result, log) = exec_logged(&Command::new("echo logged"));
        result.unwrap();
        assert!(log.starts_with("$ echo logged\n"), "log was: {log:?}");
        assert!(log.contains("logged\n"));
    }

    #[test]
    #[cfg(unix)]
    fn silent_mode_marks_the_banner_and_drops_stdout() {
        let opts = RunOptions {
            silent: true,
            ..RunOptions::default()
        };
        let (result, log) = exec_logged(&Command::with_options("echo quiet", opts));
        result.unwrap();
        assert!(log.contains("# silenced"), "log was: {log:?}");
        assert!(!log.contains("quiet\n"), "stdout should not be logged: {log:?}");
    }

    #[test]
    #[cfg(unix)]
    fn verbosity_zero_logs_nothing() {
        let opts = RunOptions {
            verbosity: 0,
            ..RunOptions::default()
        };
        let (result, log) = exec_logged(&Command::with_options("echo mute", opts));
        result.unwrap();
        assert_eq!(log, "");
    }

    #[test]
    #[cfg(unix)]
    fn child_stderr_is_logged_even_without_stdout_logging() {
        let opts = RunOptions {
            silent: true,
            ..RunOptions::default()
        };
        let command = Command::with_options("sh -c 'echo warn >&2'", opts);
        let (result, log) = exec_logged(&command);
        result.unwrap();
        assert!(log.contains("warn\n"), "stderr should be logged: {log:?}");
    }

    #[test]
    #[cfg(unix)]
    fn cwd_option_sets_the_child_working_directory() {
        let opts = RunOptions {
            cwd: PathBuf::from("/"),
            ..RunOptions::default()
        };
        let output = Command::with_options("pwd", opts).exec(io::empty()).unwrap();
        assert_eq!(output.stdout, b"/\n");
    }

    #[test]
    #[cfg(unix)]
    fn extra_paths_resolve_project_local_binaries() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let bin_dir = std::env::temp_dir().join(format!("run_commands_{}_bin", std::process::id()));
        let _ = fs::remove_dir_all(&bin_dir);
        fs::create_dir_all(&bin_dir).expect("create temp bin dir");
        let script = bin_dir.join("local-tool");
        fs::write(&script, "#!/bin/sh\necho from-extra\n").expect("write script");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod script");

        let opts = RunOptions {
            extra_paths: vec![bin_dir.clone()],
            ..RunOptions::default()
        };
        let output = Command::with_options("local-tool", opts)
            .exec(io::empty())
            .unwrap();
        assert_eq!(output.stdout, b"from-extra\n");

        let _ = fs::remove_dir_all(bin_dir);
    }

    #[test]
    fn display_returns_the_unrendered_template() {
        let command = Command::new("cat <%= file %>").var("file", "x");
        assert_eq!(command.to_string(), "cat <%= file %>");
    }
}
