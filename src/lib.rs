//! Run shell-style command lines without a shell.
//!
//! The one real piece of machinery here is the [`tokenizer`]: it splits a
//! command line into a program name and arguments under a deliberately
//! narrow quoting grammar (bare words, fully single-quoted words, fully
//! double-quoted words — nothing else). Everything around it is thin glue:
//! template rendering, an environment snapshot, a verbosity-gated logger,
//! and the child-process plumbing in [`command`].
//!
//! The point of tokenizing up front is that the spawned process receives
//! each argument as a single opaque string — quote and whitespace handling
//! happens in one explicit, auditable place instead of in a subshell.

pub mod command;
pub mod env;
pub mod io_adapters;
pub mod logger;
pub mod template;
pub mod tokenizer;

pub use command::{Command, ExecOutput, ExitCode, ExitStatusError, RunOptions};
pub use tokenizer::{tokenize, ParseError, ParseResult, Token};
