//! Interpreter Errors
//!
//! Three kinds of failure cross the crate boundary: Read (could not
//! obtain program text), Parse (malformed syntax, with position), and
//! Runtime (process spawn/wait/signal failures and friends). Parse and
//! Runtime errors are recovered at the boundary of one top-level command;
//! they never terminate the shell process itself.

use thiserror::Error;

use crate::parser::ParseException;

/// Failures while evaluating a parsed program.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to create pipe: {0}")]
    Pipe(#[source] nix::Error),

    #[error("{command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("wait failed: {0}")]
    Wait(#[source] nix::Error),

    #[error("failed to signal job: {0}")]
    Kill(#[source] nix::Error),

    #[error("cd: {path}: {source}")]
    Chdir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}: no such interpreter")]
    UnknownInterpreter(String),

    #[error("background '&' is not allowed inside a pipeline stage")]
    BackgroundStage,

    #[error("bridged program: {0}")]
    BridgeParse(#[from] ParseException),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Not a failure: the `exit` builtin requesting shell termination.
    /// Carried as an error so it unwinds evaluation; the embedding loop
    /// maps it to process exit.
    #[error("exit {0}")]
    ExitRequest(i32),
}

/// Top-level error type the embedding layer sees.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),

    #[error("{0}")]
    Parse(#[from] ParseException),

    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}
