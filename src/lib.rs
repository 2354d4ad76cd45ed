//! shoal - a POSIX-style command-shell core
//!
//! This library provides the non-interactive heart of a shell: a parser
//! that turns shell text into an AST, and an evaluator that walks the AST
//! to spawn, connect, and supervise OS processes with job-control
//! semantics. Line editing, completion, history, and prompt handling are
//! the business of an embedding interactive layer; it talks to this crate
//! through [`Shell`] or directly through [`Program`].

pub mod ast;
pub mod parser;
pub mod expansion;
pub mod exec;
pub mod interpreter;
pub mod bridge;
pub mod shell;

pub use ast::{Command, InterpreterKind, Program, Word};
pub use exec::{Job, JobStatus, JobTable};
pub use interpreter::{ExecContext, ExitStatus, RuntimeError};
pub use parser::{parse, ParseException};
pub use shell::{Shell, ShellError, ShellOptions};
