//! Interpreter - AST Execution Engine
//!
//! The evaluator walks a parsed [`crate::ast::Program`] and turns each
//! command into jobs, applying sequencing, short-circuit, negation, and
//! backgrounding semantics. Execution state (working directory, shell
//! variables, job table) travels in an explicit [`ExecContext`] rather
//! than ambient globals; subshells evaluate against a derived child
//! context that is discarded without write-back.

pub mod builtins;
pub mod context;
pub mod errors;
pub mod interpreter;
pub mod types;

pub use context::ExecContext;
pub use errors::{RuntimeError, ShellError};
pub use types::ExitStatus;
