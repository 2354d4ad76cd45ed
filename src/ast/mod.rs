//! AST module for shell programs
//!
//! Contains the type definitions for the parsed representation of shell
//! text. The tree is immutable once parsing completes; child nodes are
//! boxed so ownership is exclusive and stack usage stays bounded.

pub mod types;

pub use types::{Command, InterpreterKind, Program, Word};
