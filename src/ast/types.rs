//! Abstract Syntax Tree Types for the Shell Grammar
//!
//! A parsed unit of shell text is a [`Program`]: an ordered sequence of
//! [`Command`] nodes. `Program` and `Command` are mutually recursive;
//! every child is owned through a `Box`, nothing is shared, and nothing
//! is mutated after the parser returns.
//!
//! `Display` reconstructs runnable source text from a node. The evaluator
//! relies on this to re-enter compound pipeline stages in a child shell,
//! so the rendering preserves the original quoting of every word.

use std::fmt;

/// Root node: one parsed unit of shell text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    commands: Vec<Command>,
}

impl Program {
    pub fn new(commands: Vec<Command>) -> Self {
        Program { commands }
    }

    /// The top-level commands, in execution order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Union of all command forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// One executable invocation: `date --iso-8601`.
    Simple(Vec<Word>),

    /// Brace grouping run in the current execution context: `{ ls; pwd; }`.
    Compound(Box<Program>),

    /// Boolean negation of the inner command's exit status: `! grep x f`.
    Not(Box<Command>),

    /// Right runs only if left succeeds: `mkdir tmp && cd tmp`.
    And(Box<Command>, Box<Command>),

    /// Right runs only if left fails: `kill $PID || kill -9 $PID`.
    Or(Box<Command>, Box<Command>),

    /// Inner program runs in an isolated child context: `(cd /tmp && pwd)`.
    Subshell(Box<Program>),

    /// Two or more stages, stdout of each feeding stdin of the next:
    /// `cat f | grep x | wc -l`.
    Pipeline(Vec<Command>),

    /// Inner command launched without blocking the caller: `sleep 9 &`.
    Background(Box<Command>),

    /// A block of foreign-syntax text handed to another interpreter:
    /// `{#python print(1)}`.
    Bridgeshell(InterpreterKind, String),
}

impl Command {
    /// A short human-readable name for diagnostics and job listings.
    pub fn name(&self) -> String {
        match self {
            Command::Simple(words) => words
                .first()
                .map(|w| w.text.clone())
                .unwrap_or_default(),
            Command::Compound(_) => "{ ... }".into(),
            Command::Not(inner) => format!("! {}", inner.name()),
            Command::And(left, _) => left.name(),
            Command::Or(left, _) => left.name(),
            Command::Subshell(_) => "( ... )".into(),
            Command::Pipeline(stages) => stages
                .first()
                .map(|c| format!("{} | ...", c.name()))
                .unwrap_or_default(),
            Command::Background(inner) => format!("{} &", inner.name()),
            Command::Bridgeshell(kind, _) => format!("{{#{} ...}}", kind.tag()),
        }
    }
}

/// A single argument token as written, before expansion.
///
/// `text` has quote delimiters stripped; `raw` is the original lexeme and
/// is what source rendering emits. The quoting flags drive the expansion
/// policy: quoted words skip tilde substitution, single-quoted words skip
/// variable substitution as well.
///
/// The flags are per-word, not per-span: a word mixing quote styles, such
/// as `'$A'"$B"`, records the strongest quoting seen and its whole text
/// follows the single-quote policy, so `$B` is not expanded either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub raw: String,
    pub quoted: bool,
    pub single_quoted: bool,
}

impl Word {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Word {
            raw: text.clone(),
            text,
            quoted: false,
            single_quoted: false,
        }
    }
}

/// Tag selecting which interpreter parses and runs bridged text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpreterKind {
    /// The shell's own grammar, re-entered recursively.
    Primary,
    /// The second built-in grammar: lines of whitespace-split words.
    Alternate,
    /// A named external interpreter looked up in the bridge registry.
    Other(String),
}

impl InterpreterKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "posix" => InterpreterKind::Primary,
            "basic" => InterpreterKind::Alternate,
            other => InterpreterKind::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            InterpreterKind::Primary => "posix",
            InterpreterKind::Alternate => "basic",
            InterpreterKind::Other(name) => name,
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", command)?;
        }
        Ok(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Simple(words) => {
                for (i, word) in words.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", word.raw)?;
                }
                Ok(())
            }
            Command::Compound(program) => {
                if program.is_empty() {
                    write!(f, "{{ }}")
                } else {
                    write!(f, "{{ {}; }}", program)
                }
            }
            Command::Not(inner) => write!(f, "! {}", inner),
            Command::And(left, right) => write!(f, "{} && {}", left, right),
            Command::Or(left, right) => write!(f, "{} || {}", left, right),
            Command::Subshell(program) => write!(f, "({})", program),
            Command::Pipeline(stages) => {
                for (i, stage) in stages.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", stage)?;
                }
                Ok(())
            }
            Command::Background(inner) => write!(f, "{} &", inner),
            Command::Bridgeshell(kind, text) => {
                write!(f, "{{#{} {}}}", kind.tag(), text)
            }
        }
    }
}
