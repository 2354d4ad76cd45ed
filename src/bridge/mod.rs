//! Interpreter Bridge
//!
//! `{#tag ...}` blocks hand their raw text to another interpreter. Two
//! tags are handled in-process: `posix` re-parses the text as a regular
//! program and runs it in a subshell context, and `basic` runs the
//! line-oriented fallback dialect. Every other tag resolves through the
//! registry to an external interpreter: the text is written to a
//! throwaway script with a `#!` header and run as a foreground job.

mod basic;

pub use self::basic::BasicProgram;

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use lazy_static::lazy_static;
use log::debug;

use crate::ast::InterpreterKind;
use crate::exec::Job;
use crate::interpreter::{ExecContext, ExitStatus, RuntimeError};

lazy_static! {
    static ref REGISTRY: Mutex<HashMap<String, String>> = {
        let mut map = HashMap::new();
        map.insert("sh".into(), "/bin/sh".into());
        for name in ["ruby", "node", "python", "racket"] {
            map.insert(name.into(), format!("/usr/bin/env {}", name));
        }
        Mutex::new(map)
    };
}

static SCRIPT_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Register (or replace) the interpreter line used for a bridge tag.
pub fn register(tag: impl Into<String>, interpreter: impl Into<String>) {
    REGISTRY
        .lock()
        .expect("interpreter registry poisoned")
        .insert(tag.into(), interpreter.into());
}

/// Run one bridge block's text under the interpreter its tag names.
pub fn dispatch(
    kind: &InterpreterKind,
    text: &str,
    ctx: &mut ExecContext,
) -> Result<ExitStatus, RuntimeError> {
    debug!("bridge {}: {} bytes", kind.tag(), text.len());
    match kind {
        InterpreterKind::Primary => {
            let program = crate::parser::parse(text)?;
            let mut child = ctx.subshell();
            // `exit` inside the bridged program ends that subshell
            // context only.
            match program.run(&mut child) {
                Err(RuntimeError::ExitRequest(code)) => Ok(ExitStatus::new(code)),
                other => other,
            }
        }
        InterpreterKind::Alternate => BasicProgram::parse(text).run(ctx),
        InterpreterKind::Other(tag) => {
            let interpreter = REGISTRY
                .lock()
                .expect("interpreter registry poisoned")
                .get(tag)
                .cloned()
                .ok_or_else(|| RuntimeError::UnknownInterpreter(tag.clone()))?;
            run_external(&interpreter, text, ctx)
        }
    }
}

/// Write the text as an executable `#!` script and run it to completion.
fn run_external(
    interpreter: &str,
    text: &str,
    ctx: &mut ExecContext,
) -> Result<ExitStatus, RuntimeError> {
    let path = script_path();
    fs::write(&path, format!("#!{}\n{}\n", interpreter, text))?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;

    let argv = vec![path.to_string_lossy().into_owned()];
    let result = (|| {
        let mut job = Job::spawn(
            &[argv],
            ctx.cwd(),
            &ctx.exported_env(),
            false,
            interpreter.to_string(),
        )?;
        let status = job.wait()?;
        ctx.jobs_mut().adopt(job.take_orphans());
        Ok(status.into())
    })();
    fs::remove_file(&path).ok();
    result
}

/// A per-invocation unique path in the temp directory; the counter keeps
/// nested bridge blocks within one process apart.
fn script_path() -> PathBuf {
    let n = SCRIPT_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        ".shoal_bridge-{}-{}",
        std::process::id(),
        n
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ExecContext {
        ExecContext::root().unwrap().subshell()
    }

    #[test]
    fn test_primary_reenters_the_shell_grammar() {
        let status = dispatch(&InterpreterKind::Primary, "false || true", &mut ctx()).unwrap();
        assert!(status.success());
        let status = dispatch(&InterpreterKind::Primary, "true && false", &mut ctx()).unwrap();
        assert_eq!(status.code(), 1);
    }

    #[test]
    fn test_primary_runs_in_subshell_context() {
        let mut ctx = ctx();
        let before = ctx.cwd().to_path_buf();
        dispatch(&InterpreterKind::Primary, "cd /", &mut ctx).unwrap();
        assert_eq!(ctx.cwd(), before);
    }

    #[test]
    fn test_primary_contains_exit() {
        let mut ctx = ctx();
        let status = dispatch(&InterpreterKind::Primary, "exit 3", &mut ctx).unwrap();
        assert_eq!(status.code(), 3);
        // The surrounding evaluation continues afterwards.
        let status = dispatch(&InterpreterKind::Primary, "true", &mut ctx).unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_alternate_runs_lines() {
        let status = dispatch(&InterpreterKind::Alternate, "true\nfalse", &mut ctx()).unwrap();
        assert_eq!(status.code(), 1);
    }

    #[test]
    fn test_external_sh_exit_code() {
        let status =
            dispatch(&InterpreterKind::Other("sh".into()), "exit 4", &mut ctx()).unwrap();
        assert_eq!(status.code(), 4);
    }

    #[test]
    fn test_unknown_tag_errors() {
        let kind = InterpreterKind::Other("shoal-no-such-lang".into());
        match dispatch(&kind, "whatever", &mut ctx()) {
            Err(RuntimeError::UnknownInterpreter(tag)) => {
                assert_eq!(tag, "shoal-no-such-lang");
            }
            other => panic!("expected UnknownInterpreter, got {:?}", other),
        }
    }

    #[test]
    fn test_registered_tag_resolves() {
        register("shoal-test-sh", "/bin/sh");
        let kind = InterpreterKind::Other("shoal-test-sh".into());
        let status = dispatch(&kind, "exit 0", &mut ctx()).unwrap();
        assert!(status.success());
    }
}
