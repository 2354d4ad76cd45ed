//! Builtin Commands
//!
//! The handful of commands that must run inside the shell process
//! because they mutate the execution context: `cd`, `export`, `exit`,
//! `jobs`, and `:`. Dispatch happens after expansion and before path
//! lookup.

use log::debug;

use crate::interpreter::context::ExecContext;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::types::ExitStatus;

/// Run `argv` as a builtin if its name matches one. Returns `None` when
/// the command is not a builtin and should be spawned instead.
pub fn dispatch(
    argv: &[String],
    ctx: &mut ExecContext,
) -> Option<Result<ExitStatus, RuntimeError>> {
    let result = match argv[0].as_str() {
        ":" => Ok(ExitStatus::SUCCESS),
        "cd" => cd(argv, ctx),
        "exit" => exit(argv),
        "export" => export(argv, ctx),
        "jobs" => jobs(argv, ctx),
        _ => return None,
    };
    debug!("builtin {}", argv[0]);
    Some(result)
}

fn cd(argv: &[String], ctx: &mut ExecContext) -> Result<ExitStatus, RuntimeError> {
    match argv.len() {
        1 => ctx.cd(None),
        2 => ctx.cd(Some(&argv[1])),
        _ => {
            eprintln!("shoal: cd: too many arguments");
            return Ok(ExitStatus::new(1));
        }
    }
    .map(|_| ExitStatus::SUCCESS)
    .or_else(|e| match e {
        RuntimeError::Chdir { .. } => {
            eprintln!("shoal: {}", e);
            Ok(ExitStatus::new(1))
        }
        other => Err(other),
    })
}

fn exit(argv: &[String]) -> Result<ExitStatus, RuntimeError> {
    let code = match argv.len() {
        1 => 0,
        _ => argv[1].parse().unwrap_or(2),
    };
    Err(RuntimeError::ExitRequest(code))
}

fn export(argv: &[String], ctx: &mut ExecContext) -> Result<ExitStatus, RuntimeError> {
    let mut status = ExitStatus::SUCCESS;
    for arg in &argv[1..] {
        match arg.split_once('=') {
            Some((name, value)) if !name.is_empty() => {
                ctx.export(name, value);
            }
            None => {
                // `export NAME` marks an existing variable.
                if let Some(value) = ctx.var(arg) {
                    ctx.export(arg.clone(), value);
                }
            }
            _ => {
                eprintln!("shoal: export: '{}': not a valid identifier", arg);
                status = ExitStatus::new(1);
            }
        }
    }
    Ok(status)
}

fn jobs(_argv: &[String], ctx: &mut ExecContext) -> Result<ExitStatus, RuntimeError> {
    ctx.jobs_mut().refresh();
    for (id, job) in ctx.jobs().iter() {
        println!("[{}]\t{}\t{}", id, job.status(), job.text());
    }
    Ok(ExitStatus::SUCCESS)
}
