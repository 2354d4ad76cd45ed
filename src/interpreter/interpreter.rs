//! Evaluator
//!
//! Implements `run`/`run_background` for [`Program`] and [`Command`].
//! Each command variant maps onto job execution:
//!
//! - `Simple` expands its words, dispatches builtins, or spawns and
//!   waits one process
//! - `And`/`Or` short-circuit on the left status; `Not` complements
//! - `Compound` shares the caller's context, `Subshell` gets a discarded
//!   copy
//! - `Pipeline` becomes one job with a process per stage; a non-simple
//!   stage re-enters the shell binary so it runs in its own context with
//!   pipeable stdio
//! - `Background` spawns without waiting and registers in the job table
//! - `Bridgeshell` hands its text to the bridge dispatcher

use log::debug;

use crate::ast::{Command, Program};
use crate::bridge;
use crate::exec::Job;
use crate::expansion::expand_argv;
use crate::interpreter::builtins;
use crate::interpreter::context::ExecContext;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::types::ExitStatus;

impl Program {
    /// Evaluate every top-level command in order; the program's status is
    /// the last command's (empty program: success).
    pub fn run(&self, ctx: &mut ExecContext) -> Result<ExitStatus, RuntimeError> {
        let mut last = ExitStatus::SUCCESS;
        for command in self.commands() {
            last = command.run(ctx)?;
        }
        Ok(last)
    }

    /// Launch every top-level command without waiting.
    pub fn run_background(&self, ctx: &mut ExecContext) -> Result<(), RuntimeError> {
        for command in self.commands() {
            command.run_background(ctx)?;
        }
        Ok(())
    }
}

impl Command {
    /// Evaluate this command to an exit status.
    pub fn run(&self, ctx: &mut ExecContext) -> Result<ExitStatus, RuntimeError> {
        debug!("eval: {}", self);
        match self {
            Command::Simple(words) => {
                let argv = expand_argv(words, ctx);
                if argv.is_empty() {
                    return Ok(ExitStatus::SUCCESS);
                }
                if let Some(result) = builtins::dispatch(&argv, ctx) {
                    return result;
                }
                run_job(vec![argv], self.name(), ctx)
            }
            Command::Compound(program) => program.run(ctx),
            Command::Not(inner) => Ok(inner.run(ctx)?.negate()),
            Command::And(left, right) => {
                let status = left.run(ctx)?;
                if status.success() {
                    right.run(ctx)
                } else {
                    Ok(status)
                }
            }
            Command::Or(left, right) => {
                let status = left.run(ctx)?;
                if status.success() {
                    Ok(status)
                } else {
                    right.run(ctx)
                }
            }
            Command::Subshell(program) => {
                let mut child = ctx.subshell();
                // `exit` terminates the subshell context, not the shell:
                // the parent observes it as a plain status.
                match program.run(&mut child) {
                    Err(RuntimeError::ExitRequest(code)) => Ok(ExitStatus::new(code)),
                    other => other,
                }
            }
            Command::Pipeline(stages) => {
                let mut argvs = Vec::with_capacity(stages.len());
                for stage in stages {
                    argvs.push(stage_argv(stage, ctx)?);
                }
                run_job(argvs, self.name(), ctx)
            }
            Command::Background(inner) => {
                inner.run_background(ctx)?;
                Ok(ExitStatus::SUCCESS)
            }
            Command::Bridgeshell(kind, text) => bridge::dispatch(kind, text, ctx),
        }
    }

    /// Launch this command's job without waiting for it; the job is
    /// registered in the context's job table for later polling.
    pub fn run_background(&self, ctx: &mut ExecContext) -> Result<(), RuntimeError> {
        let argvs = match self {
            Command::Background(inner) => return inner.run_background(ctx),
            Command::Pipeline(stages) => {
                let mut argvs = Vec::with_capacity(stages.len());
                for stage in stages {
                    argvs.push(stage_argv(stage, ctx)?);
                }
                argvs
            }
            other => vec![stage_argv(other, ctx)?],
        };

        let job = Job::spawn(
            &argvs,
            ctx.cwd(),
            &ctx.exported_env(),
            true,
            self.name(),
        )?;
        let pgid = job.pgid();
        let id = ctx.jobs_mut().register(job);
        if let Some(pgid) = pgid {
            eprintln!("[{}]\t{}", id, pgid);
        }
        Ok(())
    }
}

/// Spawn a foreground job, wait for its designated stage, and hand any
/// straggler stages to the job table so they are reaped later.
fn run_job(
    argvs: Vec<Vec<String>>,
    name: String,
    ctx: &mut ExecContext,
) -> Result<ExitStatus, RuntimeError> {
    let mut job = Job::spawn(&argvs, ctx.cwd(), &ctx.exported_env(), false, name)?;
    let status = job.wait()?;
    ctx.jobs_mut().adopt(job.take_orphans());
    Ok(status.into())
}

/// The argv one pipeline stage contributes to its job.
///
/// A simple command is its expanded words. Any other form re-enters the
/// shell binary with `-c`, which gives the stage its own subshell-like
/// context while keeping its stdio wirable into the pipe chain.
fn stage_argv(command: &Command, ctx: &ExecContext) -> Result<Vec<String>, RuntimeError> {
    match command {
        Command::Simple(words) => Ok(expand_argv(words, ctx)),
        Command::Background(_) => Err(RuntimeError::BackgroundStage),
        other => {
            let exe = std::env::current_exe()?;
            Ok(vec![
                exe.to_string_lossy().into_owned(),
                "-c".into(),
                other.to_string(),
            ])
        }
    }
}
