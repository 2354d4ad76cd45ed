//! Shell Session
//!
//! [`Shell`] is the embedding surface: one long-lived root context plus
//! the read-eval loop glue an interactive front end or `-c` runner
//! needs. Each `eval` call first reports finished background jobs, then
//! parses and runs one source string, remembering its status.

use std::path::PathBuf;

use log::{debug, info};

use crate::interpreter::{ExecContext, ExitStatus};

pub use crate::interpreter::ShellError;

/// Initial state for a [`Shell`].
#[derive(Debug, Default)]
pub struct ShellOptions {
    /// Starting directory; defaults to the process cwd.
    pub cwd: Option<PathBuf>,
    /// Variables set (not exported) before the first eval.
    pub vars: Vec<(String, String)>,
}

/// A shell session: the root execution context and the status of the
/// last evaluated program.
#[derive(Debug)]
pub struct Shell {
    ctx: ExecContext,
    last_status: ExitStatus,
}

impl Shell {
    pub fn new() -> Result<Self, ShellError> {
        Self::with_options(ShellOptions::default())
    }

    pub fn with_options(options: ShellOptions) -> Result<Self, ShellError> {
        let mut ctx = ExecContext::root()?;
        if let Some(cwd) = &options.cwd {
            ctx.cd(Some(&cwd.display().to_string()))?;
        }
        for (name, value) in options.vars {
            ctx.set_var(name, value);
        }
        Ok(Shell {
            ctx,
            last_status: ExitStatus::SUCCESS,
        })
    }

    /// Parse and run one source string to completion.
    ///
    /// Finished background jobs are reported before evaluation starts,
    /// matching the usual between-commands notification point.
    pub fn eval(&mut self, source: &str) -> Result<ExitStatus, ShellError> {
        self.reap();
        debug!("eval {} bytes", source.len());
        let program = crate::parser::parse(source)?;
        let status = program.run(&mut self.ctx)?;
        self.last_status = status;
        Ok(status)
    }

    /// Parse one source string and launch every top-level command
    /// without waiting.
    pub fn eval_background(&mut self, source: &str) -> Result<(), ShellError> {
        self.reap();
        let program = crate::parser::parse(source)?;
        program.run_background(&mut self.ctx)?;
        Ok(())
    }

    /// Poll background jobs and report the ones that finished.
    pub fn reap(&mut self) {
        for (id, status, text) in self.ctx.jobs_mut().reap() {
            info!("job [{}] finished: {}", id, status);
            eprintln!("[{}]\t{}\t{}", id, status, text);
        }
    }

    pub fn last_status(&self) -> ExitStatus {
        self.last_status
    }

    pub fn context(&self) -> &ExecContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ExecContext {
        &mut self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::RuntimeError;

    #[test]
    fn test_eval_returns_status() {
        let mut shell = Shell::new().unwrap();
        assert!(shell.eval("true").unwrap().success());
        assert_eq!(shell.eval("false").unwrap().code(), 1);
        assert_eq!(shell.last_status().code(), 1);
    }

    #[test]
    fn test_state_persists_across_evals() {
        let mut shell = Shell::new().unwrap();
        shell.eval("export SHOAL_SHELL_TEST=kept").unwrap();
        assert_eq!(
            shell.context().var("SHOAL_SHELL_TEST").as_deref(),
            Some("kept")
        );
    }

    #[test]
    fn test_options_seed_vars() {
        let mut shell = Shell::with_options(ShellOptions {
            cwd: None,
            vars: vec![("SHOAL_SEEDED".into(), "yes".into())],
        })
        .unwrap();
        let status = shell.eval("test $SHOAL_SEEDED = yes").unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_parse_error_is_recoverable() {
        let mut shell = Shell::new().unwrap();
        assert!(matches!(shell.eval("true &&"), Err(ShellError::Parse(_))));
        // The session survives a bad line.
        assert!(shell.eval("true").unwrap().success());
    }

    #[test]
    fn test_exit_surfaces_as_runtime_error() {
        let mut shell = Shell::new().unwrap();
        match shell.eval("exit 5") {
            Err(ShellError::Runtime(RuntimeError::ExitRequest(5))) => {}
            other => panic!("expected ExitRequest(5), got {:?}", other),
        }
    }
}
