//! Basic Dialect
//!
//! The deliberately tiny fallback language behind the `basic` bridge
//! tag: statements split on newlines and semicolons, words split on
//! whitespace. No quoting, no expansion, no operators. Each statement
//! runs as its own foreground job and the program's status is the last
//! statement's.

use crate::exec::Job;
use crate::interpreter::{ExecContext, ExitStatus, RuntimeError};

#[derive(Debug, Clone, PartialEq)]
pub struct BasicProgram {
    statements: Vec<Vec<String>>,
}

impl BasicProgram {
    /// Split text into statements and words. Parsing cannot fail; empty
    /// statements are dropped.
    pub fn parse(text: &str) -> Self {
        let statements = text
            .split(['\n', ';'])
            .map(|line| line.split_whitespace().map(str::to_string).collect())
            .filter(|argv: &Vec<String>| !argv.is_empty())
            .collect();
        BasicProgram { statements }
    }

    pub fn run(&self, ctx: &mut ExecContext) -> Result<ExitStatus, RuntimeError> {
        let mut last = ExitStatus::SUCCESS;
        for argv in &self.statements {
            let mut job = Job::spawn(
                std::slice::from_ref(argv),
                ctx.cwd(),
                &ctx.exported_env(),
                false,
                argv.join(" "),
            )?;
            last = job.wait()?.into();
            ctx.jobs_mut().adopt(job.take_orphans());
        }
        Ok(last)
    }
}
