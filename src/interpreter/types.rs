//! Interpreter Types

use std::fmt;

use crate::exec::JobStatus;

/// The integer exit status a command evaluates to. Zero is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus(i32);

impl ExitStatus {
    pub const SUCCESS: ExitStatus = ExitStatus(0);

    pub fn new(code: i32) -> Self {
        ExitStatus(code)
    }

    pub fn code(&self) -> i32 {
        self.0
    }

    pub fn success(&self) -> bool {
        self.0 == 0
    }

    /// The status `!` maps this one to: the boolean complement.
    pub fn negate(&self) -> ExitStatus {
        if self.success() {
            ExitStatus(1)
        } else {
            ExitStatus(0)
        }
    }
}

impl From<JobStatus> for ExitStatus {
    fn from(status: JobStatus) -> Self {
        ExitStatus(status.code())
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negate() {
        assert_eq!(ExitStatus::new(0).negate(), ExitStatus::new(1));
        assert_eq!(ExitStatus::new(1).negate(), ExitStatus::new(0));
        assert_eq!(ExitStatus::new(127).negate(), ExitStatus::new(0));
    }

    #[test]
    fn test_from_job_status() {
        assert_eq!(ExitStatus::from(JobStatus::Exited(3)).code(), 3);
        assert_eq!(
            ExitStatus::from(JobStatus::Signaled(nix::sys::signal::Signal::SIGINT)).code(),
            130
        );
    }
}
