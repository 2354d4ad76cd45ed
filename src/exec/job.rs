//! Jobs: pipelines of OS processes under one process group
//!
//! A [`Job`] is the runtime unit of execution: one process per pipeline
//! stage, all placed in a fresh process group keyed by the first spawned
//! stage's pid so signals can target the whole job at once. For an
//! N-stage pipeline exactly N-1 pipes are created, all of them before
//! any stage runs, and every parent-side descriptor is closed once
//! spawning finishes.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command as OsCommand, Stdio};

use log::debug;
use nix::sys::signal::{killpg, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{pipe, Pid};

use crate::interpreter::RuntimeError;

/// Lifecycle status of a job (or one of its stages).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Stopped,
    Exited(i32),
    Signaled(Signal),
}

impl JobStatus {
    /// Whether the job has terminated.
    pub fn is_done(&self) -> bool {
        matches!(self, JobStatus::Exited(_) | JobStatus::Signaled(_))
    }

    /// The shell-visible exit code: 128+signal for signal deaths,
    /// following common shell convention.
    pub fn code(&self) -> i32 {
        match self {
            JobStatus::Running => 0,
            JobStatus::Stopped => 148,
            JobStatus::Exited(code) => *code,
            JobStatus::Signaled(signal) => 128 + *signal as i32,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Stopped => write!(f, "Stopped"),
            JobStatus::Exited(code) => write!(f, "Exit({})", code),
            JobStatus::Signaled(signal) => write!(f, "{}", signal),
        }
    }
}

fn wait_status_to_job(status: WaitStatus) -> Option<JobStatus> {
    match status {
        WaitStatus::Exited(_, code) => Some(JobStatus::Exited(code)),
        WaitStatus::Signaled(_, signal, _) => Some(JobStatus::Signaled(signal)),
        WaitStatus::Stopped(_, _) => Some(JobStatus::Stopped),
        _ => None,
    }
}

/// One pipeline stage: either a live child or an already-settled status
/// (spawn failures settle immediately).
#[derive(Debug)]
enum Stage {
    Running(Pid),
    Done(JobStatus),
}

/// The runtime record for one spawned pipeline.
#[derive(Debug)]
pub struct Job {
    pgid: Option<Pid>,
    stages: Vec<Stage>,
    status: JobStatus,
    background: bool,
    text: String,
}

impl Job {
    /// Spawn one process per argv, wired stdout-to-stdin in order, all in
    /// a new process group.
    ///
    /// A stage whose program cannot be found (or executed) settles as
    /// `Exited(127)` / `Exited(126)` with a diagnostic on stderr; its
    /// pipe ends are dropped so the neighbouring stages observe EOF. Any
    /// other spawn failure is a [`RuntimeError`] fatal to this job only.
    pub fn spawn(
        argvs: &[Vec<String>],
        cwd: &Path,
        env: &HashMap<String, String>,
        background: bool,
        text: String,
    ) -> Result<Job, RuntimeError> {
        let count = argvs.len();

        // All inter-stage pipes exist before the first stage runs.
        let mut pipes: Vec<(Option<OwnedFd>, Option<OwnedFd>)> =
            Vec::with_capacity(count.saturating_sub(1));
        for _ in 1..count {
            let (read, write) = pipe().map_err(RuntimeError::Pipe)?;
            pipes.push((Some(read), Some(write)));
        }

        let mut pgid: Option<Pid> = None;
        let mut stages = Vec::with_capacity(count);
        for (i, argv) in argvs.iter().enumerate() {
            if argv.is_empty() {
                stages.push(Stage::Done(JobStatus::Exited(0)));
                continue;
            }

            let mut command = OsCommand::new(&argv[0]);
            command.args(&argv[1..]).current_dir(cwd).envs(env);
            if i > 0 {
                if let Some(fd) = pipes[i - 1].0.take() {
                    command.stdin(Stdio::from(fd));
                }
            }
            if i + 1 < count {
                if let Some(fd) = pipes[i].1.take() {
                    command.stdout(Stdio::from(fd));
                }
            }
            // First stage opens the group; the rest join it.
            command.process_group(pgid.map_or(0, |p| p.as_raw()));

            match command.spawn() {
                Ok(child) => {
                    let pid = Pid::from_raw(child.id() as i32);
                    if pgid.is_none() {
                        pgid = Some(pid);
                    }
                    debug!("spawned {} pid={} pgid={:?}", argv[0], pid, pgid);
                    stages.push(Stage::Running(pid));
                }
                Err(e) => {
                    let status = match e.kind() {
                        io::ErrorKind::NotFound => {
                            eprintln!("shoal: {}: command not found", argv[0]);
                            JobStatus::Exited(127)
                        }
                        io::ErrorKind::PermissionDenied => {
                            eprintln!("shoal: {}: permission denied", argv[0]);
                            JobStatus::Exited(126)
                        }
                        _ => {
                            return Err(RuntimeError::Spawn {
                                command: argv[0].clone(),
                                source: e,
                            })
                        }
                    };
                    stages.push(Stage::Done(status));
                }
            }
        }

        // Dropping the pipe vector closes every descriptor the children
        // did not take; stages waiting on EOF would deadlock otherwise.
        drop(pipes);

        Ok(Job {
            pgid,
            stages,
            status: JobStatus::Running,
            background,
            text,
        })
    }

    /// The job's process-group id: the pid of its first spawned stage.
    pub fn pgid(&self) -> Option<Pid> {
        self.pgid
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    /// The command text this job was spawned for, for diagnostics.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Block until the designated stage - the last one - terminates, then
    /// sweep the earlier stages without blocking.
    pub fn wait(&mut self) -> Result<JobStatus, RuntimeError> {
        let status = match self.stages.last_mut() {
            None => JobStatus::Exited(0),
            Some(Stage::Done(status)) => *status,
            Some(stage) => {
                let pid = match stage {
                    Stage::Running(pid) => *pid,
                    Stage::Done(_) => unreachable!(),
                };
                let status = loop {
                    let waited = waitpid(pid, Some(WaitPidFlag::WUNTRACED))
                        .map_err(RuntimeError::Wait)?;
                    if let Some(status) = wait_status_to_job(waited) {
                        break status;
                    }
                };
                *stage = Stage::Done(status);
                status
            }
        };
        self.sweep();
        self.status = status;
        debug!("job '{}' waited: {}", self.text, status);
        Ok(status)
    }

    /// Non-blocking status check. The job settles only once every stage
    /// has been collected, and reports the last stage's status.
    pub fn poll(&mut self) -> JobStatus {
        self.sweep();
        let all_done = self
            .stages
            .iter()
            .all(|s| matches!(s, Stage::Done(status) if status.is_done()));
        if all_done {
            self.status = match self.stages.last() {
                Some(Stage::Done(status)) => *status,
                _ => JobStatus::Exited(0),
            };
        }
        self.status
    }

    /// Reap any stage that has terminated, without blocking.
    fn sweep(&mut self) {
        for stage in &mut self.stages {
            if let Stage::Running(pid) = stage {
                match waitpid(*pid, Some(WaitPidFlag::WNOHANG)) {
                    Ok(waited) => {
                        if let Some(status) = wait_status_to_job(waited) {
                            if status.is_done() {
                                *stage = Stage::Done(status);
                            }
                        }
                    }
                    // Already reaped, or never ours to reap.
                    Err(_) => *stage = Stage::Done(JobStatus::Exited(0)),
                }
            }
        }
    }

    /// Pids of stages still running after a wait. Ownership passes to the
    /// job table's orphan list so no zombie outlives the job record.
    pub fn take_orphans(&mut self) -> Vec<Pid> {
        self.sweep();
        let mut orphans = Vec::new();
        for stage in &mut self.stages {
            if let Stage::Running(pid) = stage {
                orphans.push(*pid);
                *stage = Stage::Done(self.status);
            }
        }
        orphans
    }

    /// Deliver SIGINT to this job's process group only; the shell's own
    /// control thread is never a member of it.
    pub fn interrupt(&self) -> Result<(), RuntimeError> {
        if let Some(pgid) = self.pgid {
            killpg(pgid, Signal::SIGINT).map_err(RuntimeError::Kill)?;
        }
        Ok(())
    }
}
