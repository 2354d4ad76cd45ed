//! Job Table
//!
//! Process-wide bookkeeping for background jobs, owned by the execution
//! context and mutated only by the evaluator that owns it. Background
//! entries persist until reaped; foreground jobs are waited inline and
//! never enter the table. Stages a foreground wait could not collect are
//! adopted as orphans and reaped here so no zombie survives.

use std::collections::BTreeMap;

use log::debug;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::exec::job::{Job, JobStatus};

#[derive(Debug, Default)]
pub struct JobTable {
    jobs: BTreeMap<usize, Job>,
    next_id: usize,
    orphans: Vec<Pid>,
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            jobs: BTreeMap::new(),
            next_id: 1,
            orphans: Vec::new(),
        }
    }

    /// Register a background job, returning its job id.
    pub fn register(&mut self, job: Job) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        debug!("job [{}] registered: {}", id, job.text());
        self.jobs.insert(id, job);
        id
    }

    /// Adopt pipeline stages a foreground wait left running.
    pub fn adopt(&mut self, pids: Vec<Pid>) {
        self.orphans.extend(pids);
    }

    /// Poll every job and orphan without blocking. Finished jobs are
    /// removed and returned as `(id, status, text)` for reporting.
    pub fn reap(&mut self) -> Vec<(usize, JobStatus, String)> {
        self.orphans.retain(|pid| {
            !matches!(
                waitpid(*pid, Some(WaitPidFlag::WNOHANG)),
                Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) | Err(_)
            )
        });

        let mut finished = Vec::new();
        self.jobs.retain(|id, job| {
            let status = job.poll();
            if status.is_done() {
                finished.push((*id, status, job.text().to_string()));
                false
            } else {
                true
            }
        });
        for (id, status, text) in &finished {
            debug!("job [{}] finished: {} ({})", id, status, text);
        }
        finished
    }

    /// Poll every job in place without removing finished entries, so a
    /// listing reports current statuses rather than spawn-time ones.
    pub fn refresh(&mut self) {
        for job in self.jobs.values_mut() {
            job.poll();
        }
    }

    /// Live jobs in id order, for the `jobs` builtin.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Job)> {
        self.jobs.iter().map(|(id, job)| (*id, job))
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::{Duration, Instant};

    fn spawn(parts: &[&str], background: bool) -> Job {
        let argv: Vec<String> = parts.iter().map(|s| s.to_string()).collect();
        Job::spawn(
            &[argv],
            &std::env::current_dir().unwrap(),
            &HashMap::new(),
            background,
            parts.join(" "),
        )
        .unwrap()
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut table = JobTable::new();
        let a = table.register(spawn(&["sleep", "0.2"], true));
        let b = table.register(spawn(&["sleep", "0.2"], true));
        assert_eq!((a, b), (1, 2));
        assert_eq!(table.len(), 2);

        // Drain so the test leaves no children behind.
        let deadline = Instant::now() + Duration::from_secs(5);
        while !table.is_empty() && Instant::now() < deadline {
            table.reap();
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(table.is_empty());
    }

    #[test]
    fn test_reap_reports_finished_jobs() {
        let mut table = JobTable::new();
        let id = table.register(spawn(&["true"], true));

        let deadline = Instant::now() + Duration::from_secs(5);
        let finished = loop {
            let finished = table.reap();
            if !finished.is_empty() {
                break finished;
            }
            assert!(Instant::now() < deadline, "job never reaped");
            std::thread::sleep(Duration::from_millis(20));
        };
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].0, id);
        assert_eq!(finished[0].1, JobStatus::Exited(0));
        assert!(table.is_empty());
    }

    #[test]
    fn test_refresh_updates_status_without_removing() {
        let mut table = JobTable::new();
        table.register(spawn(&["true"], true));

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            table.refresh();
            let (_, job) = table.iter().next().unwrap();
            if job.status().is_done() {
                assert_eq!(job.status(), JobStatus::Exited(0));
                break;
            }
            assert!(Instant::now() < deadline, "job never settled");
            std::thread::sleep(Duration::from_millis(20));
        }
        // Refresh lists, it does not reap.
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_orphaned_stage_is_reaped() {
        use nix::sys::signal::kill;

        // The last stage exits at once; the first outlives the wait and
        // becomes an orphan.
        let argvs = vec![
            vec!["sleep".to_string(), "0.3".to_string()],
            vec!["true".to_string()],
        ];
        let mut job = Job::spawn(
            &argvs,
            &std::env::current_dir().unwrap(),
            &HashMap::new(),
            false,
            "sleep 0.3 | true".into(),
        )
        .unwrap();
        assert_eq!(job.wait().unwrap(), JobStatus::Exited(0));

        let orphans = job.take_orphans();
        assert_eq!(orphans.len(), 1);
        let pid = orphans[0];

        let mut table = JobTable::new();
        table.adopt(orphans);
        let deadline = Instant::now() + Duration::from_secs(5);
        // kill(pid, None) keeps succeeding while the process is alive or
        // a zombie; it fails once reap has collected it.
        while kill(pid, None).is_ok() {
            table.reap();
            assert!(Instant::now() < deadline, "orphan never reaped");
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn test_running_job_stays_registered() {
        let mut table = JobTable::new();
        table.register(spawn(&["sleep", "0.3"], true));
        assert!(table.reap().is_empty());
        assert_eq!(table.len(), 1);

        let deadline = Instant::now() + Duration::from_secs(5);
        while !table.is_empty() && Instant::now() < deadline {
            table.reap();
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(table.is_empty());
    }
}
