//! Process Execution
//!
//! The runtime half of the shell: spawning pipelines as jobs, wiring
//! their pipes, grouping their processes, and reaping them.

pub mod job;
pub mod table;

pub use job::{Job, JobStatus};
pub use table::JobTable;
