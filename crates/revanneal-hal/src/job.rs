//! Submitted problems and their status.
//!
//! A problem is `Pending` in the solver queue, `InProgress` while it is
//! sampled, then ends `Completed`, `Failed` or `Cancelled`. An end state
//! never changes once reached.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a submitted problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Wrap a sampler-assigned problem id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a problem is in the solver's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting in the solver queue.
    Pending,
    /// Being sampled.
    InProgress,
    /// Finished; the answer is available.
    Completed,
    /// Rejected or failed by the solver, with its message.
    Failed(String),
    /// Cancelled before an answer was produced.
    Cancelled,
}

impl JobStatus {
    /// `Completed`, `Failed` or `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::InProgress)
    }

    /// The answer can be fetched.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => f.write_str("pending"),
            JobStatus::InProgress => f.write_str("in progress"),
            JobStatus::Completed => f.write_str("completed"),
            JobStatus::Failed(msg) => write!(f, "failed: {msg}"),
            JobStatus::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Sampler-side record of a submitted problem.
#[derive(Debug, Clone)]
pub struct Job {
    /// Problem id.
    pub id: JobId,
    /// Last status seen.
    pub status: JobStatus,
    /// Solver the problem went to.
    pub solver: String,
    /// Reads requested.
    pub num_reads: u32,
    /// When the problem was submitted.
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    /// A `Pending` job submitted now.
    pub fn new(id: JobId, solver: impl Into<String>, num_reads: u32) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            solver: solver.into(),
            num_reads,
            submitted_at: Utc::now(),
        }
    }

    /// Record a newer status.
    ///
    /// Terminal statuses stick, and a late `Pending` does not undo
    /// `InProgress`.
    pub fn update(&mut self, status: JobStatus) {
        let stale = self.status.is_terminal()
            || (self.status == JobStatus::InProgress && status == JobStatus::Pending);
        if !stale {
            self.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed("error".into()).is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert_eq!(JobStatus::Failed("bad h".into()).to_string(), "failed: bad h");
    }

    #[test]
    fn test_update_never_moves_backwards() {
        let mut job = Job::new(JobId::new("prob-123"), "Advantage_system4.1", 1000);
        assert_eq!(job.status, JobStatus::Pending);

        job.update(JobStatus::InProgress);
        job.update(JobStatus::Pending);
        assert_eq!(job.status, JobStatus::InProgress);

        job.update(JobStatus::Completed);
        job.update(JobStatus::Cancelled);
        assert_eq!(job.status, JobStatus::Completed);
    }
}
