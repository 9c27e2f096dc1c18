//! Sampler trait.
//!
//! The [`Sampler`] trait is the seam between experiments and a remote
//! annealing solver:
//!
//! ```text
//!   properties() ──→ validate() ──→ submit() ──→ status() ──→ result()
//!    (sync, &ref)     (async)       (async)      (async)      (async)
//! ```
//!
//! | Method | Kind | Required | Returns |
//! |--------|------|----------|---------|
//! | `name()` | sync | yes | `&str` |
//! | `properties()` | sync | yes | `&SolverProperties` |
//! | `availability()` | async | yes | `HalResult<SamplerAvailability>` |
//! | `validate()` | async | provided | `HalResult<ValidationResult>` |
//! | `submit()` | async | yes | `HalResult<JobId>` |
//! | `status()` | async | yes | `HalResult<JobStatus>` |
//! | `result()` | async | yes | `HalResult<SampleSet>` |
//! | `cancel()` | async | yes | `HalResult<()>` |
//! | `wait()` | async | provided | `HalResult<SampleSet>` |
//! | `sample_ising()` | async | provided | `HalResult<SampleSet>` |

use std::time::Duration;

use async_trait::async_trait;
use revanneal_ir::{IsingModel, SampleSet};
use tracing::{debug, info};

use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::params::SampleParams;
use crate::properties::SolverProperties;

/// Polling policy used by [`Sampler::wait`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitPolicy {
    /// Delay before the second status poll.
    pub initial_interval: Duration,
    /// Upper bound on the delay between polls.
    pub max_interval: Duration,
    /// Factor applied to the delay after every poll.
    pub backoff: f64,
    /// Give up after this long.
    pub timeout: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(5),
            backoff: 1.5,
            timeout: Duration::from_secs(300),
        }
    }
}

impl WaitPolicy {
    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the initial and maximum poll intervals.
    pub fn with_intervals(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_interval = initial;
        self.max_interval = max.max(initial);
        self
    }

    /// Delay following `current`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        current.mul_f64(self.backoff.max(1.0)).min(self.max_interval)
    }
}

/// Trait for remote annealing samplers.
///
/// # Contract
///
/// - `properties()` is synchronous and infallible; implementations fetch
///   and cache properties at construction time.
/// - `submit()` validates locally before anything leaves the process.
/// - `result()` is only meaningful once `status()` reports `Completed`.
#[async_trait]
pub trait Sampler: Send + Sync {
    /// Solver name.
    fn name(&self) -> &str;

    /// Cached solver properties.
    fn properties(&self) -> &SolverProperties;

    /// Polling policy for [`Sampler::wait`].
    fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::default()
    }

    /// Check whether the solver accepts problems.
    async fn availability(&self) -> HalResult<SamplerAvailability>;

    /// Check a request against the solver without submitting it.
    async fn validate(
        &self,
        model: &IsingModel,
        params: &SampleParams,
    ) -> HalResult<ValidationResult> {
        match params.validate(model, self.properties()) {
            Ok(()) => Ok(ValidationResult::Valid),
            Err(
                e @ (HalError::InvalidProblem(_)
                | HalError::InvalidParameter(_)
                | HalError::InvalidSchedule(_)
                | HalError::Ir(_)),
            ) => Ok(ValidationResult::Invalid {
                reasons: vec![e.to_string()],
            }),
            Err(e) => Err(e),
        }
    }

    /// Submit a problem. The job starts in `Pending`.
    async fn submit(&self, model: &IsingModel, params: &SampleParams) -> HalResult<JobId>;

    /// Current status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Samples of a completed job.
    async fn result(&self, job_id: &JobId) -> HalResult<SampleSet>;

    /// Cancel a pending job.
    async fn cancel(&self, job_id: &JobId) -> HalResult<()>;

    /// Poll until the job finishes, backing off between polls.
    async fn wait(&self, job_id: &JobId) -> HalResult<SampleSet> {
        let policy = self.wait_policy();
        let started = tokio::time::Instant::now();
        let mut interval = policy.initial_interval;

        loop {
            match self.status(job_id).await? {
                JobStatus::Completed => return self.result(job_id).await,
                JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
                JobStatus::Cancelled => return Err(HalError::JobCancelled),
                status @ (JobStatus::Pending | JobStatus::InProgress) => {
                    if started.elapsed() >= policy.timeout {
                        return Err(HalError::Timeout(job_id.0.clone()));
                    }
                    debug!("job {} is {}, next poll in {:?}", job_id, status, interval);
                    tokio::time::sleep(interval).await;
                    interval = policy.next_interval(interval);
                }
            }
        }
    }

    /// Submit and wait: the blocking call of an interactive session.
    async fn sample_ising(
        &self,
        model: &IsingModel,
        params: &SampleParams,
    ) -> HalResult<SampleSet> {
        let job_id = self.submit(model, params).await?;
        info!(
            "submitted {} ({} variables, {} reads) to {}",
            job_id,
            model.num_variables(),
            params.num_reads,
            self.name()
        );
        let samples = self.wait(&job_id).await?;
        info!("job {} returned {} records", job_id, samples.len());
        Ok(samples)
    }
}

/// Solver availability.
#[derive(Debug, Clone)]
pub struct SamplerAvailability {
    /// Whether the solver is accepting problems.
    pub is_available: bool,
    /// Average solver load, 0 to 1, if known.
    pub load: Option<f64>,
    /// Human-readable status message.
    pub status_message: Option<String>,
}

impl SamplerAvailability {
    /// An online solver with the given load.
    pub fn online(load: Option<f64>) -> Self {
        Self {
            is_available: true,
            load,
            status_message: None,
        }
    }

    /// An offline solver.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            is_available: false,
            load: None,
            status_message: Some(reason.into()),
        }
    }
}

/// Result of checking a request against a solver.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// The request can be submitted as-is.
    Valid,
    /// The request cannot run on this solver.
    Invalid {
        /// Reasons the request is invalid.
        reasons: Vec<String>,
    },
}

impl ValidationResult {
    /// Check if the request is valid.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use revanneal_ir::SpinAssignment;

    /// Reports `Pending` for a fixed number of polls, then `final_status`.
    struct SlowSampler {
        properties: SolverProperties,
        polls_left: Mutex<u32>,
        final_status: JobStatus,
    }

    impl SlowSampler {
        fn new(polls: u32, final_status: JobStatus) -> Self {
            Self {
                properties: SolverProperties::from_graph(vec![0, 1], vec![[0, 1]]),
                polls_left: Mutex::new(polls),
                final_status,
            }
        }
    }

    #[async_trait]
    impl Sampler for SlowSampler {
        fn name(&self) -> &str {
            "slow"
        }

        fn properties(&self) -> &SolverProperties {
            &self.properties
        }

        async fn availability(&self) -> HalResult<SamplerAvailability> {
            Ok(SamplerAvailability::online(Some(0.0)))
        }

        async fn submit(&self, model: &IsingModel, params: &SampleParams) -> HalResult<JobId> {
            params.validate(model, &self.properties)?;
            Ok(JobId::new("job-1"))
        }

        async fn status(&self, _job_id: &JobId) -> HalResult<JobStatus> {
            let mut left = self.polls_left.lock().unwrap();
            if *left == 0 {
                return Ok(self.final_status.clone());
            }
            *left -= 1;
            Ok(JobStatus::Pending)
        }

        async fn result(&self, _job_id: &JobId) -> HalResult<SampleSet> {
            let sample = SpinAssignment::all_up(&[0, 1]);
            Ok(SampleSet::from_reads(vec![0, 1], [(sample, -1.0)]))
        }

        async fn cancel(&self, _job_id: &JobId) -> HalResult<()> {
            Ok(())
        }
    }

    fn model() -> IsingModel {
        let mut model = IsingModel::new();
        model.add_coupling(0, 1, -1.0);
        model
    }

    #[test]
    fn test_wait_policy_backoff_is_capped() {
        let policy = WaitPolicy::default();
        let mut interval = policy.initial_interval;
        for _ in 0..20 {
            interval = policy.next_interval(interval);
        }
        assert_eq!(interval, policy.max_interval);
        assert_eq!(
            policy.next_interval(Duration::from_millis(500)),
            Duration::from_millis(750)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sample_ising_polls_until_complete() {
        let sampler = SlowSampler::new(3, JobStatus::Completed);
        let samples = sampler
            .sample_ising(&model(), &SampleParams::new(1))
            .await
            .unwrap();
        assert_eq!(samples.total_reads(), 1);
        assert_eq!(*sampler.polls_left.lock().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_reports_failure() {
        let sampler = SlowSampler::new(1, JobStatus::Failed("bad problem".into()));
        let err = sampler.wait(&JobId::new("job-1")).await.unwrap_err();
        assert!(matches!(err, HalError::JobFailed(msg) if msg == "bad problem"));

        let sampler = SlowSampler::new(0, JobStatus::Cancelled);
        let err = sampler.wait(&JobId::new("job-1")).await.unwrap_err();
        assert!(matches!(err, HalError::JobCancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let sampler = SlowSampler::new(u32::MAX, JobStatus::Completed);
        let err = sampler.wait(&JobId::new("job-1")).await.unwrap_err();
        assert!(matches!(err, HalError::Timeout(id) if id == "job-1"));
    }

    #[tokio::test]
    async fn test_validate_collects_reasons() {
        let sampler = SlowSampler::new(0, JobStatus::Completed);
        assert!(sampler
            .validate(&model(), &SampleParams::new(1))
            .await
            .unwrap()
            .is_valid());

        let mut bad = model();
        bad.add_bias(7, 1.0);
        let result = sampler.validate(&bad, &SampleParams::new(1)).await.unwrap();
        match result {
            ValidationResult::Invalid { reasons } => assert!(reasons[0].contains("qubit 7")),
            ValidationResult::Valid => panic!("expected invalid"),
        }
    }

    #[test]
    fn test_availability() {
        assert!(SamplerAvailability::online(None).is_available);
        let offline = SamplerAvailability::unavailable("maintenance");
        assert!(!offline.is_available);
        assert_eq!(offline.status_message.as_deref(), Some("maintenance"));
    }
}
