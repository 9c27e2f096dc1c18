//! D-Wave sampler implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use revanneal_hal::{
    HalError, HalResult, Job, JobId, JobStatus, SampleParams, Sampler, SamplerAvailability,
    SolverInfo, SolverProperties, WaitPolicy,
};
use revanneal_ir::{AnswerMode, IsingModel, SampleSet};

use crate::api::{DEFAULT_ENDPOINT, ProblemStatus, ProblemSubmission, SapiClient};
use crate::codec::{decode_answer, encode_problem};
use crate::error::{DWaveError, DWaveResult};

/// Cap on cached jobs per sampler.
const MAX_CACHED_JOBS: usize = 1_000;

/// Connection settings for [`DWaveSampler`].
#[derive(Clone)]
pub struct DWaveConfig {
    /// SAPI endpoint.
    pub endpoint: String,
    /// SAPI token.
    pub token: String,
    /// Solver id; `None` picks the first online QPU.
    pub solver: Option<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Polling policy while waiting for answers.
    pub wait: WaitPolicy,
}

impl Default for DWaveConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: String::new(),
            solver: None,
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            wait: WaitPolicy::default(),
        }
    }
}

impl std::fmt::Debug for DWaveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DWaveConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .field("solver", &self.solver)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("wait", &self.wait)
            .finish()
    }
}

impl DWaveConfig {
    /// Settings from `DWAVE_API_TOKEN`, `DWAVE_API_ENDPOINT` and
    /// `DWAVE_API_SOLVER`.
    pub fn from_env() -> DWaveResult<Self> {
        let token = std::env::var("DWAVE_API_TOKEN").map_err(|_| DWaveError::MissingToken)?;
        let mut config = Self::default().with_token(token);
        if let Ok(endpoint) = std::env::var("DWAVE_API_ENDPOINT") {
            config.endpoint = endpoint;
        }
        config.solver = std::env::var("DWAVE_API_SOLVER").ok().filter(|s| !s.is_empty());
        Ok(config)
    }

    /// Set the token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Pin a solver.
    pub fn with_solver(mut self, solver: impl Into<String>) -> Self {
        self.solver = Some(solver.into());
        self
    }

    /// Set the polling policy.
    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }
}

/// Cached job entry.
struct CachedJob {
    job: Job,
    answer_mode: AnswerMode,
    offset: f64,
    result: Option<SampleSet>,
}

/// A D-Wave QPU solver reached through SAPI.
///
/// Properties are fetched once at construction; they drive local
/// validation and the `qp` encoding of every problem.
///
/// # Example
///
/// ```ignore
/// use revanneal_adapter_dwave::{DWaveConfig, DWaveSampler};
/// use revanneal_hal::{SampleParams, Sampler};
///
/// let sampler = DWaveSampler::connect(DWaveConfig::from_env()?).await?;
/// let samples = sampler.sample_ising(&model, &SampleParams::new(100)).await?;
/// ```
pub struct DWaveSampler {
    /// REST API client.
    client: SapiClient,
    /// Solver identifier.
    solver_id: String,
    /// Cached solver properties.
    properties: SolverProperties,
    /// Polling policy.
    wait: WaitPolicy,
    /// Cached job metadata and results.
    jobs: Arc<Mutex<FxHashMap<String, CachedJob>>>,
}

impl std::fmt::Debug for DWaveSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DWaveSampler")
            .field("client", &self.client)
            .field("solver_id", &self.solver_id)
            .field("num_qubits", &self.properties.num_qubits)
            .finish_non_exhaustive()
    }
}

impl DWaveSampler {
    /// Connect and select a solver.
    ///
    /// An explicit solver id is fetched directly; otherwise the first
    /// online QPU solver listed is used.
    #[instrument(skip(config), fields(endpoint = %config.endpoint))]
    pub async fn connect(config: DWaveConfig) -> DWaveResult<Self> {
        let client = SapiClient::with_timeouts(
            &config.endpoint,
            &config.token,
            config.request_timeout,
            config.connect_timeout,
        )?;

        let info = match config.solver {
            Some(ref id) => client.get_solver(id).await?,
            None => select_solver(client.list_solvers().await?)?,
        };
        info!(
            "Using solver {} ({} working qubits)",
            info.id,
            info.properties.qubits.len()
        );

        Ok(Self::with_client(client, info).with_wait_policy(config.wait))
    }

    /// Connect using [`DWaveConfig::from_env`].
    pub async fn from_env() -> DWaveResult<Self> {
        Self::connect(DWaveConfig::from_env()?).await
    }

    /// Wrap an existing client and solver description.
    pub fn with_client(client: SapiClient, info: SolverInfo) -> Self {
        Self {
            client,
            solver_id: info.id,
            properties: info.properties,
            wait: WaitPolicy::default(),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    /// Set the polling policy.
    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// The underlying client.
    pub fn client(&self) -> &SapiClient {
        &self.client
    }

    async fn update_cached_status(&self, job_id: &JobId, status: &JobStatus) {
        let mut jobs = self.jobs.lock().await;
        if let Some(cached) = jobs.get_mut(&job_id.0) {
            cached.job.update(status.clone());
        }
    }
}

/// Shrink the cache below `capacity` entries.
///
/// Finished jobs go first, then the oldest submissions. A dropped pending
/// job can still be polled; its answer decodes in histogram mode without
/// the model offset.
fn make_room(jobs: &mut FxHashMap<String, CachedJob>, capacity: usize) {
    if jobs.len() < capacity {
        return;
    }
    jobs.retain(|_, cached| !cached.job.status.is_terminal());
    if jobs.len() < capacity {
        return;
    }

    let mut by_age: Vec<_> = jobs
        .iter()
        .map(|(id, cached)| (cached.job.submitted_at, id.clone()))
        .collect();
    by_age.sort();
    let excess = jobs.len() + 1 - capacity;
    warn!("Job cache full, dropping {} unfinished jobs", excess);
    for (_, id) in by_age.into_iter().take(excess) {
        jobs.remove(&id);
    }
}

/// First online QPU solver in listing order.
pub fn select_solver(solvers: Vec<SolverInfo>) -> DWaveResult<SolverInfo> {
    solvers
        .into_iter()
        .find(|s| s.is_online() && s.is_qpu())
        .ok_or(DWaveError::NoSolverAvailable)
}

/// Map a SAPI status string to a [`JobStatus`].
pub fn parse_status(status: &ProblemStatus) -> JobStatus {
    match status.status.as_deref() {
        Some("PENDING") => JobStatus::Pending,
        Some("IN_PROGRESS") => JobStatus::InProgress,
        Some("COMPLETED") => JobStatus::Completed,
        Some("FAILED") => JobStatus::Failed(status.failure_message()),
        Some("CANCELLED") => JobStatus::Cancelled,
        other => {
            warn!("Unknown SAPI problem status {:?}, treating as pending", other);
            JobStatus::Pending
        }
    }
}

#[async_trait]
impl Sampler for DWaveSampler {
    fn name(&self) -> &str {
        &self.solver_id
    }

    fn properties(&self) -> &SolverProperties {
        &self.properties
    }

    fn wait_policy(&self) -> WaitPolicy {
        self.wait
    }

    #[instrument(skip(self))]
    async fn availability(&self) -> HalResult<SamplerAvailability> {
        match self.client.get_solver(&self.solver_id).await {
            Ok(info) if info.is_online() => Ok(SamplerAvailability::online(info.avg_load)),
            Ok(info) => Ok(SamplerAvailability::unavailable(
                info.status.unwrap_or_else(|| "offline".into()),
            )),
            Err(e @ (DWaveError::MissingToken | DWaveError::Unauthorized { .. })) => Err(e.into()),
            Err(e) => {
                debug!("SAPI availability check failed: {}", e);
                Ok(SamplerAvailability::unavailable(e.to_string()))
            }
        }
    }

    #[instrument(skip(self, model, params), fields(solver = %self.solver_id))]
    async fn submit(&self, model: &IsingModel, params: &SampleParams) -> HalResult<JobId> {
        params.validate(model, &self.properties)?;

        info!(
            "Submitting Ising problem to {}: {} variables, {} couplings, {} reads{}",
            self.solver_id,
            model.num_variables(),
            model.num_interactions(),
            params.num_reads,
            if params.is_reverse_anneal() { " (reverse anneal)" } else { "" }
        );

        let data = encode_problem(model, &self.properties)?;
        let wire = params.to_wire(self.properties.num_qubits)?;
        let submission = ProblemSubmission::ising(&self.solver_id, data, wire)
            .with_label(params.label.clone());

        let mut statuses = self.client.submit_problems(&[submission]).await?;
        let status = statuses
            .pop()
            .ok_or_else(|| HalError::SubmissionFailed("empty response from SAPI".into()))?;
        if status.is_rejected() {
            return Err(DWaveError::SubmissionRejected(status.failure_message()).into());
        }
        let id = status
            .id
            .clone()
            .ok_or_else(|| HalError::SubmissionFailed("SAPI returned no problem id".into()))?;

        let job_id = JobId::new(id);
        let job_status = parse_status(&status);
        info!("SAPI problem submitted: {} ({})", job_id, job_status);

        let result = match status.answer {
            Some(ref answer) if job_status.is_success() => Some(
                decode_answer(answer, params.answer_mode, model.offset())?
                    .with_problem_id(job_id.0.clone()),
            ),
            _ => None,
        };

        let mut job = Job::new(job_id.clone(), self.solver_id.clone(), params.num_reads);
        job.update(job_status);
        {
            let mut jobs = self.jobs.lock().await;
            make_room(&mut jobs, MAX_CACHED_JOBS);
            jobs.insert(
                job_id.0.clone(),
                CachedJob {
                    job,
                    answer_mode: params.answer_mode,
                    offset: model.offset(),
                    result,
                },
            );
        }

        Ok(job_id)
    }

    #[instrument(skip(self))]
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        {
            let jobs = self.jobs.lock().await;
            if let Some(cached) = jobs.get(&job_id.0) {
                if cached.job.status.is_terminal() {
                    return Ok(cached.job.status.clone());
                }
            }
        }

        let response = self
            .client
            .problem_status(&job_id.0)
            .await
            .map_err(|e| match e {
                DWaveError::ProblemNotFound(_) => HalError::JobNotFound(job_id.0.clone()),
                other => other.into(),
            })?;

        let status = parse_status(&response);
        self.update_cached_status(job_id, &status).await;
        Ok(status)
    }

    #[instrument(skip(self))]
    async fn result(&self, job_id: &JobId) -> HalResult<SampleSet> {
        let (answer_mode, offset) = {
            let jobs = self.jobs.lock().await;
            match jobs.get(&job_id.0) {
                Some(CachedJob {
                    result: Some(result),
                    ..
                }) => return Ok(result.clone()),
                Some(cached) => match cached.job.status {
                    JobStatus::Failed(ref msg) => {
                        return Err(DWaveError::ProblemFailed(msg.clone()).into());
                    }
                    JobStatus::Cancelled => return Err(HalError::JobCancelled),
                    _ => (cached.answer_mode, cached.offset),
                },
                // Problems submitted elsewhere: histogram mode, no offset.
                None => (AnswerMode::Histogram, 0.0),
            }
        };

        let response = self
            .client
            .problem_answer(&job_id.0)
            .await
            .map_err(|e| match e {
                DWaveError::ProblemNotFound(_) => HalError::JobNotFound(job_id.0.clone()),
                other => other.into(),
            })?;

        let set = decode_answer(&response.answer, answer_mode, offset)?.with_problem_id(job_id.0.clone());
        debug!("Decoded {} records for {}", set.len(), job_id);

        {
            let mut jobs = self.jobs.lock().await;
            if let Some(cached) = jobs.get_mut(&job_id.0) {
                cached.result = Some(set.clone());
                cached.job.update(JobStatus::Completed);
            }
        }

        Ok(set)
    }

    #[instrument(skip(self))]
    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let response = self
            .client
            .cancel_problem(&job_id.0)
            .await
            .map_err(|e| match e {
                DWaveError::ProblemNotFound(_) => HalError::JobNotFound(job_id.0.clone()),
                other => other.into(),
            })?;
        let status = parse_status(&response);
        info!("SAPI problem {} is now {}", job_id, status);
        self.update_cached_status(job_id, &status).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revanneal_hal::REVERSE_ANNEAL_PARAMETERS;

    fn info(id: &str, status: &str, category: &str) -> SolverInfo {
        SolverInfo {
            id: id.into(),
            status: Some(status.into()),
            description: None,
            avg_load: Some(0.2),
            properties: SolverProperties {
                category: Some(category.into()),
                ..SolverProperties::from_graph(vec![0, 1], vec![[0, 1]])
                    .with_parameters(["num_reads", "answer_mode"])
                    .with_parameters(REVERSE_ANNEAL_PARAMETERS)
            },
        }
    }

    fn sampler() -> DWaveSampler {
        let client = SapiClient::with_endpoint("http://127.0.0.1:9/sapi/v2", "test-token").unwrap();
        DWaveSampler::with_client(client, info("Advantage_system4.1", "ONLINE", "qpu"))
    }

    fn status(s: &str) -> ProblemStatus {
        ProblemStatus {
            id: Some("p".into()),
            status: Some(s.into()),
            error_message: Some("boom".into()),
            ..ProblemStatus::default()
        }
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(&status("PENDING")), JobStatus::Pending);
        assert_eq!(parse_status(&status("IN_PROGRESS")), JobStatus::InProgress);
        assert_eq!(parse_status(&status("COMPLETED")), JobStatus::Completed);
        assert_eq!(parse_status(&status("FAILED")), JobStatus::Failed("boom".into()));
        assert_eq!(parse_status(&status("CANCELLED")), JobStatus::Cancelled);
        assert_eq!(parse_status(&status("SOMETHING_NEW")), JobStatus::Pending);
    }

    #[test]
    fn test_select_solver_skips_offline_and_hybrid() {
        let solvers = vec![
            info("hybrid_binary_quadratic_model_version2", "ONLINE", "hybrid"),
            info("Advantage_system1.1", "OFFLINE", "qpu"),
            info("Advantage_system4.1", "ONLINE", "qpu"),
            info("Advantage2_prototype", "ONLINE", "qpu"),
        ];
        assert_eq!(select_solver(solvers).unwrap().id, "Advantage_system4.1");
        assert!(matches!(select_solver(vec![]), Err(DWaveError::NoSolverAvailable)));
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = DWaveConfig::default()
            .with_token("DEV-123")
            .with_solver("Advantage_system4.1");
        let debug = format!("{config:?}");
        assert!(!debug.contains("DEV-123"));
        assert!(debug.contains("Advantage_system4.1"));
    }

    #[test]
    fn test_sampler_uses_cached_properties() {
        let sampler = sampler();
        assert_eq!(sampler.name(), "Advantage_system4.1");
        assert_eq!(sampler.properties().num_qubits, 2);
        assert!(sampler.properties().supports_reverse_anneal());
    }

    #[tokio::test]
    async fn test_invalid_problem_fails_before_network() {
        let sampler = sampler();
        let mut model = IsingModel::new();
        model.add_coupling(0, 5, 1.0);
        let err = sampler.submit(&model, &SampleParams::new(10)).await.unwrap_err();
        assert!(matches!(err, HalError::InvalidProblem(_)));
    }

    fn cached(id: &str, status: JobStatus, age_secs: i64) -> (String, CachedJob) {
        let mut job = Job::new(JobId::new(id), "Advantage_system4.1", 10);
        job.update(status);
        job.submitted_at -= chrono::Duration::seconds(age_secs);
        let entry = CachedJob {
            job,
            answer_mode: AnswerMode::Raw,
            offset: 0.0,
            result: None,
        };
        (id.to_string(), entry)
    }

    #[tokio::test]
    async fn test_failed_job_result_reports_solver_message() {
        let sampler = sampler();
        sampler
            .jobs
            .lock()
            .await
            .extend([cached("p-failed", JobStatus::Failed("Problem timed out".into()), 0)]);

        // The endpoint is unreachable, so anything but a cache hit fails with a network error.
        let err = sampler.result(&JobId::new("p-failed")).await.unwrap_err();
        assert!(matches!(err, HalError::JobFailed(ref msg) if msg == "Problem timed out"));

        sampler
            .jobs
            .lock()
            .await
            .extend([cached("p-cancelled", JobStatus::Cancelled, 0)]);
        let err = sampler.result(&JobId::new("p-cancelled")).await.unwrap_err();
        assert!(matches!(err, HalError::JobCancelled));
    }

    #[test]
    fn test_make_room_drops_finished_jobs_first() {
        let mut jobs: FxHashMap<String, CachedJob> = [
            cached("done", JobStatus::Completed, 30),
            cached("old", JobStatus::Pending, 20),
            cached("new", JobStatus::InProgress, 10),
        ]
        .into_iter()
        .collect();

        make_room(&mut jobs, 3);
        assert_eq!(jobs.len(), 2);
        assert!(!jobs.contains_key("done"));
    }

    #[test]
    fn test_make_room_caps_unfinished_jobs() {
        let mut jobs: FxHashMap<String, CachedJob> = (0..5)
            .map(|i| cached(&format!("p{i}"), JobStatus::Pending, 100 - i))
            .collect();

        make_room(&mut jobs, 3);
        assert_eq!(jobs.len(), 2);
        // p0 is the oldest submission.
        assert!(!jobs.contains_key("p0"));
        assert!(!jobs.contains_key("p1"));
        assert!(!jobs.contains_key("p2"));

        let mut jobs: FxHashMap<String, CachedJob> = [cached("p", JobStatus::Pending, 0)].into_iter().collect();
        make_room(&mut jobs, 3);
        assert_eq!(jobs.len(), 1);
    }
}
