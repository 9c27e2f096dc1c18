//! In-memory sampler for exercising experiment code without a network.
//!
//! [`ScriptedSampler`] validates and records every request, then answers it
//! with a caller-supplied responder. It does not model annealing dynamics;
//! the responder decides what comes back.

use std::sync::Mutex;

use async_trait::async_trait;
use revanneal_ir::{IsingModel, SampleSet, SpinAssignment};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::error::{HalError, HalResult};
use crate::job::{Job, JobId, JobStatus};
use crate::params::SampleParams;
use crate::properties::SolverProperties;
use crate::sampler::{Sampler, SamplerAvailability};

type Responder = dyn Fn(&IsingModel, &SampleParams) -> HalResult<Vec<SpinAssignment>> + Send + Sync;

struct ScriptedJob {
    job: Job,
    result: HalResult<SampleSet>,
}

/// A sampler whose reads come from a closure.
pub struct ScriptedSampler {
    name: String,
    properties: SolverProperties,
    responder: Box<Responder>,
    jobs: Mutex<FxHashMap<String, ScriptedJob>>,
    requests: Mutex<Vec<SampleParams>>,
}

impl ScriptedSampler {
    /// Create a sampler; `responder` returns one assignment per read.
    pub fn new<F>(properties: SolverProperties, responder: F) -> Self
    where
        F: Fn(&IsingModel, &SampleParams) -> HalResult<Vec<SpinAssignment>> + Send + Sync + 'static,
    {
        Self {
            name: "scripted".into(),
            properties,
            responder: Box::new(responder),
            jobs: Mutex::new(FxHashMap::default()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reads echo `initial_state` when given, otherwise every spin is `-1`.
    pub fn echo(properties: SolverProperties) -> Self {
        Self::new(properties, |model, params| {
            let state = match params.initial_state {
                Some(ref state) => state.clone(),
                None => SpinAssignment::from_pairs(model.variables().into_iter().map(|v| (v, -1)))?,
            };
            Ok(vec![state; params.num_reads as usize])
        })
    }

    /// Set the reported solver name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Parameters of every accepted request, in submission order.
    pub fn requests(&self) -> Vec<SampleParams> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn respond(&self, model: &IsingModel, params: &SampleParams) -> HalResult<SampleSet> {
        let reads = (self.responder)(model, params)?;
        let mut records = Vec::with_capacity(reads.len());
        for sample in reads {
            let energy = model.energy(&sample)?;
            records.push((sample, energy));
        }
        let set = SampleSet::from_reads(model.variables(), records);
        Ok(match params.answer_mode {
            revanneal_ir::AnswerMode::Raw => set,
            revanneal_ir::AnswerMode::Histogram => set.aggregate(),
        })
    }
}

#[async_trait]
impl Sampler for ScriptedSampler {
    fn name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> &SolverProperties {
        &self.properties
    }

    async fn availability(&self) -> HalResult<SamplerAvailability> {
        Ok(SamplerAvailability::online(Some(0.0)))
    }

    async fn submit(&self, model: &IsingModel, params: &SampleParams) -> HalResult<JobId> {
        params.validate(model, &self.properties)?;

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let result = self.respond(model, params);
        let status = match result {
            Ok(_) => JobStatus::Completed,
            Err(ref e) => JobStatus::Failed(e.to_string()),
        };
        let mut job = Job::new(job_id.clone(), self.name.clone(), params.num_reads);
        job.update(status);

        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(params.clone());
        self.jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(job_id.0.clone(), ScriptedJob { job, result });

        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        jobs.get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<SampleSet> {
        let jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match jobs.get(&job_id.0) {
            Some(ScriptedJob { result: Ok(set), .. }) => Ok(set.clone().with_problem_id(job_id.0.clone())),
            Some(ScriptedJob { job, .. }) => Err(HalError::JobFailed(job.status.to_string())),
            None => Err(HalError::JobNotFound(job_id.0.clone())),
        }
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        entry.job.update(JobStatus::Cancelled);
        Ok(())
    }
}
