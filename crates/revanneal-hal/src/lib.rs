//! revanneal sampler abstraction layer
//!
//! This crate provides the interface between annealing experiments and a
//! remote solver:
//! - A common [`Sampler`] trait for submitting problems and polling jobs
//! - [`SolverProperties`] describing the working graph, coefficient ranges
//!   and timing limits of a solver
//! - [`SampleParams`] with a local pre-flight against those properties
//! - Job lifecycle types ([`JobId`], [`JobStatus`], [`Job`])
//!
//! # Example: a reverse anneal request
//!
//! ```rust
//! use revanneal_hal::{ReverseAnnealParams, SampleParams, SolverProperties, REVERSE_ANNEAL_PARAMETERS};
//! use revanneal_ir::{IsingModel, ReverseScheduleSpec, SpinAssignment};
//!
//! let mut properties = SolverProperties::from_graph(vec![0, 1], vec![[0, 1]])
//!     .with_parameters(["num_reads", "answer_mode"])
//!     .with_parameters(REVERSE_ANNEAL_PARAMETERS);
//! properties.annealing_time_range = [0.02, 2000.0];
//!
//! let mut model = IsingModel::new();
//! model.add_coupling(0, 1, -1.0);
//!
//! let reverse = ReverseAnnealParams::new(
//!     &ReverseScheduleSpec::new(0.45),
//!     SpinAssignment::all_up(&model.variables()),
//! )
//! .unwrap();
//! let params = SampleParams::new(100).with_reverse_anneal(reverse);
//! params.validate(&model, &properties).unwrap();
//!
//! let wire = params.to_wire(properties.num_qubits).unwrap();
//! assert_eq!(wire["initial_state"], serde_json::json!([1, 1]));
//! ```
//!
//! # Implementing a Sampler
//!
//! ```ignore
//! use async_trait::async_trait;
//! use revanneal_hal::{HalResult, JobId, JobStatus, SampleParams, Sampler, SamplerAvailability, SolverProperties};
//! use revanneal_ir::{IsingModel, SampleSet};
//!
//! struct MySampler {
//!     properties: SolverProperties,
//! }
//!
//! #[async_trait]
//! impl Sampler for MySampler {
//!     fn name(&self) -> &str { "my_solver" }
//!     fn properties(&self) -> &SolverProperties { &self.properties }
//!     async fn availability(&self) -> HalResult<SamplerAvailability> { todo!() }
//!     async fn submit(&self, model: &IsingModel, params: &SampleParams) -> HalResult<JobId> { todo!() }
//!     async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> { todo!() }
//!     async fn result(&self, job_id: &JobId) -> HalResult<SampleSet> { todo!() }
//!     async fn cancel(&self, job_id: &JobId) -> HalResult<()> { todo!() }
//! }
//! ```

pub mod error;
pub mod job;
pub mod params;
pub mod properties;
pub mod sampler;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use params::{ReverseAnnealParams, SampleParams, UNUSED_QUBIT_STATE, validate_problem};
pub use properties::{REVERSE_ANNEAL_PARAMETERS, SolverInfo, SolverProperties, Topology};
pub use sampler::{Sampler, SamplerAvailability, ValidationResult, WaitPolicy};
