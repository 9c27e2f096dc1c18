//! revanneal problem representation
//!
//! This crate holds the data that flows through an annealing experiment:
//!
//! - **Problems**: [`IsingModel`] with linear biases and pairwise couplings
//!   keyed by solver qubit index
//! - **Schedules**: [`AnnealSchedule`] piecewise-linear `(t, s)` breakpoints,
//!   with builders for forward, paused and reverse anneals
//! - **Results**: [`SampleSet`] of [`SampleRecord`]s (assignment, energy,
//!   occurrence count)
//! - **Reference**: [`ExactSolver`] for the ground state of small problems
//!
//! # Example: a reverse anneal from a known state
//!
//! ```rust
//! use revanneal_ir::{AnnealSchedule, IsingModel, ReverseScheduleSpec, ScheduleLimits, SpinAssignment};
//!
//! let mut model = IsingModel::new();
//! model.add_coupling(0, 4, -1.0);
//! model.add_coupling(4, 1, 1.0);
//! model.add_bias(0, 0.5);
//!
//! let initial = SpinAssignment::all_up(&model.variables());
//! let energy = model.energy(&initial).unwrap();
//! assert_eq!(energy, -1.0 + 1.0 + 0.5);
//!
//! let schedule = AnnealSchedule::reverse(&ReverseScheduleSpec::new(0.45)).unwrap();
//! schedule.validate(&ScheduleLimits::default()).unwrap();
//! assert_eq!(schedule.len(), 4);
//! ```

pub mod error;
pub mod exact;
pub mod ising;
pub mod sample;
pub mod schedule;

pub use error::{IrError, IrResult};
pub use exact::{ExactSolver, GroundState, MAX_EXACT_VARIABLES};
pub use ising::{IsingModel, NodeId, QuboCoefficients};
pub use sample::{AnswerMode, SampleRecord, SampleSet, Spin, SpinAssignment, Timing};
pub use schedule::{
    AnnealSchedule, DEFAULT_RAMP_UP_TIME, MAX_RAMP_BACK_SLOPE, ReverseScheduleSpec, ScheduleKind,
    ScheduleLimits, SchedulePoint,
};
