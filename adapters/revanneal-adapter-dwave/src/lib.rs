//! D-Wave adapter for revanneal
//!
//! This crate implements [`revanneal_hal::Sampler`] on top of the D-Wave
//! Solver API (SAPI, `https://na-west-1.cloud.dwavesys.com/sapi/v2`).
//! Problems are submitted in the `qp` binary format and answers are decoded
//! into [`revanneal_ir::SampleSet`]s with the problem offset restored.
//!
//! # Authentication
//!
//! ```bash
//! export DWAVE_API_TOKEN="DEV-..."
//! # optional
//! export DWAVE_API_ENDPOINT="https://eu-central-1.cloud.dwavesys.com/sapi/v2"
//! export DWAVE_API_SOLVER="Advantage_system4.1"
//! ```
//!
//! Without `DWAVE_API_SOLVER` the first online QPU solver is used.
//!
//! # Reverse annealing
//!
//! | Parameter            | Wire form                                  |
//! |----------------------|--------------------------------------------|
//! | `anneal_schedule`    | `[[t_us, s], ...]`                         |
//! | `initial_state`      | dense list of length `num_qubits`, 3 = unused |
//! | `reinitialize_state` | bool                                       |
//!
//! # Example
//!
//! ```ignore
//! use revanneal_adapter_dwave::DWaveSampler;
//! use revanneal_hal::{ReverseAnnealParams, SampleParams, Sampler};
//! use revanneal_ir::ReverseScheduleSpec;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let sampler = DWaveSampler::from_env().await?;
//!     let forward = sampler.sample_ising(&model, &SampleParams::new(100)).await?;
//!     let best = forward.lowest().unwrap().sample.clone();
//!
//!     let reverse = ReverseAnnealParams::new(&ReverseScheduleSpec::new(0.45), best)?;
//!     let params = SampleParams::new(100).with_reverse_anneal(reverse);
//!     let samples = sampler.sample_ising(&model, &params).await?;
//!     println!("lowest: {:?}", samples.lowest());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod codec;
mod error;
mod sampler;

pub use api::{DEFAULT_ENDPOINT, SapiClient};
pub use error::{DWaveError, DWaveResult};
pub use sampler::{DWaveConfig, DWaveSampler, parse_status, select_solver};
