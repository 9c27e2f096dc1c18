//! Configuration for the revanneal tools.
//!
//! Sources, highest precedence first:
//! 1. Environment variables (`DWAVE_API_*`, `REVANNEAL_*`), including any
//!    loaded from a `.env` file
//! 2. A YAML configuration file (`--config`, else
//!    `$XDG_CONFIG_HOME/revanneal/config.yaml` when it exists)
//! 3. Default values

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use revanneal_adapter_dwave::{DEFAULT_ENDPOINT, DWaveConfig};
use revanneal_hal::WaitPolicy;
use revanneal_ir::{MAX_RAMP_BACK_SLOPE, ReverseScheduleSpec};

use crate::problems::ProblemKind;

/// Complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Solver API connection.
    #[serde(default)]
    pub sapi: SapiConfig,

    /// Experiment parameters.
    #[serde(default)]
    pub experiment: ExperimentConfig,

    /// Output files.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Solver API connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct SapiConfig {
    /// SAPI endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API token (prefer `DWAVE_API_TOKEN`)
    #[serde(default)]
    pub token: Option<String>,

    /// Solver id; the first online QPU when unset
    #[serde(default)]
    pub solver: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// First poll interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Longest poll interval in milliseconds
    #[serde(default = "default_max_poll_interval")]
    pub max_poll_interval_ms: u64,

    /// Give up waiting for an answer after this many seconds
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_seconds: u64,
}

impl fmt::Debug for SapiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SapiConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("solver", &self.solver)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_poll_interval_ms", &self.max_poll_interval_ms)
            .field("wait_timeout_seconds", &self.wait_timeout_seconds)
            .finish()
    }
}

impl Default for SapiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token: None,
            solver: None,
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            poll_interval_ms: default_poll_interval(),
            max_poll_interval_ms: default_max_poll_interval(),
            wait_timeout_seconds: default_wait_timeout(),
        }
    }
}

/// Experiment parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Reads per anneal
    #[serde(default = "default_num_reads")]
    pub num_reads: u32,

    /// Target for single reverse anneals
    #[serde(default = "default_s_target")]
    pub s_target: f64,

    /// Targets for sweeps
    #[serde(default = "default_s_targets")]
    pub s_targets: Vec<f64>,

    /// Hold time at `s_target`, µs
    #[serde(default = "default_hold_time")]
    pub hold_time: f64,

    /// Slope of the ramp back to `s_target`, 1/µs
    #[serde(default = "default_ramp_back_slope")]
    pub ramp_back_slope: f64,

    /// Forward anneal time, µs; the solver default when unset
    #[serde(default)]
    pub anneal_time: Option<f64>,

    /// Problem family
    #[serde(default)]
    pub problem: ProblemKind,

    /// Number of spins
    #[serde(default = "default_problem_size")]
    pub problem_size: usize,

    /// Qubit to grow the problem from
    #[serde(default)]
    pub seed_qubit: Option<u32>,

    /// Seed for random couplings
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Energy tolerance for ground-state hits
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            num_reads: default_num_reads(),
            s_target: default_s_target(),
            s_targets: default_s_targets(),
            hold_time: default_hold_time(),
            ramp_back_slope: default_ramp_back_slope(),
            anneal_time: None,
            problem: ProblemKind::default(),
            problem_size: default_problem_size(),
            seed_qubit: None,
            seed: default_seed(),
            tolerance: default_tolerance(),
        }
    }
}

impl ExperimentConfig {
    /// Reverse schedule geometry for `s_target`.
    pub fn schedule(&self, s_target: f64) -> ReverseScheduleSpec {
        ReverseScheduleSpec::new(s_target)
            .with_hold_time(self.hold_time)
            .with_ramp_back_slope(self.ramp_back_slope)
    }
}

/// Output files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for JSON results and plots
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,

    /// Write SVG plots
    #[serde(default = "default_true")]
    pub plots: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            plots: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "console" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    500
}

fn default_max_poll_interval() -> u64 {
    5_000
}

fn default_wait_timeout() -> u64 {
    300
}

fn default_num_reads() -> u32 {
    100
}

fn default_s_target() -> f64 {
    0.45
}

fn default_s_targets() -> Vec<f64> {
    vec![0.3, 0.35, 0.4, 0.45, 0.5, 0.55, 0.6, 0.65, 0.7]
}

fn default_hold_time() -> f64 {
    10.0
}

fn default_ramp_back_slope() -> f64 {
    MAX_RAMP_BACK_SLOPE
}

fn default_problem_size() -> usize {
    16
}

fn default_seed() -> u64 {
    42
}

fn default_tolerance() -> f64 {
    revanneal_stats::DEFAULT_GROUND_TOLERANCE
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("revanneal-output")
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

impl Config {
    /// Default config file location, `$XDG_CONFIG_HOME/revanneal/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("revanneal").join("config.yaml"))
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_yaml_ng::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load .env file if it exists
    /// 2. Load from `config_file`, or the default path if that file exists
    /// 3. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = match config_file {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };

        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Merge environment variables into this configuration.
    ///
    /// Only variables that are set override; unparsable numbers are ignored.
    pub fn merge_env(mut self) -> Self {
        // Solver API
        if let Ok(v) = std::env::var("DWAVE_API_ENDPOINT") {
            self.sapi.endpoint = v;
        }
        if let Ok(v) = std::env::var("DWAVE_API_TOKEN") {
            self.sapi.token = Some(v);
        }
        if let Ok(v) = std::env::var("DWAVE_API_SOLVER") {
            self.sapi.solver = Some(v);
        }
        if let Some(v) = env_parse("REVANNEAL_TIMEOUT") {
            self.sapi.timeout_seconds = v;
        }
        if let Some(v) = env_parse("REVANNEAL_WAIT_TIMEOUT") {
            self.sapi.wait_timeout_seconds = v;
        }

        // Experiment
        if let Some(v) = env_parse("REVANNEAL_NUM_READS") {
            self.experiment.num_reads = v;
        }
        if let Some(v) = env_parse("REVANNEAL_S_TARGET") {
            self.experiment.s_target = v;
        }
        if let Some(v) = env_parse("REVANNEAL_SEED") {
            self.experiment.seed = v;
        }

        // Output
        if let Ok(v) = std::env::var("REVANNEAL_OUTPUT_DIR") {
            self.output.directory = PathBuf::from(v);
        }

        // Logging
        if let Ok(v) = std::env::var("REVANNEAL_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("REVANNEAL_LOG_FORMAT") {
            self.logging.format = v;
        }

        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sapi.endpoint.starts_with("http://") && !self.sapi.endpoint.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "Invalid SAPI endpoint: {}",
                self.sapi.endpoint
            )));
        }
        if let Some(ref token) = self.sapi.token {
            if token.is_empty() {
                return Err(ConfigError::ValidationError(
                    "token must not be empty; omit the field to read DWAVE_API_TOKEN".to_string(),
                ));
            }
        }
        if self.sapi.timeout_seconds == 0 || self.sapi.wait_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than 0".to_string(),
            ));
        }
        if self.sapi.poll_interval_ms == 0 || self.sapi.poll_interval_ms > self.sapi.max_poll_interval_ms {
            return Err(ConfigError::ValidationError(format!(
                "poll interval {} ms must be positive and at most {} ms",
                self.sapi.poll_interval_ms, self.sapi.max_poll_interval_ms
            )));
        }

        let exp = &self.experiment;
        if exp.num_reads == 0 {
            return Err(ConfigError::ValidationError(
                "num_reads must be greater than 0".to_string(),
            ));
        }
        for &s in std::iter::once(&exp.s_target).chain(&exp.s_targets) {
            if !(0.0..1.0).contains(&s) {
                return Err(ConfigError::ValidationError(format!(
                    "s_target {s} outside [0, 1)"
                )));
            }
        }
        if !(exp.hold_time >= 0.0 && exp.hold_time.is_finite()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid hold_time: {}",
                exp.hold_time
            )));
        }
        if !(exp.ramp_back_slope > 0.0 && exp.ramp_back_slope <= MAX_RAMP_BACK_SLOPE) {
            return Err(ConfigError::ValidationError(format!(
                "ramp_back_slope {} outside (0, {MAX_RAMP_BACK_SLOPE}]",
                exp.ramp_back_slope
            )));
        }
        if exp.problem_size == 0 {
            return Err(ConfigError::ValidationError(
                "problem_size must be greater than 0".to_string(),
            ));
        }
        if !(exp.tolerance >= 0.0 && exp.tolerance.is_finite()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid tolerance: {}",
                exp.tolerance
            )));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {other}"
                )));
            }
        }
        match self.logging.format.as_str() {
            "console" | "json" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {other}"
                )));
            }
        }

        Ok(())
    }

    /// Polling policy from the `sapi` section.
    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::default()
            .with_intervals(
                Duration::from_millis(self.sapi.poll_interval_ms),
                Duration::from_millis(self.sapi.max_poll_interval_ms),
            )
            .with_timeout(Duration::from_secs(self.sapi.wait_timeout_seconds))
    }

    /// Sampler connection settings. Fails without a token.
    pub fn dwave_config(&self) -> Result<DWaveConfig, ConfigError> {
        let token = self.sapi.token.clone().ok_or_else(|| {
            ConfigError::ValidationError(
                "no SAPI token: set DWAVE_API_TOKEN or sapi.token".to_string(),
            )
        })?;
        Ok(DWaveConfig {
            endpoint: self.sapi.endpoint.clone(),
            token,
            solver: self.sapi.solver.clone(),
            request_timeout: Duration::from_secs(self.sapi.timeout_seconds),
            connect_timeout: Duration::from_secs(self.sapi.connect_timeout_seconds),
            wait: self.wait_policy(),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
