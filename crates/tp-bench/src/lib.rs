//! # tp-bench
//!
//! Benchmark execution and objective evaluation for torpor.
//!
//! Builds the benchmark runner command lines for a candidate limit, runs them
//! as blocking subprocesses, and reduces the results against the baseline
//! into a single mirrored-speedup fitness value.

pub mod aggregate;
pub mod evaluator;
pub mod executor;
pub mod launch;

pub use aggregate::{mirror, speedup, SpeedupAggregate};
pub use evaluator::{
    Evaluation, EvaluatorConfig, ExecutionMode, ObjectiveEvaluator, INVOCATIONS_METRIC, MEAN_METRIC,
    SPEEDUP_METRIC_PREFIX,
};
pub use executor::{CommandExecutor, ProcessOutput, ShellExecutor};
pub use launch::{benchmark_command, LaunchSettings, LaunchTarget};
