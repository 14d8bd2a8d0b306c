//! Objective evaluation: run the benchmarks for a candidate and reduce the
//! results against the baseline into one fitness value.
//!
//! Incomplete runner output (a required benchmark missing) is discarded and
//! the invocation re-issued until it is complete. Everything else is fatal:
//! a benchmark missing from the baseline, a non-zero exit status, or output
//! that is not a JSON array.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tp_optimizer::{Candidate, Objective, ObjectiveValue};
use tp_types::{
    internal_error, BaselineError, BaselineRecord, Category, ExecutionError, ResolvedParameters,
    TargetMeasurement, TpResult,
};

use crate::aggregate::SpeedupAggregate;
use crate::executor::CommandExecutor;
use crate::launch::{benchmark_command, LaunchSettings, LaunchTarget};

/// Metric key prefix of per-benchmark speedups.
pub const SPEEDUP_METRIC_PREFIX: &str = "speedup/";
pub const MEAN_METRIC: &str = "speedup_mean";
pub const INVOCATIONS_METRIC: &str = "invocations";

/// How benchmarks are launched for a baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// One invocation runs every benchmark of the category.
    Batched,
    /// One invocation per benchmark group, each with its own flags and image.
    Grouped,
}

impl ExecutionMode {
    pub fn for_baseline(baseline: &BaselineRecord) -> Self {
        if baseline.is_grouped() {
            ExecutionMode::Grouped
        } else {
            ExecutionMode::Batched
        }
    }
}

/// Per-category evaluator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    pub category: Category,
    /// Flags and image for batched runs. Grouped runs take them from the
    /// baseline groups.
    pub launch: LaunchSettings,
    /// Restrict scoring to these benchmarks. `None` scores every baseline
    /// benchmark of the category.
    pub benchmarks: Option<Vec<String>>,
    /// Log every benchmark's speedup at info level.
    pub show_bench_results: bool,
}

impl EvaluatorConfig {
    pub fn new(category: Category, launch: LaunchSettings) -> Self {
        Self {
            category,
            launch,
            benchmarks: None,
            show_bench_results: false,
        }
    }

    pub fn with_benchmarks(mut self, benchmarks: Option<Vec<String>>) -> Self {
        self.benchmarks = benchmarks;
        self
    }

    pub fn with_show_bench_results(mut self, show: bool) -> Self {
        self.show_bench_results = show;
        self
    }

    fn selects(&self, name: &str) -> bool {
        match &self.benchmarks {
            None => true,
            Some(selection) => selection.iter().any(|s| s == name),
        }
    }
}

/// Outcome of evaluating one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub fitness: f64,
    pub speedup_mean: f64,
    pub speedups: BTreeMap<String, f64>,
    /// Runner invocations issued, retries included.
    pub invocations: usize,
}

/// One runner invocation and the benchmarks it must report.
#[derive(Debug)]
struct Job {
    label: String,
    command: String,
    /// (name, baseline result)
    required: Vec<(String, f64)>,
}

pub struct ObjectiveEvaluator<'a, E> {
    baseline: &'a BaselineRecord,
    resolved: &'a ResolvedParameters,
    config: EvaluatorConfig,
    mode: ExecutionMode,
    executor: E,
}

impl<'a, E: CommandExecutor> ObjectiveEvaluator<'a, E> {
    pub fn new(
        baseline: &'a BaselineRecord,
        resolved: &'a ResolvedParameters,
        config: EvaluatorConfig,
        executor: E,
    ) -> Self {
        Self {
            baseline,
            resolved,
            config,
            mode: ExecutionMode::for_baseline(baseline),
            executor,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run the benchmarks for `candidate` and compute its fitness.
    pub fn evaluate(&mut self, candidate: &Candidate) -> TpResult<Evaluation> {
        let category = self.config.category;
        let jobs = self.plan(candidate.value)?;

        let mut aggregate = SpeedupAggregate::new();
        let mut invocations = 0;

        for job in &jobs {
            let (target, attempts) = self.run_job(job)?;
            invocations += attempts;

            for (name, base) in &job.required {
                let result = target.result_of(name).ok_or_else(|| {
                    internal_error!("result for {} vanished after completeness check", name)
                })?;
                let key = match self.mode {
                    ExecutionMode::Batched => name.clone(),
                    ExecutionMode::Grouped => format!("{}/{}", job.label, name),
                };
                let s = aggregate.record(&key, *base, result);
                if self.config.show_bench_results {
                    tracing::info!("{}: base {} target {} speedup {:.4}", key, base, result, s);
                } else {
                    tracing::debug!("{}: base {} target {} speedup {:.4}", key, base, result, s);
                }
            }
        }

        let speedup_mean = aggregate.mean(category)?;
        let fitness = aggregate.fitness(category)?;
        tracing::debug!(
            "{}: speedup mean {:.6} over {} benchmarks, fitness {:.6}",
            candidate,
            speedup_mean,
            aggregate.count(),
            fitness
        );

        Ok(Evaluation {
            fitness,
            speedup_mean,
            speedups: aggregate.into_speedups(),
            invocations,
        })
    }

    /// Resolve the invocations and required benchmarks for a candidate value.
    /// Fails before anything is launched on configuration errors.
    fn plan(&self, value: i64) -> TpResult<Vec<Job>> {
        let category = self.config.category;
        let missing = |name: &str| BaselineError::MissingBenchmark {
            name: name.to_string(),
            category: category.to_string(),
        };

        let jobs = match self.mode {
            ExecutionMode::Batched => {
                let names: Vec<String> = match &self.config.benchmarks {
                    Some(selection) => selection.clone(),
                    None => self
                        .baseline
                        .benchmarks_for(category)
                        .into_iter()
                        .map(String::from)
                        .collect(),
                };
                let required = names
                    .into_iter()
                    .map(|name| match self.baseline.result_of(category, &name) {
                        Some(base) => Ok((name, base)),
                        None => Err(missing(&name)),
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                if required.is_empty() {
                    Vec::new()
                } else {
                    vec![Job {
                        label: category.to_string(),
                        command: benchmark_command(
                            category,
                            value,
                            self.config.launch.target(),
                            self.resolved,
                        )?,
                        required,
                    }]
                }
            }
            ExecutionMode::Grouped => {
                let groups = self.baseline.groups_for(category);

                if let Some(selection) = &self.config.benchmarks {
                    for name in selection {
                        if !groups.iter().any(|g| g.result_of(name).is_some()) {
                            return Err(missing(name).into());
                        }
                    }
                }

                let mut jobs = Vec::new();
                for group in groups {
                    let required: Vec<(String, f64)> = group
                        .tests
                        .iter()
                        .filter(|t| self.config.selects(&t.name))
                        .map(|t| (t.name.clone(), t.result))
                        .collect();
                    if required.is_empty() {
                        continue;
                    }
                    let target = LaunchTarget {
                        docker_flags: &group.docker_flags,
                        image: &group.image,
                    };
                    jobs.push(Job {
                        label: group.id.clone(),
                        command: benchmark_command(category, value, target, self.resolved)?,
                        required,
                    });
                }
                jobs
            }
        };

        if jobs.is_empty() {
            return Err(BaselineError::NoBenchmarksForCategory {
                category: category.to_string(),
            }
            .into());
        }
        Ok(jobs)
    }

    /// Invoke until the output holds every required benchmark. Returns the
    /// complete measurement and the number of invocations.
    fn run_job(&mut self, job: &Job) -> TpResult<(TargetMeasurement, usize)> {
        let required: Vec<&str> = job.required.iter().map(|(n, _)| n.as_str()).collect();
        let mut attempts = 0;

        loop {
            attempts += 1;
            tracing::debug!("[{}] attempt {}: {}", job.label, attempts, job.command);

            let output = self.executor.execute(&job.command)?;
            if !output.success() {
                return Err(ExecutionError::NonZeroExit {
                    command: job.command.clone(),
                    exit_code: output.exit_code,
                    stdout: output.stdout,
                    stderr: output.stderr,
                }
                .into());
            }

            let target = TargetMeasurement::from_json_str(&output.stdout).map_err(|e| {
                ExecutionError::MalformedOutput {
                    command: job.command.clone(),
                    message: e.to_string(),
                    stdout: output.stdout.clone(),
                }
            })?;

            let missing = target.missing(&required);
            if missing.is_empty() {
                return Ok((target, attempts));
            }
            tracing::warn!(
                "[{}] incomplete results (missing {}), re-running attempt {}",
                job.label,
                missing.join(", "),
                attempts + 1
            );
        }
    }
}

impl<E: CommandExecutor> Objective for ObjectiveEvaluator<'_, E> {
    fn evaluate(&mut self, candidate: &Candidate) -> TpResult<ObjectiveValue> {
        let evaluation = ObjectiveEvaluator::evaluate(self, candidate)?;
        let mut metrics: HashMap<String, f64> = evaluation
            .speedups
            .into_iter()
            .map(|(name, speedup)| (format!("{SPEEDUP_METRIC_PREFIX}{name}"), speedup))
            .collect();
        metrics.insert(MEAN_METRIC.to_string(), evaluation.speedup_mean);
        metrics.insert(INVOCATIONS_METRIC.to_string(), evaluation.invocations as f64);
        Ok(ObjectiveValue {
            objective: evaluation.fitness,
            metrics,
        })
    }
}
