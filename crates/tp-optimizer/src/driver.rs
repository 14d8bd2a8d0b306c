//! Search driver: pumps a strategy, evaluates candidates and tracks the best.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tp_types::{internal_error, TpResult};

use crate::search::{Candidate, SearchStrategy};
use crate::trial::{OptimizationConfig, OptimizationStatus, Trial, TrialResult};

/// Scalar objective plus the metrics it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveValue {
    pub objective: f64,
    pub metrics: HashMap<String, f64>,
}

impl ObjectiveValue {
    pub fn new(objective: f64) -> Self {
        Self {
            objective,
            metrics: HashMap::new(),
        }
    }
}

/// Maps a candidate to an objective value.
pub trait Objective {
    fn evaluate(&mut self, candidate: &Candidate) -> TpResult<ObjectiveValue>;
}

impl<F> Objective for F
where
    F: FnMut(&Candidate) -> TpResult<ObjectiveValue>,
{
    fn evaluate(&mut self, candidate: &Candidate) -> TpResult<ObjectiveValue> {
        self(candidate)
    }
}

/// Runs one optimization to the end of its budget.
#[derive(Debug)]
pub struct SearchDriver {
    status: OptimizationStatus,
    trials: Vec<Trial>,
    /// Evaluated values of this run, reused instead of re-running.
    evaluated: HashMap<i64, TrialResult>,
}

impl SearchDriver {
    pub fn new(config: OptimizationConfig) -> Self {
        Self {
            status: OptimizationStatus::new(config),
            trials: Vec::new(),
            evaluated: HashMap::new(),
        }
    }

    pub fn status(&self) -> &OptimizationStatus {
        &self.status
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn best(&self) -> Option<&TrialResult> {
        self.status.best_trial.as_ref()
    }

    /// Pump `strategy` until the trial or time budget is exhausted and return
    /// the best trial. Objective errors abort the run.
    pub fn run(
        &mut self,
        strategy: &mut dyn SearchStrategy,
        objective: &mut dyn Objective,
    ) -> TpResult<TrialResult> {
        let max_trials = self.status.config.max_trials.max(1);
        let deadline = self
            .status
            .config
            .stop_after_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        tracing::info!(
            "Starting {} search '{}' with budget of {} trials",
            strategy.name(),
            self.status.config.name,
            max_trials
        );
        self.status.mark_running();

        while self.trials.len() < max_trials {
            if !self.trials.is_empty() && deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::info!(
                    "Time budget exhausted after {} trials",
                    self.trials.len()
                );
                break;
            }

            let candidate = strategy.suggest();
            let result = match self.run_trial(candidate, objective) {
                Ok(result) => result,
                Err(e) => {
                    self.status.mark_failed(e.to_string());
                    return Err(e);
                }
            };

            strategy.report(&result.candidate, result.objective);
            if self.status.update_best(&result) {
                tracing::info!(
                    "New best {} with objective {:.6}",
                    result.candidate,
                    result.objective
                );
            }
        }

        self.status.mark_completed();
        let best = self
            .status
            .best_trial
            .clone()
            .ok_or_else(|| internal_error!("search '{}' finished without trials", self.status.config.name))?;

        tracing::info!(
            "Search '{}' finished: best {} (objective {:.6}) after {} trials ({} cached)",
            self.status.config.name,
            best.candidate,
            best.objective,
            self.trials.len(),
            self.status.trials_cached
        );
        Ok(best)
    }

    fn run_trial(
        &mut self,
        candidate: Candidate,
        objective: &mut dyn Objective,
    ) -> TpResult<TrialResult> {
        let mut trial = Trial::new(self.status.id, self.trials.len(), candidate.clone());

        let result = if let Some(previous) = self.evaluated.get(&candidate.value) {
            tracing::debug!(
                "Trial {}: {} already evaluated, reusing objective {:.6}",
                trial.trial_number,
                candidate,
                previous.objective
            );
            trial.cached = true;
            self.status.trials_cached += 1;
            TrialResult {
                trial_id: trial.id,
                objective: previous.objective,
                metrics: previous.metrics.clone(),
                candidate,
                duration_ms: Some(0),
            }
        } else {
            tracing::debug!("Trial {}: evaluating {}", trial.trial_number, candidate);
            trial.mark_running();
            let started = Instant::now();
            match objective.evaluate(&candidate) {
                Ok(value) => {
                    let result = TrialResult {
                        trial_id: trial.id,
                        objective: value.objective,
                        metrics: value.metrics,
                        candidate,
                        duration_ms: Some(started.elapsed().as_millis() as u64),
                    };
                    self.evaluated.insert(result.candidate.value, result.clone());
                    result
                }
                Err(e) => {
                    trial.mark_failed(e.to_string());
                    self.trials.push(trial);
                    return Err(e);
                }
            }
        };

        trial.mark_completed(result.clone());
        self.status.trials_completed += 1;
        self.trials.push(trial);
        Ok(result)
    }
}
