//! Trial tracking and optimization run management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::search::{Candidate, SearchSpace};

/// Unique optimization run identifier.
pub type OptimizationId = Uuid;

/// Objectives are minimized. Equal objectives are never an improvement.
pub fn is_improvement(candidate: f64, incumbent: f64) -> bool {
    candidate < incumbent
}

/// Top-level configuration for an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    pub id: OptimizationId,
    pub name: String,

    /// The parameter search space.
    pub search_space: SearchSpace,

    /// Maximum number of trials to run, cached trials included.
    pub max_trials: usize,

    /// Wall-clock budget in seconds. The first trial always runs.
    pub stop_after_secs: Option<u64>,

    pub created_at: DateTime<Utc>,
}

impl OptimizationConfig {
    pub fn new(name: String, search_space: SearchSpace) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            search_space,
            max_trials: 30,
            stop_after_secs: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_max_trials(mut self, n: usize) -> Self {
        self.max_trials = n;
        self
    }

    pub fn with_stop_after(mut self, secs: Option<u64>) -> Self {
        self.stop_after_secs = secs;
        self
    }
}

/// Lifecycle state for an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Aggregate status of an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStatus {
    pub id: OptimizationId,
    pub config: OptimizationConfig,
    pub state: OptimizationState,
    pub trials_completed: usize,
    /// Trials answered from an earlier evaluation of the same value.
    pub trials_cached: usize,
    pub best_trial: Option<TrialResult>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl OptimizationStatus {
    pub fn new(config: OptimizationConfig) -> Self {
        Self {
            id: config.id,
            config,
            state: OptimizationState::Pending,
            trials_completed: 0,
            trials_cached: 0,
            best_trial: None,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = OptimizationState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.state = OptimizationState::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: String) {
        self.state = OptimizationState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Update the best trial if `result` strictly improves on it. Returns
    /// whether the best trial changed.
    pub fn update_best(&mut self, result: &TrialResult) -> bool {
        let improved = match &self.best_trial {
            None => true,
            Some(current_best) => is_improvement(result.objective, current_best.objective),
        };
        if improved {
            self.best_trial = Some(result.clone());
        }
        improved
    }
}

// ---------------------------------------------------------------------------
// Individual trial
// ---------------------------------------------------------------------------

/// A single trial (one candidate evaluated against the baseline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub id: Uuid,
    pub optimization_id: OptimizationId,
    pub trial_number: usize,
    pub candidate: Candidate,
    pub status: TrialStatus,
    pub result: Option<TrialResult>,
    pub cached: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Trial {
    pub fn new(optimization_id: OptimizationId, trial_number: usize, candidate: Candidate) -> Self {
        Self {
            id: Uuid::new_v4(),
            optimization_id,
            trial_number,
            candidate,
            status: TrialStatus::Pending,
            result: None,
            cached: false,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = TrialStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self, result: TrialResult) {
        self.status = TrialStatus::Completed;
        self.finished_at = Some(Utc::now());
        self.result = Some(result);
    }

    pub fn mark_failed(&mut self, error: String) {
        self.status = TrialStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Result of a single trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_id: Uuid,
    pub objective: f64,
    pub metrics: HashMap<String, f64>,
    pub candidate: Candidate,
    pub duration_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::IntegerParameter;

    fn sample_config() -> OptimizationConfig {
        let space = SearchSpace::new().add_int("cpu-quota", 1000, 4000);
        OptimizationConfig::new("cpu".into(), space).with_max_trials(10)
    }

    fn result(value: i64, objective: f64) -> TrialResult {
        let param = IntegerParameter::new("cpu-quota", 1000, 4000).unwrap();
        TrialResult {
            trial_id: Uuid::new_v4(),
            objective,
            metrics: HashMap::new(),
            candidate: param.candidate(value),
            duration_ms: None,
        }
    }

    #[test]
    fn optimization_status_lifecycle() {
        let mut status = OptimizationStatus::new(sample_config());

        assert_eq!(status.state, OptimizationState::Pending);
        assert!(status.started_at.is_none());

        status.mark_running();
        assert_eq!(status.state, OptimizationState::Running);
        assert!(status.started_at.is_some());

        status.mark_completed();
        assert_eq!(status.state, OptimizationState::Completed);
        assert!(status.finished_at.is_some());
    }

    #[test]
    fn best_trial_tracking_minimize() {
        let mut status = OptimizationStatus::new(sample_config());

        assert!(status.update_best(&result(4000, 1.3)));
        assert!(status.update_best(&result(3000, 1.05)));
        assert_eq!(status.best_trial.as_ref().unwrap().candidate.value, 3000);

        // Worse and equal results should not replace
        assert!(!status.update_best(&result(2000, 1.2)));
        assert!(!status.update_best(&result(2500, 1.05)));
        assert_eq!(status.best_trial.as_ref().unwrap().candidate.value, 3000);
    }

    #[test]
    fn strict_ordering() {
        assert!(is_improvement(1.0, 1.1));
        assert!(!is_improvement(1.1, 1.1));
        assert!(!is_improvement(1.2, 1.1));
    }

    #[test]
    fn trial_lifecycle() {
        let param = IntegerParameter::new("cpu-quota", 1000, 4000).unwrap();
        let mut trial = Trial::new(Uuid::new_v4(), 1, param.candidate(2500));
        assert_eq!(trial.status, TrialStatus::Pending);

        trial.mark_running();
        assert_eq!(trial.status, TrialStatus::Running);

        trial.mark_completed(result(2500, 1.02));
        assert_eq!(trial.status, TrialStatus::Completed);
        assert!(trial.finished_at.is_some());
        assert_eq!(trial.result.as_ref().unwrap().objective, 1.02);
    }

    #[test]
    fn trial_failure() {
        let param = IntegerParameter::new("cpu-quota", 1000, 4000).unwrap();
        let mut trial = Trial::new(Uuid::new_v4(), 0, param.candidate(4000));
        trial.mark_running();
        trial.mark_failed("docker exited with 125".into());
        assert_eq!(trial.status, TrialStatus::Failed);
        assert_eq!(trial.error.as_deref(), Some("docker exited with 125"));
    }

    #[test]
    fn trial_result_serialization() {
        let original = result(3000, 1.1);
        let json = serde_json::to_string(&original).unwrap();
        let back: TrialResult = serde_json::from_str(&json).unwrap();
        assert_eq!(original, back);
    }
}
