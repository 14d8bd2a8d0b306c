//! Monotonic coordinate search over a single parameter.
//!
//! Assumes the objective is monotonic in the parameter on each side of the
//! optimum. The search starts at the parameter's maximum and walks down in
//! unit steps of 0.25. Whenever a probe fails to improve on the current best,
//! it turns around and halves the step.

use serde::{Deserialize, Serialize};
use tp_types::TpResult;

use crate::search::{Candidate, IntegerParameter, SearchSpace, SearchStrategy};
use crate::trial::is_improvement;

pub const INITIAL_STEP: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Down,
    Up,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
        }
    }
}

/// An evaluated point: realized unit value and its objective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub unit: f64,
    pub objective: f64,
}

/// Explicit state of the search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonotonicState {
    pub direction: Direction,
    pub step: f64,
    /// Best point so far. `None` until the initial candidate is observed.
    pub current: Option<Observation>,
    /// Unit value most recently emitted and not yet observed.
    pub pending: Option<f64>,
}

impl MonotonicState {
    pub fn new() -> Self {
        Self {
            direction: Direction::Down,
            step: INITIAL_STEP,
            current: None,
            pending: None,
        }
    }

    /// Fold in the observation of the last emitted unit value (if any) and
    /// return the next unit value to evaluate.
    ///
    /// Calling this again without a new observation re-emits the pending
    /// value. The lower end is clamped at 0.0; the upper end is not.
    pub fn next_candidate(mut self, last: Option<Observation>) -> (Self, f64) {
        if let (Some(pending), None) = (self.pending, last) {
            return (self, pending);
        }

        if let Some(observation) = last {
            self.accept(observation);
        }

        let unit = match self.current {
            None => 1.0,
            Some(current) => match self.direction {
                Direction::Down => (current.unit - self.step).max(0.0),
                Direction::Up => (current.unit + self.step).max(0.0),
            },
        };
        self.pending = Some(unit);
        (self, unit)
    }

    fn accept(&mut self, observation: Observation) {
        match self.current {
            None => self.current = Some(observation),
            Some(current) if is_improvement(observation.objective, current.objective) => {
                self.current = Some(observation);
            }
            Some(_) => {
                self.direction = self.direction.flip();
                self.step /= 2.0;
            }
        }
    }
}

impl Default for MonotonicState {
    fn default() -> Self {
        Self::new()
    }
}

/// [`MonotonicState`] bound to one integer parameter.
#[derive(Debug, Clone)]
pub struct MonotonicSearch {
    parameter: IntegerParameter,
    state: MonotonicState,
    last: Option<Observation>,
}

impl MonotonicSearch {
    /// Fails unless `space` holds exactly one valid parameter.
    pub fn new(space: &SearchSpace) -> TpResult<Self> {
        let parameter = space.single_parameter()?.clone();
        Ok(Self {
            parameter,
            state: MonotonicState::new(),
            last: None,
        })
    }

    pub fn state(&self) -> &MonotonicState {
        &self.state
    }

    pub fn parameter(&self) -> &IntegerParameter {
        &self.parameter
    }

    /// Best candidate accepted so far.
    pub fn current(&self) -> Option<Candidate> {
        self.state
            .current
            .map(|obs| self.parameter.candidate_from_unit(obs.unit))
    }
}

impl SearchStrategy for MonotonicSearch {
    fn suggest(&mut self) -> Candidate {
        let (state, unit) = self.state.next_candidate(self.last.take());
        self.state = state;
        let candidate = self.parameter.candidate_from_unit(unit);
        tracing::debug!(
            "Monotonic probe unit {:.4} -> {} (direction {:?}, step {})",
            unit,
            candidate,
            self.state.direction,
            self.state.step
        );
        candidate
    }

    fn report(&mut self, candidate: &Candidate, objective: f64) {
        self.last = Some(Observation {
            unit: candidate.unit,
            objective,
        });
    }

    fn name(&self) -> &str {
        "monotonic"
    }
}
