//! # tp-optimizer
//!
//! Single-parameter search for torpor.
//!
//! Provides the integer search space, the monotonic coordinate-search
//! technique, and the driver that pumps a technique against an objective,
//! tracks trials and keeps the best candidate.

mod driver;
mod monotonic;
mod search;
mod trial;

pub use driver::{Objective, ObjectiveValue, SearchDriver};
pub use monotonic::{Direction, MonotonicSearch, MonotonicState, Observation, INITIAL_STEP};
pub use search::{Candidate, IntegerParameter, SearchSpace, SearchStrategy};
pub use trial::{
    is_improvement, OptimizationConfig, OptimizationState, OptimizationStatus, Trial, TrialResult,
    TrialStatus,
};
