//! # tp-tuner
//!
//! Ports a container's CPU quota and memory bandwidth limit from a reference
//! machine to a target machine. For each category the monotonic search picks
//! the limit whose benchmark results best match the reference baseline.

pub mod config;
pub mod tuner;

pub use config::{TunerConfig, DEFAULT_TEST_LIMIT, MIN_CPU_QUOTA, MIN_MEM_BW};
pub use tuner::{CategoryOutcome, Tuner};
