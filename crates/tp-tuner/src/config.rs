//! Tuner configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use tp_bench::{EvaluatorConfig, LaunchSettings};
use tp_optimizer::{IntegerParameter, OptimizationConfig, SearchSpace};
use tp_types::{config_error, Category, TpResult};

/// Lowest CPU quota searched (microseconds per 100ms period).
pub const MIN_CPU_QUOTA: i64 = 1000;
/// Lowest memory bandwidth limit searched.
pub const MIN_MEM_BW: i64 = 50;
pub const DEFAULT_TEST_LIMIT: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunerConfig {
    /// Categories to tune, in order.
    pub categories: Vec<Category>,
    pub base_file: PathBuf,
    pub output_file: PathBuf,
    pub launch: LaunchSettings,
    pub max_cpu_quota: i64,
    pub max_mem_bw: i64,
    /// Trials per category, cached trials included.
    pub test_limit: usize,
    pub stop_after_secs: Option<u64>,
    /// Benchmarks to score; all benchmarks of a category when `None`.
    pub benchmarks: Option<Vec<String>>,
    pub show_bench_results: bool,
    /// CPU quota to pin while tuning memory when cpu is not tuned first.
    pub cpu_quota: Option<i64>,
}

impl TunerConfig {
    pub fn new(launch: LaunchSettings, max_cpu_quota: i64, max_mem_bw: i64) -> Self {
        Self {
            categories: Category::ALL.to_vec(),
            base_file: PathBuf::from("base.json"),
            output_file: PathBuf::from("parameters.json"),
            launch,
            max_cpu_quota,
            max_mem_bw,
            test_limit: DEFAULT_TEST_LIMIT,
            stop_after_secs: None,
            benchmarks: None,
            show_bench_results: false,
            cpu_quota: None,
        }
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_files(mut self, base_file: impl Into<PathBuf>, output_file: impl Into<PathBuf>) -> Self {
        self.base_file = base_file.into();
        self.output_file = output_file.into();
        self
    }

    pub fn with_test_limit(mut self, test_limit: usize) -> Self {
        self.test_limit = test_limit;
        self
    }

    pub fn with_stop_after(mut self, secs: Option<u64>) -> Self {
        self.stop_after_secs = secs;
        self
    }

    pub fn with_benchmarks(mut self, benchmarks: Option<Vec<String>>) -> Self {
        self.benchmarks = benchmarks;
        self
    }

    pub fn with_show_bench_results(mut self, show: bool) -> Self {
        self.show_bench_results = show;
        self
    }

    pub fn with_cpu_quota(mut self, cpu_quota: Option<i64>) -> Self {
        self.cpu_quota = cpu_quota;
        self
    }

    pub fn validate(&self) -> TpResult<()> {
        if self.categories.is_empty() {
            return Err(config_error!("At least one category is required"));
        }
        for (i, category) in self.categories.iter().enumerate() {
            if self.categories[..i].contains(category) {
                return Err(config_error!("Category {} given more than once", category));
            }
        }
        for category in &self.categories {
            self.parameter(*category)?;
        }
        if self.test_limit == 0 {
            return Err(config_error!("test limit must be at least 1"));
        }
        if let Some(benchmarks) = &self.benchmarks {
            if benchmarks.is_empty() {
                return Err(config_error!("benchmark selection is empty"));
            }
        }
        if let Some(quota) = self.cpu_quota {
            if quota <= 0 {
                return Err(config_error!("cpu quota must be positive, got {}", quota));
            }
        }
        Ok(())
    }

    /// The parameter tuned for `category`.
    pub fn parameter(&self, category: Category) -> TpResult<IntegerParameter> {
        match category {
            Category::Cpu => {
                IntegerParameter::new(category.parameter_name(), MIN_CPU_QUOTA, self.max_cpu_quota)
            }
            Category::Memory => {
                IntegerParameter::new(category.parameter_name(), MIN_MEM_BW, self.max_mem_bw)
            }
        }
    }

    pub fn optimization_config(&self, category: Category) -> TpResult<OptimizationConfig> {
        let param = self.parameter(category)?;
        let space = SearchSpace::new().add_int(param.name, param.min, param.max);
        Ok(OptimizationConfig::new(category.to_string(), space)
            .with_max_trials(self.test_limit)
            .with_stop_after(self.stop_after_secs))
    }

    pub fn evaluator_config(&self, category: Category) -> EvaluatorConfig {
        EvaluatorConfig::new(category, self.launch.clone())
            .with_benchmarks(self.benchmarks.clone())
            .with_show_bench_results(self.show_bench_results)
    }
}
