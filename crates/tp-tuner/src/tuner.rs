//! Per-category tuning loop.

use tp_bench::{CommandExecutor, ObjectiveEvaluator};
use tp_optimizer::{MonotonicSearch, SearchDriver, TrialResult};
use tp_types::{BaselineRecord, Category, ResolvedParameters, TpResult};

use crate::config::TunerConfig;

/// Best result of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryOutcome {
    pub category: Category,
    pub best: TrialResult,
    pub trials: usize,
    pub cached_trials: usize,
}

/// Runs the monotonic search for each configured category in turn.
pub struct Tuner<E> {
    config: TunerConfig,
    executor: E,
    outcomes: Vec<CategoryOutcome>,
}

impl<E: CommandExecutor> Tuner<E> {
    pub fn new(config: TunerConfig, executor: E) -> Self {
        Self {
            config,
            executor,
            outcomes: Vec::new(),
        }
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn outcomes(&self) -> &[CategoryOutcome] {
        &self.outcomes
    }

    /// Load the baseline, tune every category and write the output file.
    /// Nothing is written unless every category resolves.
    pub fn run(&mut self) -> TpResult<ResolvedParameters> {
        self.config.validate()?;
        let baseline = BaselineRecord::load(&self.config.base_file)?;
        let output = self.tune(&baseline)?;
        output.write_json(&self.config.output_file)?;
        Ok(output)
    }

    /// Tune every category against `baseline` and return the value chosen
    /// for each tuned parameter.
    pub fn tune(&mut self, baseline: &BaselineRecord) -> TpResult<ResolvedParameters> {
        self.config.validate()?;

        let mut context = ResolvedParameters::new();
        if let Some(quota) = self.config.cpu_quota {
            context.insert(Category::Cpu.parameter_name(), quota);
        }

        let mut output = ResolvedParameters::new();
        for category in self.config.categories.clone() {
            let outcome = self.tune_category(baseline, category, &context)?;
            let best = &outcome.best.candidate;
            context.insert(best.parameter.clone(), best.value);
            output.insert(best.parameter.clone(), best.value);
            self.outcomes.push(outcome);
        }
        Ok(output)
    }

    /// Search the parameter of one category. `context` holds values resolved
    /// by earlier categories.
    pub fn tune_category(
        &mut self,
        baseline: &BaselineRecord,
        category: Category,
        context: &ResolvedParameters,
    ) -> TpResult<CategoryOutcome> {
        let opt_config = self.config.optimization_config(category)?;
        let mut search = MonotonicSearch::new(&opt_config.search_space)?;
        let mut evaluator = ObjectiveEvaluator::new(
            baseline,
            context,
            self.config.evaluator_config(category),
            &mut self.executor,
        );

        tracing::info!(
            "Tuning {} for category {} ({:?} mode, range {}..={})",
            search.parameter().name,
            category,
            evaluator.mode(),
            search.parameter().min,
            search.parameter().max
        );

        let mut driver = SearchDriver::new(opt_config);
        let best = driver.run(&mut search, &mut evaluator)?;

        tracing::info!(
            "Category {} resolved {} (fitness {:.6})",
            category,
            best.candidate,
            best.objective
        );

        Ok(CategoryOutcome {
            category,
            best,
            trials: driver.trials().len(),
            cached_trials: driver.status().trials_cached,
        })
    }
}
