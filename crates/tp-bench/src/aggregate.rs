//! Speedup aggregation and mirror normalization.

use std::collections::BTreeMap;

use tp_types::{BaselineError, Category, TpResult};

/// Ratio of a target result to its baseline result.
pub fn speedup(target: f64, base: f64) -> f64 {
    target / base
}

/// Reflect a mean speedup below 1.0 onto the other side of 1.0, so that
/// under- and over-shoot of the same size score the same.
pub fn mirror(speedup_mean: f64) -> f64 {
    if speedup_mean < 1.0 {
        1.0 + (1.0 - speedup_mean)
    } else {
        speedup_mean
    }
}

/// Per-benchmark speedups collected during one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedupAggregate {
    sum: f64,
    speedups: BTreeMap<String, f64>,
    count: usize,
}

impl SpeedupAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one benchmark and return its speedup.
    pub fn record(&mut self, name: &str, base: f64, target: f64) -> f64 {
        let s = speedup(target, base);
        self.sum += s;
        self.count += 1;
        self.speedups.insert(name.to_string(), s);
        s
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn speedups(&self) -> &BTreeMap<String, f64> {
        &self.speedups
    }

    pub fn into_speedups(self) -> BTreeMap<String, f64> {
        self.speedups
    }

    pub fn mean(&self, category: Category) -> TpResult<f64> {
        if self.count == 0 {
            return Err(BaselineError::NoBenchmarksForCategory {
                category: category.to_string(),
            }
            .into());
        }
        Ok(self.sum / self.count as f64)
    }

    /// Mirrored mean speedup; lower is better.
    pub fn fitness(&self, category: Category) -> TpResult<f64> {
        Ok(mirror(self.mean(category)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn mirror_law() {
        assert!(close(mirror(0.9), 1.1));
        assert!(close(mirror(1.1), 1.1));
        assert_eq!(mirror(1.0), 1.0);
        assert_eq!(mirror(2.5), 2.5);
        for x in [0.01, 0.3, 0.5, 0.75, 0.999] {
            assert!(close(mirror(x), 2.0 - x));
            assert!(close(mirror(x), mirror(2.0 - x)));
        }
    }

    #[test]
    fn unmirrored_mean() {
        let mut agg = SpeedupAggregate::new();
        assert!(close(agg.record("a", 10.0, 11.0), 1.1));
        assert!(close(agg.record("b", 20.0, 19.0), 0.95));
        assert_eq!(agg.count(), 2);
        assert!(close(agg.mean(Category::Cpu).unwrap(), 1.025));
        assert!(close(agg.fitness(Category::Cpu).unwrap(), 1.025));
    }

    #[test]
    fn mirrored_mean() {
        let mut agg = SpeedupAggregate::new();
        agg.record("a", 10.0, 9.0);
        agg.record("b", 20.0, 18.0);
        assert!(close(agg.mean(Category::Cpu).unwrap(), 0.9));
        assert!(close(agg.fitness(Category::Cpu).unwrap(), 1.1));
    }

    #[test]
    fn empty_aggregate_is_config_error() {
        let agg = SpeedupAggregate::new();
        let err = agg.fitness(Category::Memory).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("memory"));
    }

    #[test]
    fn order_does_not_matter() {
        let mut a = SpeedupAggregate::new();
        a.record("x", 4.0, 3.0);
        a.record("y", 2.0, 3.0);
        let mut b = SpeedupAggregate::new();
        b.record("y", 2.0, 3.0);
        b.record("x", 4.0, 3.0);
        assert!(close(a.mean(Category::Cpu).unwrap(), b.mean(Category::Cpu).unwrap()));
    }
}
