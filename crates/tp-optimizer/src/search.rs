//! Search space definitions and the search-strategy seam.

use serde::{Deserialize, Serialize};
use tp_types::{SearchError, TpResult};

/// An integer parameter with inclusive bounds `[min, max]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerParameter {
    /// Parameter name (e.g. "cpu-quota").
    pub name: String,
    pub min: i64,
    pub max: i64,
}

impl IntegerParameter {
    pub fn new(name: impl Into<String>, min: i64, max: i64) -> TpResult<Self> {
        let param = Self {
            name: name.into(),
            min,
            max,
        };
        param.validate()?;
        Ok(param)
    }

    pub fn validate(&self) -> TpResult<()> {
        if self.min > self.max {
            return Err(SearchError::InvalidBounds {
                name: self.name.clone(),
                min: self.min,
                max: self.max,
            }
            .into());
        }
        Ok(())
    }

    /// Position of `value` in the range, scaled to `[0.0, 1.0]`.
    pub fn unit_value(&self, value: i64) -> f64 {
        if self.max == self.min {
            return 1.0;
        }
        (value - self.min) as f64 / (self.max - self.min) as f64
    }

    /// Inverse of [`unit_value`](Self::unit_value), rounded to the nearest
    /// integer. Units outside `[0.0, 1.0]` saturate at the bounds.
    pub fn value_from_unit(&self, unit: f64) -> i64 {
        let raw = self.min as f64 + unit * (self.max - self.min) as f64;
        if raw.is_nan() {
            return self.max;
        }
        (raw.round() as i64).clamp(self.min, self.max)
    }

    /// Candidate for `value`, saturated into the bounds.
    pub fn candidate(&self, value: i64) -> Candidate {
        let value = value.clamp(self.min, self.max);
        Candidate {
            parameter: self.name.clone(),
            value,
            unit: self.unit_value(value),
        }
    }

    pub fn candidate_from_unit(&self, unit: f64) -> Candidate {
        self.candidate(self.value_from_unit(unit))
    }
}

/// One concrete value of the parameter under search.
///
/// `unit` is the unit value of the realized integer, not of the requested
/// probe, so rounding and saturation are visible to the search technique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub parameter: String,
    pub value: i64,
    pub unit: f64,
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.parameter, self.value)
    }
}

/// The search space: an ordered list of parameter definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub parameters: Vec<IntegerParameter>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
        }
    }

    pub fn add_int(mut self, name: impl Into<String>, min: i64, max: i64) -> Self {
        self.parameters.push(IntegerParameter {
            name: name.into(),
            min,
            max,
        });
        self
    }

    /// The only parameter of a single-parameter space.
    pub fn single_parameter(&self) -> TpResult<&IntegerParameter> {
        match self.parameters.as_slice() {
            [] => Err(SearchError::NoParameters.into()),
            [param] => {
                param.validate()?;
                Ok(param)
            }
            params => Err(SearchError::TooManyParameters {
                count: params.len(),
            }
            .into()),
        }
    }
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self::new()
    }
}

/// Common trait for search techniques pumped by the driver.
pub trait SearchStrategy: Send {
    /// Next candidate to evaluate.
    fn suggest(&mut self) -> Candidate;

    /// Report the objective of the most recently suggested candidate.
    fn report(&mut self, candidate: &Candidate, objective: f64);

    /// Human-readable technique name.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_mapping_round_trips_bounds() {
        let p = IntegerParameter::new("cpu-quota", 1000, 5000).unwrap();
        assert_eq!(p.unit_value(1000), 0.0);
        assert_eq!(p.unit_value(5000), 1.0);
        assert_eq!(p.unit_value(3000), 0.5);
        assert_eq!(p.value_from_unit(0.25), 2000);
        assert_eq!(p.value_from_unit(1.0), 5000);
    }

    #[test]
    fn unit_mapping_rounds_to_nearest() {
        let p = IntegerParameter::new("mem-bw-limit", 50, 53).unwrap();
        // 50 + 0.5 * 3 = 51.5
        assert_eq!(p.value_from_unit(0.5), 52);
        assert_eq!(p.value_from_unit(0.1), 50);
    }

    #[test]
    fn units_outside_range_saturate() {
        let p = IntegerParameter::new("cpu-quota", 1000, 2000).unwrap();
        assert_eq!(p.value_from_unit(1.125), 2000);
        assert_eq!(p.value_from_unit(-0.5), 1000);
        let c = p.candidate_from_unit(1.5);
        assert_eq!(c.value, 2000);
        assert_eq!(c.unit, 1.0);
    }

    #[test]
    fn degenerate_range() {
        let p = IntegerParameter::new("cpu-quota", 1000, 1000).unwrap();
        assert_eq!(p.unit_value(1000), 1.0);
        assert_eq!(p.value_from_unit(0.0), 1000);
    }

    #[test]
    fn inverted_bounds_rejected() {
        let err = IntegerParameter::new("cpu-quota", 2000, 1000).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn single_parameter_checks() {
        assert!(SearchSpace::new().single_parameter().is_err());

        let one = SearchSpace::new().add_int("cpu-quota", 1000, 4000);
        assert_eq!(one.single_parameter().unwrap().name, "cpu-quota");

        let two = SearchSpace::new()
            .add_int("cpu-quota", 1000, 4000)
            .add_int("mem-bw-limit", 50, 100);
        let err = two.single_parameter().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("got 2"));
    }

    #[test]
    fn candidate_display() {
        let p = IntegerParameter::new("cpu-quota", 1000, 4000).unwrap();
        assert_eq!(p.candidate(2500).to_string(), "cpu-quota=2500");
    }
}
