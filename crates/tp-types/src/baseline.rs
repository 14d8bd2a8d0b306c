//! Baseline and target benchmark measurements.
//!
//! A baseline file is a JSON array in one of two shapes:
//!
//! - batched: `[{"name": "a", "class": "cpu", "result": 10.0}, ...]`
//! - grouped: `[{"id": "g1", "class": "cpu", "docker_flags": "...", "image": "...",
//!   "tests": [{"name": "a", "result": 10.0}, ...]}, ...]`
//!
//! Entries that carry a `tests` list are groups, each launched separately with
//! its own flags and image.

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

use crate::category::Category;
use crate::errors::{BaselineError, TpError, TpResult};

/// Numeric measurement that may be written as a number or a numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

fn deserialize_measurement<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(v) => Ok(v),
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid result {s:?}: {e}"))),
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "group id must be a string or number, got {other}"
        ))),
    }
}

/// One benchmark of a batched baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    pub name: String,
    pub class: String,
    #[serde(deserialize_with = "deserialize_measurement")]
    pub result: f64,
}

/// A named test result, as found in grouped baselines and in runner output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    #[serde(deserialize_with = "deserialize_measurement")]
    pub result: f64,
}

/// A benchmark group with its own launch identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkGroup {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub class: String,
    #[serde(default)]
    pub docker_flags: String,
    pub image: String,
    pub tests: Vec<TestResult>,
}

impl BenchmarkGroup {
    pub fn result_of(&self, name: &str) -> Option<f64> {
        find_result(&self.tests, name)
    }

    pub fn test_names(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Reference-machine measurements. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum BaselineRecord {
    Batched(Vec<BenchmarkEntry>),
    Grouped(Vec<BenchmarkGroup>),
}

impl BaselineRecord {
    /// Load and validate a baseline file.
    pub fn load<P: AsRef<Path>>(path: P) -> TpResult<Self> {
        let path = path.as_ref();
        tracing::info!("Loading baseline from: {}", path.display());

        let text = fs::read_to_string(path).map_err(|e| BaselineError::InvalidFormat {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        let record = Self::from_json_str(&text)?;

        tracing::info!(
            "Loaded {} baseline {} from {}",
            record.len(),
            if record.is_grouped() { "groups" } else { "benchmarks" },
            path.display()
        );
        Ok(record)
    }

    /// Parse a baseline document, detecting batched or grouped shape.
    pub fn from_json_str(text: &str) -> TpResult<Self> {
        let entries: Vec<serde_json::Value> =
            serde_json::from_str(text).map_err(|e| BaselineError::InvalidFormat {
                message: format!("expected a JSON array of benchmark entries: {e}"),
            })?;

        let grouped = entries.iter().filter(|e| e.get("tests").is_some()).count();
        let record = if grouped == 0 {
            BaselineRecord::Batched(parse_entries(entries)?)
        } else if grouped == entries.len() {
            BaselineRecord::Grouped(parse_entries(entries)?)
        } else {
            return Err(BaselineError::InvalidFormat {
                message: format!(
                    "{grouped} of {} entries are benchmark groups; groups and flat entries cannot be mixed",
                    entries.len()
                ),
            }
            .into());
        };

        record.validate()?;
        Ok(record)
    }

    fn validate(&self) -> TpResult<()> {
        let check = |name: &str, value: f64| -> TpResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(BaselineError::InvalidResult {
                    name: name.to_string(),
                    value: value.to_string(),
                }
                .into())
            }
        };

        match self {
            BaselineRecord::Batched(entries) => {
                for entry in entries {
                    check(&entry.name, entry.result)?;
                }
            }
            BaselineRecord::Grouped(groups) => {
                for test in groups.iter().flat_map(|g| g.tests.iter()) {
                    check(&test.name, test.result)?;
                }
            }
        }
        Ok(())
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self, BaselineRecord::Grouped(_))
    }

    /// Number of top-level entries (benchmarks or groups).
    pub fn len(&self) -> usize {
        match self {
            BaselineRecord::Batched(entries) => entries.len(),
            BaselineRecord::Grouped(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of every benchmark belonging to `category`, in file order.
    pub fn benchmarks_for(&self, category: Category) -> Vec<&str> {
        match self {
            BaselineRecord::Batched(entries) => entries
                .iter()
                .filter(|e| category.matches_class(&e.class))
                .map(|e| e.name.as_str())
                .collect(),
            BaselineRecord::Grouped(groups) => groups
                .iter()
                .filter(|g| category.matches_class(&g.class))
                .flat_map(|g| g.tests.iter().map(|t| t.name.as_str()))
                .collect(),
        }
    }

    /// Groups belonging to `category`. Empty for batched baselines.
    pub fn groups_for(&self, category: Category) -> Vec<&BenchmarkGroup> {
        match self {
            BaselineRecord::Batched(_) => Vec::new(),
            BaselineRecord::Grouped(groups) => groups
                .iter()
                .filter(|g| category.matches_class(&g.class))
                .collect(),
        }
    }

    /// Baseline result of the first benchmark called `name` in `category`.
    pub fn result_of(&self, category: Category, name: &str) -> Option<f64> {
        match self {
            BaselineRecord::Batched(entries) => entries
                .iter()
                .find(|e| e.name == name && category.matches_class(&e.class))
                .map(|e| e.result),
            BaselineRecord::Grouped(_) => self
                .groups_for(category)
                .into_iter()
                .find_map(|g| g.result_of(name)),
        }
    }
}

fn parse_entries<T: serde::de::DeserializeOwned>(entries: Vec<serde_json::Value>) -> TpResult<Vec<T>> {
    entries
        .into_iter()
        .enumerate()
        .map(|(idx, value)| {
            serde_json::from_value(value).map_err(|e| {
                TpError::from(BaselineError::InvalidFormat {
                    message: format!("entry {idx}: {e}"),
                })
            })
        })
        .collect()
}

/// Output of one benchmark-runner invocation.
///
/// Entries are kept as raw JSON. Only the results a run asks for are
/// coerced, so a stray entry it does not need never spoils the output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetMeasurement {
    pub entries: Vec<serde_json::Value>,
}

impl TargetMeasurement {
    /// Fails only when `text` is not a JSON array.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Result of the first entry called `name`. `None` when the entry is
    /// absent or its result is missing, null or not numeric.
    pub fn result_of(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.get("name").and_then(serde_json::Value::as_str) == Some(name))
            .and_then(|entry| entry.get("result"))
            .and_then(measurement_from_value)
    }

    /// Required names with no usable result in this measurement.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| self.result_of(name).is_none())
            .collect()
    }
}

fn measurement_from_value(value: &serde_json::Value) -> Option<f64> {
    let result = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    result.is_finite().then_some(result)
}

fn find_result(results: &[TestResult], name: &str) -> Option<f64> {
    results.iter().find(|r| r.name == name).map(|r| r.result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCHED: &str = r#"[
        {"name": "a", "class": "cpu", "result": 10.0},
        {"name": "b", "class": "cpu", "result": "20.0"},
        {"name": "stream", "class": "memory", "result": 4500}
    ]"#;

    const GROUPED: &str = r#"[
        {"id": 1, "class": "cpu", "docker_flags": "--net=host", "image": "bench/cpu",
         "tests": [{"name": "a", "result": 10.0}, {"name": "b", "result": 20.0}]},
        {"id": "mem", "class": "memory", "image": "bench/mem",
         "tests": [{"name": "stream", "result": 4500.0}]}
    ]"#;

    #[test]
    fn parses_batched_baseline() {
        let record = BaselineRecord::from_json_str(BATCHED).unwrap();
        assert!(!record.is_grouped());
        assert_eq!(record.len(), 3);
        assert_eq!(record.benchmarks_for(Category::Cpu), vec!["a", "b"]);
        assert_eq!(record.benchmarks_for(Category::Memory), vec!["stream"]);
        assert_eq!(record.result_of(Category::Cpu, "b"), Some(20.0));
        assert_eq!(record.result_of(Category::Memory, "a"), None);
        assert!(record.groups_for(Category::Cpu).is_empty());
    }

    #[test]
    fn parses_grouped_baseline() {
        let record = BaselineRecord::from_json_str(GROUPED).unwrap();
        assert!(record.is_grouped());

        let cpu = record.groups_for(Category::Cpu);
        assert_eq!(cpu.len(), 1);
        assert_eq!(cpu[0].id, "1");
        assert_eq!(cpu[0].docker_flags, "--net=host");
        assert_eq!(cpu[0].test_names(), vec!["a", "b"]);

        let mem = record.groups_for(Category::Memory);
        assert_eq!(mem[0].docker_flags, "");
        assert_eq!(record.benchmarks_for(Category::Memory), vec!["stream"]);
        assert_eq!(record.result_of(Category::Memory, "stream"), Some(4500.0));
    }

    #[test]
    fn rejects_mixed_shapes() {
        let mixed = r#"[
            {"name": "a", "class": "cpu", "result": 1.0},
            {"id": "g", "class": "cpu", "image": "i", "tests": []}
        ]"#;
        let err = BaselineRecord::from_json_str(mixed).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn rejects_missing_fields_and_bad_results() {
        let missing_class = r#"[{"name": "a", "result": 1.0}]"#;
        assert!(BaselineRecord::from_json_str(missing_class).is_err());

        let zero = r#"[{"name": "a", "class": "cpu", "result": 0}]"#;
        let err = BaselineRecord::from_json_str(zero).unwrap_err();
        assert!(err.to_string().contains("Invalid result for benchmark a"));

        let not_a_number = r#"[{"name": "a", "class": "cpu", "result": "fast"}]"#;
        assert!(BaselineRecord::from_json_str(not_a_number).is_err());

        assert!(BaselineRecord::from_json_str("{\"name\": \"a\"}").is_err());
    }

    #[test]
    fn load_reports_unreadable_file() {
        let err = BaselineRecord::load("/nonexistent/base.json").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn target_measurement_lookup() {
        let target = TargetMeasurement::from_json_str(
            r#"[{"name": "a", "result": 11.0, "class": "cpu"}, {"name": "c", "result": "3"}]"#,
        )
        .unwrap();
        assert_eq!(target.result_of("a"), Some(11.0));
        assert_eq!(target.result_of("c"), Some(3.0));
        assert_eq!(target.missing(&["a", "b", "c"]), vec!["b"]);
    }

    #[test]
    fn target_measurement_treats_unusable_results_as_missing() {
        let target = TargetMeasurement::from_json_str(
            r#"[{"name": "a", "result": null}, {"name": "b"}, {"name": "c", "result": "N/A"},
                {"name": "d", "result": [1]}, {"result": 4.0}, "noise", {"name": "e", "result": 5}]"#,
        )
        .unwrap();
        assert_eq!(target.missing(&["a", "b", "c", "d", "e"]), vec!["a", "b", "c", "d"]);
        assert_eq!(target.result_of("e"), Some(5.0));
    }

    #[test]
    fn target_measurement_rejects_non_json() {
        assert!(TargetMeasurement::from_json_str("Segmentation fault").is_err());
        assert!(TargetMeasurement::from_json_str(r#"{"name": "a", "result": 1.0}"#).is_err());
    }
}
