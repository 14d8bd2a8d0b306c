use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::errors::TpResult;

/// Parameter values resolved so far, keyed by parameter name.
///
/// Serializes as a flat JSON object, e.g. `{"cpu-quota": 2600}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedParameters {
    values: BTreeMap<String, i64>,
}

impl ResolvedParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: i64) -> Option<i64> {
        self.values.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Write the mapping as one JSON object followed by a newline.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> TpResult<()> {
        let path = path.as_ref();
        let mut text = serde_json::to_string(self)?;
        text.push('\n');
        fs::write(path, text)?;
        tracing::info!("Wrote {} parameters to {}", self.len(), path.display());
        Ok(())
    }
}
