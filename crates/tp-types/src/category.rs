use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::TpError;

/// Class of resource constraint being tuned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cpu,
    Memory,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Cpu, Category::Memory];

    /// Benchmark class string used in baseline files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cpu => "cpu",
            Category::Memory => "memory",
        }
    }

    /// Name of the container limit tuned for this category.
    pub fn parameter_name(&self) -> &'static str {
        match self {
            Category::Cpu => "cpu-quota",
            Category::Memory => "mem-bw-limit",
        }
    }

    pub fn matches_class(&self, class: &str) -> bool {
        class == self.as_str()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Category::Cpu),
            "memory" => Ok(Category::Memory),
            other => Err(TpError::Config(format!("Unknown benchmark class {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_categories() {
        assert_eq!("cpu".parse::<Category>().unwrap(), Category::Cpu);
        assert_eq!("memory".parse::<Category>().unwrap(), Category::Memory);
    }

    #[test]
    fn unknown_category_is_config_error() {
        let err = "disk".parse::<Category>().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("disk"));
    }

    #[test]
    fn parameter_names() {
        assert_eq!(Category::Cpu.parameter_name(), "cpu-quota");
        assert_eq!(Category::Memory.parameter_name(), "mem-bw-limit");
        assert!(Category::Memory.matches_class("memory"));
        assert!(!Category::Memory.matches_class("cpu"));
    }
}
