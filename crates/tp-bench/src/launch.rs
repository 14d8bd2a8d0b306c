//! Benchmark runner command lines.

use serde::{Deserialize, Serialize};
use tp_types::{config_error, Category, ResolvedParameters, TpResult};

/// Bandwidth-throttling period passed to `docker-run`.
const MEM_BW_PERIOD: u32 = 1000;

/// Launch identity for batched runs: extra `docker run` flags and the
/// benchmark image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LaunchSettings {
    pub docker_flags: String,
    pub benchmark_image: String,
}

impl LaunchSettings {
    pub fn new(docker_flags: impl Into<String>, benchmark_image: impl Into<String>) -> Self {
        Self {
            docker_flags: docker_flags.into(),
            benchmark_image: benchmark_image.into(),
        }
    }

    pub fn target(&self) -> LaunchTarget<'_> {
        LaunchTarget {
            docker_flags: &self.docker_flags,
            image: &self.benchmark_image,
        }
    }
}

/// Flags and image of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchTarget<'a> {
    pub docker_flags: &'a str,
    pub image: &'a str,
}

/// Command line running `target` with the candidate `value` applied.
///
/// Memory runs also pin the CPU quota, which must already be resolved.
pub fn benchmark_command(
    category: Category,
    value: i64,
    target: LaunchTarget<'_>,
    resolved: &ResolvedParameters,
) -> TpResult<String> {
    let command = match category {
        Category::Cpu => format!(
            "docker run {} --rm --cpu-quota={} {}",
            target.docker_flags, value, target.image
        ),
        Category::Memory => {
            let cpu_quota = resolved
                .get(Category::Cpu.parameter_name())
                .ok_or_else(|| config_error!("Expecting value for cpu-quota before tuning mem-bw-limit"))?;
            format!(
                "docker-run {} {} 0 {} --rm --cpu-quota={} {}",
                MEM_BW_PERIOD, value, target.docker_flags, cpu_quota, target.image
            )
        }
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LaunchSettings {
        LaunchSettings::new("--net=host -v /tmp:/tmp", "ivotron/microbench")
    }

    #[test]
    fn cpu_command() {
        let cmd = benchmark_command(
            Category::Cpu,
            2500,
            settings().target(),
            &ResolvedParameters::new(),
        )
        .unwrap();
        assert_eq!(
            cmd,
            "docker run --net=host -v /tmp:/tmp --rm --cpu-quota=2500 ivotron/microbench"
        );
    }

    #[test]
    fn memory_command_pins_resolved_cpu_quota() {
        let mut resolved = ResolvedParameters::new();
        resolved.insert("cpu-quota", 3100);
        let cmd = benchmark_command(Category::Memory, 75, settings().target(), &resolved).unwrap();
        assert_eq!(
            cmd,
            "docker-run 1000 75 0 --net=host -v /tmp:/tmp --rm --cpu-quota=3100 ivotron/microbench"
        );
    }

    #[test]
    fn memory_command_requires_cpu_quota() {
        let err = benchmark_command(
            Category::Memory,
            75,
            settings().target(),
            &ResolvedParameters::new(),
        )
        .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("cpu-quota"));
    }
}
