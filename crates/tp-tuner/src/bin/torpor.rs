//! Autotune `--cpu-quota` and `--mem-bw-limit` so a container performs on
//! this machine as it did on the machine that produced the baseline.
//!
//! Usage:
//!   torpor --benchmark-image ivotron/microbench --max-cpu-quota 100000 \
//!          --max-mem-bw 1000 --docker-flags "--net=host" --base-file base.json

use std::path::PathBuf;

use clap::Parser;
use tp_bench::{LaunchSettings, ShellExecutor};
use tp_tuner::{Tuner, TunerConfig, DEFAULT_TEST_LIMIT};
use tp_types::Category;

#[derive(Parser, Debug)]
#[command(name = "torpor")]
#[command(about = "Port container resource limits between machines by matching baseline benchmark results")]
struct Args {
    /// Type of benchmarks to consider: one or more of 'cpu' or 'memory'
    #[arg(long, num_args = 1.., default_values = ["cpu", "memory"])]
    categories: Vec<Category>,

    /// JSON file containing results of the base system
    #[arg(long, default_value = "base.json")]
    base_file: PathBuf,

    /// Output JSON file containing the resulting parameters
    #[arg(long, default_value = "parameters.json")]
    output_file: PathBuf,

    /// Docker image for benchmarks
    #[arg(long)]
    benchmark_image: String,

    /// Maximum bandwidth for memory
    #[arg(long)]
    max_mem_bw: i64,

    /// Maximum CPU quota allowed
    #[arg(long)]
    max_cpu_quota: i64,

    /// Extra flags that are passed to docker run
    #[arg(long, allow_hyphen_values = true)]
    docker_flags: String,

    /// Show the result of each benchmark (for every test)
    #[arg(long)]
    show_bench_results: bool,

    /// Number of configurations to test per category
    #[arg(long, default_value_t = DEFAULT_TEST_LIMIT)]
    test_limit: usize,

    /// Stop each category's search after this many seconds
    #[arg(long)]
    stop_after: Option<u64>,

    /// Only score these benchmarks
    #[arg(long, num_args = 1..)]
    benchmarks: Option<Vec<String>>,

    /// CPU quota to use while tuning memory when cpu is not tuned in this run
    #[arg(long)]
    cpu_quota: Option<i64>,
}

impl From<Args> for TunerConfig {
    fn from(args: Args) -> Self {
        TunerConfig::new(
            LaunchSettings::new(args.docker_flags, args.benchmark_image),
            args.max_cpu_quota,
            args.max_mem_bw,
        )
        .with_categories(args.categories)
        .with_files(args.base_file, args.output_file)
        .with_test_limit(args.test_limit)
        .with_stop_after(args.stop_after)
        .with_benchmarks(args.benchmarks)
        .with_show_bench_results(args.show_bench_results)
        .with_cpu_quota(args.cpu_quota)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = TunerConfig::from(Args::parse());
    let output_file = config.output_file.clone();

    let mut tuner = Tuner::new(config, ShellExecutor::new());
    let parameters = tuner.run()?;

    for (name, value) in parameters.iter() {
        println!("{name} = {value}");
    }
    tracing::info!("Parameters written to {}", output_file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_and_default_arguments() {
        let args = Args::try_parse_from([
            "torpor",
            "--benchmark-image",
            "bench/img",
            "--max-mem-bw",
            "200",
            "--max-cpu-quota",
            "50000",
            "--docker-flags",
            "--net=host",
        ])
        .unwrap();
        let config = TunerConfig::from(args);
        assert_eq!(config.categories, vec![Category::Cpu, Category::Memory]);
        assert_eq!(config.launch.docker_flags, "--net=host");
        assert_eq!(config.max_cpu_quota, 50000);
        assert_eq!(config.test_limit, DEFAULT_TEST_LIMIT);
        assert!(config.benchmarks.is_none());
    }

    #[test]
    fn parses_categories_and_selection() {
        let args = Args::try_parse_from([
            "torpor",
            "--categories",
            "memory",
            "--benchmark-image",
            "img",
            "--max-mem-bw",
            "200",
            "--max-cpu-quota",
            "50000",
            "--docker-flags",
            "",
            "--benchmarks",
            "stream",
            "copy",
            "--cpu-quota",
            "3000",
        ])
        .unwrap();
        let config = TunerConfig::from(args);
        assert_eq!(config.categories, vec![Category::Memory]);
        assert_eq!(
            config.benchmarks,
            Some(vec!["stream".to_string(), "copy".to_string()])
        );
        assert_eq!(config.cpu_quota, Some(3000));
    }

    #[test]
    fn rejects_unknown_category() {
        let result = Args::try_parse_from([
            "torpor",
            "--categories",
            "disk",
            "--benchmark-image",
            "img",
            "--max-mem-bw",
            "200",
            "--max-cpu-quota",
            "50000",
            "--docker-flags",
            "",
        ]);
        assert!(result.is_err());
    }
}
