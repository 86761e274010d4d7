use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use env_logger::Builder;

use multidag::experiment::{Experiment, RunResult};
use multidag::multi_scheduler::WorkloadStats;
use multidag::scheduler_resolver::default_scheduler_resolver;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Runs multi-workload scheduling policies over a set of DAGs and reports makespan and unfairness
struct Args {
    /// Path to YAML file with experiment configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Path to produced JSON file with experiment results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of threads to use (default - use all available cores)
    #[arg(short, long)]
    threads: Option<usize>,
}

/// Slowdown of a workload: its lowerbound divided by the makespan achieved under contention.
fn slowdown(stats: &WorkloadStats) -> f64 {
    if stats.makespan == 0 {
        return 1.;
    }
    stats.lowerbound as f64 / stats.makespan as f64
}

/// Sum of absolute deviations of workload slowdowns from their mean.
fn unfairness(stats: &[WorkloadStats]) -> f64 {
    if stats.is_empty() {
        return 0.;
    }
    let slowdowns = stats.iter().map(slowdown).collect::<Vec<_>>();
    let mean = slowdowns.iter().sum::<f64>() / slowdowns.len() as f64;
    slowdowns.iter().map(|s| (s - mean).abs()).sum()
}

fn print_summary(results: &[RunResult]) {
    let width = results.iter().map(|r| r.scheduler.len()).max().unwrap_or(0).max(9);
    println!("{:<width$}  {:>10}  {:>10}  {:>6}", "scheduler", "makespan", "unfairness", "failed");
    for result in results.iter() {
        println!(
            "{:<width$}  {:>10}  {:>10.4}  {:>6}",
            result.scheduler,
            result.makespan,
            unfairness(&result.workloads),
            result.failed.len()
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();
    let threads = match args.threads {
        Some(threads) => threads,
        None => std::thread::available_parallelism()?.get(),
    };

    let experiment = Experiment::load(&args.config, default_scheduler_resolver)?;
    log::info!("loaded {} workloads", experiment.workloads().len());
    let results = experiment.run(threads);
    print_summary(&results);

    let output = args.output.unwrap_or_else(|| {
        let stem = args
            .config
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        args.config
            .with_file_name([stem.as_str(), "-results"].concat())
            .with_extension("json")
    });
    std::fs::File::create(output)?.write_all(serde_json::to_string_pretty(&results)?.as_bytes())?;
    Ok(())
}
