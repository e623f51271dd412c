use anyhow::{bail, Result};
use clap::Parser;
use common::{merge_name, App};
use futures::future::join_all;
use itertools::Itertools;
use reduce_task::{init_logger, ReduceSummary, ReduceTask};
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info};

/// Runs several reduce partitions of one job side by side.
#[derive(Parser, Debug)]
struct Cli {
    #[arg(short, long)]
    app_name: String,
    #[arg(long, default_value = "target/release")]
    lib_dir: PathBuf,
    /// Directory with the intermediate files; outputs are written here too.
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,
    #[arg(short, long)]
    job_name: String,
    #[arg(short = 'm', long)]
    n_map: usize,
    /// Run partitions 0..n_reduce.
    #[arg(short = 'r', long, conflicts_with = "partition")]
    n_reduce: Option<usize>,
    /// Run only these partitions. May be repeated.
    #[arg(short, long)]
    partition: Vec<usize>,
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn partitions(&self) -> Vec<usize> {
        match self.n_reduce {
            Some(n) => (0..n).collect(),
            None => self.partition.iter().copied().unique().collect(),
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let partitions = cli.partitions();
    if partitions.is_empty() {
        bail!("nothing to do, pass --n-reduce or --partition");
    }
    let app = Arc::new(App::load(&cli.lib_dir, &cli.app_name)?);

    let handles = partitions.into_iter().map(|reduce_task| {
        let task = ReduceTask::new(
            cli.job_name.as_str(),
            reduce_task,
            cli.dir.join(merge_name(&cli.job_name, reduce_task)),
            cli.n_map,
        )
        .in_dir(&cli.dir);
        let app = Arc::clone(&app);
        tokio::task::spawn_blocking(move || task.run(app.as_ref()))
    });

    let mut done: Vec<ReduceSummary> = vec![];
    let mut failed = 0;
    for result in join_all(handles).await {
        match result {
            Ok(Ok(summary)) => done.push(summary),
            // already logged by the task
            Ok(Err(_)) => failed += 1,
            Err(e) => {
                error!("reduce task panicked: {}", e);
                failed += 1;
            }
        }
    }

    for summary in &done {
        info!(
            "partition {}: {} keys -> {}",
            summary.reduce_task,
            summary.keys,
            summary.out_file.display()
        );
    }
    if failed > 0 {
        bail!("{} of {} reduce tasks failed", failed, failed + done.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logger(cli.log_dir.as_deref())?;

    tokio::runtime::Runtime::new()?.block_on(run(cli))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let base = ["worker", "-a", "app_wc", "-j", "wc", "-m", "2"];
        Cli::parse_from(base.iter().chain(args))
    }

    #[test]
    fn test_repeated_partitions_run_once() {
        assert_eq!(cli(&["-p", "1", "-p", "0", "-p", "1"]).partitions(), [1, 0]);
    }

    #[test]
    fn test_n_reduce_covers_all_partitions() {
        assert_eq!(cli(&["-r", "3"]).partitions(), [0, 1, 2]);
    }
}
