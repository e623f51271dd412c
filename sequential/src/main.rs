use anyhow::Context;
use clap::Parser;
use common::{merge_name, App};
use reduce_task::{init_logger, ReduceTask};
use std::path::PathBuf;
use tracing::info;

/// Runs a single reduce task in the foreground.
#[derive(Parser, Debug)]
struct Cli {
    #[arg(short, long)]
    app_name: String,
    #[arg(long, default_value = "target/release")]
    lib_dir: PathBuf,
    /// Directory with the intermediate files.
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,
    #[arg(short, long)]
    job_name: String,
    #[arg(short, long)]
    reduce_task: usize,
    #[arg(short = 'm', long)]
    n_map: usize,
    /// Defaults to the merge file name of this partition inside `dir`.
    #[arg(short, long)]
    out_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logger(None)?;
    let app = App::load(&cli.lib_dir, &cli.app_name)?;

    let out_file = cli
        .out_file
        .unwrap_or_else(|| cli.dir.join(merge_name(&cli.job_name, cli.reduce_task)));
    let summary = ReduceTask::new(cli.job_name.as_str(), cli.reduce_task, out_file, cli.n_map)
        .in_dir(&cli.dir)
        .run(&app)
        .with_context(|| format!("reduce task {} of {}", cli.reduce_task, cli.job_name))?;

    info!(
        "{}: {} records reduced to {} keys in {}",
        app.app_name,
        summary.records,
        summary.keys,
        summary.out_file.display()
    );
    Ok(())
}
