use std::{
    fmt,
    path::{Path, PathBuf},
};

use common::Reducer;
use tracing::{error, info};

use crate::{collector, emitter, ReduceError};

/// Where a reduce-task attempt is. `Failed` is represented by the `Err` of
/// [`ReduceTask::run`], carrying the phase it failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collecting,
    Emitting,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Collecting => "collecting",
            Phase::Emitting => "emitting",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// One reduce partition of a job.
#[derive(Debug, Clone)]
pub struct ReduceTask {
    pub job_name: String,
    pub reduce_task: usize,
    pub n_map: usize,
    pub out_file: PathBuf,
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceSummary {
    pub reduce_task: usize,
    pub keys: usize,
    pub records: usize,
    pub out_file: PathBuf,
}

impl ReduceTask {
    pub fn new(
        job_name: impl Into<String>,
        reduce_task: usize,
        out_file: impl Into<PathBuf>,
        n_map: usize,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            reduce_task,
            n_map,
            out_file: out_file.into(),
            dir: PathBuf::from("."),
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Groups every intermediate record of this partition and writes the
    /// reduced, key-sorted output. Running it again on the same inputs gives
    /// the same bytes.
    pub fn run<R>(&self, reducer: &R) -> Result<ReduceSummary, ReduceError>
    where
        R: Reducer + ?Sized,
    {
        self.attempt(reducer).map_err(|e| {
            error!(
                "reduce task {} of {} failed while {}: {}",
                self.reduce_task,
                self.job_name,
                e.phase(),
                error_chain(&e)
            );
            e
        })
    }

    fn attempt<R>(&self, reducer: &R) -> Result<ReduceSummary, ReduceError>
    where
        R: Reducer + ?Sized,
    {
        if self.n_map == 0 {
            return Err(ReduceError::NoMapTasks);
        }
        // an output left by an earlier attempt must not outlive a failed one
        emitter::remove_stale(&self.out_file)?;

        info!(
            "reduce task {} of {}: {} from {} map outputs",
            self.reduce_task,
            self.job_name,
            Phase::Collecting,
            self.n_map
        );
        let grouped =
            collector::collect(&self.dir, &self.job_name, self.reduce_task, self.n_map)?;
        let records = grouped.records();

        info!(
            "reduce task {} of {}: {} {} keys to {}",
            self.reduce_task,
            self.job_name,
            Phase::Emitting,
            grouped.len(),
            self.out_file.display()
        );
        let keys = emitter::emit(grouped, reducer, &self.out_file)?;

        info!(
            "reduce task {} of {}: {}, {} records in, {} keys out",
            self.reduce_task,
            self.job_name,
            Phase::Done,
            records,
            keys
        );
        Ok(ReduceSummary {
            reduce_task: self.reduce_task,
            keys,
            records,
            out_file: self.out_file.clone(),
        })
    }
}

fn error_chain(e: &ReduceError) -> String {
    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    msg
}

/// Runs reduce partition `reduce_task` of `job_name` over the intermediate
/// files of `n_map` map tasks in the current directory.
pub fn do_reduce<R>(
    job_name: &str,
    reduce_task: usize,
    out_file: impl AsRef<Path>,
    n_map: usize,
    reducer: &R,
) -> Result<ReduceSummary, ReduceError>
where
    R: Reducer + ?Sized,
{
    ReduceTask::new(job_name, reduce_task, out_file.as_ref(), n_map).run(reducer)
}
