use std::path::Path;

use time::{macros::format_description, UtcOffset};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt::time::OffsetTime, EnvFilter};

pub mod collector;
pub mod emitter;
mod error;
mod task;

pub use collector::{collect, Grouped};
pub use emitter::emit;
pub use error::ReduceError;
pub use task::{do_reduce, Phase, ReduceSummary, ReduceTask};

pub const LOG_FILE: &str = "reduce.log";

/// Installs the global subscriber. Logs go to stderr, or to `LOG_FILE` under
/// `log_dir` when given. Keep the guard alive until exit or buffered lines are lost.
pub fn init_logger(log_dir: Option<&Path>) -> anyhow::Result<WorkerGuard> {
    // must be read before any other thread exists, the appender spawns one
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let (writer, guard) = match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(LOG_FILE)
                .build(dir)?;
            tracing_appender::non_blocking(appender)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let timer = OffsetTime::new(
        offset,
        format_description!("[hour]:[minute]:[second].[subsecond digits:3]"),
    );

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_writer(writer)
        .with_ansi(log_dir.is_none())
        .init();
    Ok(guard)
}
