use std::{io, path::PathBuf};

use thiserror::Error;

use crate::Phase;

/// Everything that can end a reduce-task attempt. All of them are fatal:
/// the caller decides whether to run the task again.
#[derive(Debug, Error)]
pub enum ReduceError {
    #[error("reduce task needs at least one map task, got n_map = 0")]
    NoMapTasks,

    #[error("intermediate file {} unavailable", .path.display())]
    InputUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed record #{record} in {}", .path.display())]
    Decode {
        path: PathBuf,
        record: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write reduce output {}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reduce function failed for key {key:?}")]
    ReduceFn {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl ReduceError {
    /// Phase implied by the error kind. Output errors map to `Emitting` even when
    /// raised while clearing a stale destination before collecting.
    pub fn phase(&self) -> Phase {
        match self {
            ReduceError::NoMapTasks
            | ReduceError::InputUnavailable { .. }
            | ReduceError::Decode { .. } => Phase::Collecting,
            ReduceError::OutputWrite { .. } | ReduceError::ReduceFn { .. } => Phase::Emitting,
        }
    }

    pub(crate) fn output(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| ReduceError::OutputWrite { path, source }
    }
}
