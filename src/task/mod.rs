//! The map and reduce task executors.
//!
//! Each executor runs one task to completion on the calling thread and
//! either returns a summary or the first error it hit. On error no file of
//! the task is left under its final name, so the caller may simply run the
//! task again.

use std::path::{Path, PathBuf};

use crate::report::{Reporter, TaskEvent, TaskId, TracingReporter};

pub mod map;
pub mod reduce;

pub use map::{do_map, MapSummary};
pub use reduce::{do_reduce, ReduceSummary};

/// Per-invocation environment of a task.
pub struct TaskContext<'a> {
    /// Directory holding the intermediate files of the job.
    work_dir: PathBuf,
    pub reporter: &'a dyn Reporter,
}

static TRACING: TracingReporter = TracingReporter;

impl<'a> TaskContext<'a> {
    pub fn new(work_dir: impl Into<PathBuf>, reporter: &'a dyn Reporter) -> Self {
        Self {
            work_dir: work_dir.into(),
            reporter,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

impl TaskContext<'static> {
    /// A context that reports through `tracing`.
    pub fn with_tracing(work_dir: impl Into<PathBuf>) -> Self {
        Self::new(work_dir, &TRACING)
    }
}

/// Runs `body`, bracketing it with start/finish events and reporting its
/// error, if any.
pub(crate) fn reported<T>(
    ctx: &TaskContext<'_>,
    id: &TaskId,
    body: impl FnOnce() -> crate::error::Result<T>,
) -> crate::error::Result<T> {
    ctx.reporter.report(id, TaskEvent::Started);
    match body() {
        Ok(out) => {
            ctx.reporter.report(id, TaskEvent::Finished);
            Ok(out)
        }
        Err(err) => {
            ctx.reporter.report(
                id,
                TaskEvent::Failed {
                    error: error_chain(&err),
                },
            );
            Err(err)
        }
    }
}

/// Renders an error together with its source chain.
fn error_chain(err: &crate::TaskError) -> String {
    let mut msg = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
