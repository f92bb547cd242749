//! Progress reporting for a single task invocation.
//!
//! Executors never log through a global. Each call receives a [`Reporter`]
//! in its [`TaskContext`](crate::TaskContext) and describes what it does as
//! a stream of [`TaskEvent`]s.

use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Map,
    Reduce,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Map => f.write_str("mapPhase"),
            Phase::Reduce => f.write_str("reducePhase"),
        }
    }
}

/// Identity of one task invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId {
    pub job: String,
    pub phase: Phase,
    pub index: u32,
}

impl TaskId {
    pub fn map(job: &str, index: u32) -> Self {
        Self {
            job: job.to_string(),
            phase: Phase::Map,
            index,
        }
    }

    pub fn reduce(job: &str, index: u32) -> Self {
        Self {
            job: job.to_string(),
            phase: Phase::Reduce,
            index,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.job, self.phase, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Started,
    InputRead { path: PathBuf, bytes: usize },
    Emitted { records: usize },
    BucketWritten { bucket: u32, path: PathBuf, records: usize },
    IntermediateRead { map_task: u32, path: PathBuf, records: usize },
    Grouped { keys: usize },
    OutputWritten { path: PathBuf, keys: usize },
    Failed { error: String },
    Finished,
}

pub trait Reporter: Send + Sync {
    fn report(&self, task: &TaskId, event: TaskEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, task: &TaskId, event: TaskEvent) {
        let job = task.job.as_str();
        let phase = task.phase.to_string();
        let phase = phase.as_str();
        let index = task.index;
        match event {
            TaskEvent::Started => {
                tracing::info!(job, phase, task = index, "task started")
            }
            TaskEvent::InputRead { path, bytes } => {
                tracing::debug!(job, phase, task = index, path = %path.display(), bytes, "read input")
            }
            TaskEvent::Emitted { records } => {
                tracing::debug!(job, phase, task = index, records, "map function emitted records")
            }
            TaskEvent::BucketWritten {
                bucket,
                path,
                records,
            } => {
                tracing::debug!(job, phase, task = index, bucket, path = %path.display(), records, "wrote bucket")
            }
            TaskEvent::IntermediateRead {
                map_task,
                path,
                records,
            } => {
                tracing::debug!(job, phase, task = index, map_task, path = %path.display(), records, "read intermediate file")
            }
            TaskEvent::Grouped { keys } => {
                tracing::debug!(job, phase, task = index, keys, "sorted data by keys")
            }
            TaskEvent::OutputWritten { path, keys } => {
                tracing::info!(job, phase, task = index, path = %path.display(), keys, "wrote output")
            }
            TaskEvent::Failed { error } => {
                tracing::warn!(job, phase, task = index, %error, "task failed")
            }
            TaskEvent::Finished => {
                tracing::info!(job, phase, task = index, "task finished")
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<(TaskId, TaskEvent)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(TaskId, TaskEvent)> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Events reported for `task`, in order.
    pub fn events_for(&self, task: &TaskId) -> Vec<TaskEvent> {
        self.events()
            .into_iter()
            .filter(|(id, _)| id == task)
            .map(|(_, event)| event)
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, task: &TaskId, event: TaskEvent) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push((task.clone(), event));
    }
}
