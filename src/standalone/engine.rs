use anyhow::{bail, Context, Result};
use dashmap::DashMap;
use glob::glob;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::merge::merge_outputs;
use crate::naming::{clean_intermediate_files, output_path};
use crate::report::{Phase, Reporter, TaskId, TracingReporter};
use crate::task::{do_map, do_reduce, TaskContext};
use crate::*;

use super::Job;

// types related to this engine
type Outcomes = DashMap<TaskId, Result<(), String>>;

/// Result of a local job run.
#[derive(Debug)]
pub struct JobReport {
    pub n_map: u32,
    pub n_reduce: u32,
    /// Per-reduce output files, indexed by reduce task.
    pub outputs: Vec<PathBuf>,
    /// The merged result.
    pub merged: PathBuf,
}

/// Input files of `job`, sorted. Map task `m` processes the `m`th file.
pub fn input_files(job: &Job) -> Result<Vec<PathBuf>> {
    let mut files = glob(&job.input)?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("expanding `{}`", job.input))?;
    files.sort();
    Ok(files)
}

/// Runs every map task of `job` concurrently.
///
/// Returns once all of them have finished, and fails if any of them did.
pub async fn perform_map(
    job: &Job,
    engine: Workload,
    inputs: Vec<PathBuf>,
    reporter: Arc<dyn Reporter>,
) -> Result<()> {
    let outcomes = Arc::new(Outcomes::new());
    let mut tasks = JoinSet::new();
    for (m, input) in inputs.into_iter().enumerate() {
        let (job, outcomes, reporter) = (job.clone(), outcomes.clone(), reporter.clone());
        tasks.spawn_blocking(move || {
            let ctx = TaskContext::new(&job.work_dir, reporter.as_ref());
            let id = TaskId::map(&job.name, m as u32);
            let res = do_map(&ctx, &job.name, m as u32, &input, job.n_reduce, engine.map_fn);
            outcomes.insert(id, res.map(drop).map_err(|e| e.to_string()));
        });
    }
    join_phase(tasks, &outcomes, Phase::Map).await
}

/// Runs every reduce task of `job` concurrently, writing the output of task
/// `r` to `mrtmp.<job>-res-<r>`.
pub async fn perform_reduce(
    job: &Job,
    engine: Workload,
    n_map: u32,
    reporter: Arc<dyn Reporter>,
) -> Result<Vec<PathBuf>> {
    let outcomes = Arc::new(Outcomes::new());
    let mut tasks = JoinSet::new();
    for r in 0..job.n_reduce {
        let (job, outcomes, reporter) = (job.clone(), outcomes.clone(), reporter.clone());
        tasks.spawn_blocking(move || {
            let ctx = TaskContext::new(&job.work_dir, reporter.as_ref());
            let id = TaskId::reduce(&job.name, r);
            let out_file = output_path(&job.work_dir, &job.name, r);
            let res = do_reduce(&ctx, &job.name, r, &out_file, n_map, engine.reduce_fn);
            outcomes.insert(id, res.map(drop).map_err(|e| e.to_string()));
        });
    }
    join_phase(tasks, &outcomes, Phase::Reduce).await?;
    Ok((0..job.n_reduce)
        .map(|r| output_path(&job.work_dir, &job.name, r))
        .collect())
}

async fn join_phase(mut tasks: JoinSet<()>, outcomes: &Outcomes, phase: Phase) -> Result<()> {
    while let Some(joined) = tasks.join_next().await {
        joined.with_context(|| format!("{} task panicked", phase))?;
    }
    let mut failed = outcomes
        .iter()
        .filter_map(|entry| match entry.value() {
            Ok(()) => None,
            Err(e) => Some(format!("{}: {}", entry.key(), e)),
        })
        .collect::<Vec<_>>();
    if !failed.is_empty() {
        failed.sort();
        for f in &failed {
            warn!("{}", f);
        }
        bail!("{} of {} tasks failed in {}", failed.len(), outcomes.len(), phase);
    }
    Ok(())
}

/// Runs `job` from start to end on this machine: all map tasks, then all
/// reduce tasks, then the merge.
pub async fn run_job(job: &Job, reporter: Arc<dyn Reporter>) -> Result<JobReport> {
    if job.n_reduce == 0 {
        bail!("a job needs at least one reduce task");
    }
    let engine = workload::named(&job.workload)?;
    let inputs = input_files(job)?;
    if inputs.is_empty() {
        bail!("no input files match `{}`", job.input);
    }
    let n_map = u32::try_from(inputs.len())?;
    info!(job = %job.name, n_map, n_reduce = job.n_reduce, "starting job");

    perform_map(job, engine, inputs, reporter.clone()).await?;
    let outputs = perform_reduce(job, engine, n_map, reporter).await?;
    let merged = merge_outputs(&job.work_dir, &job.name, job.n_reduce)?;

    if job.clean {
        let removed = clean_intermediate_files(&job.work_dir, &job.name, n_map, job.n_reduce, false)?;
        info!(job = %job.name, removed, "removed intermediate files");
    }
    info!(job = %job.name, merged = %merged.display(), "job finished");

    Ok(JobReport {
        n_map,
        n_reduce: job.n_reduce,
        outputs,
        merged,
    })
}

/// [`run_job`] reporting through `tracing`.
pub async fn run_job_traced(job: &Job) -> Result<JobReport> {
    run_job(job, Arc::new(TracingReporter)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::decode_all;
    use crate::naming::intermediate_path;
    use crate::report::{MemoryReporter, TaskEvent};
    use std::fs;

    fn job(dir: &std::path::Path, workload: &str, n_reduce: u32) -> Job {
        Job {
            name: "test".to_string(),
            input: format!("{}/in-*.txt", dir.display()),
            workload: workload.to_string(),
            work_dir: dir.to_path_buf(),
            n_reduce,
            clean: false,
        }
    }

    #[tokio::test]
    async fn word_count_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("in-0.txt"), "a b a").unwrap();
        fs::write(dir.path().join("in-1.txt"), "b c\nc c").unwrap();
        let reporter = Arc::new(MemoryReporter::new());

        let report = run_job(&job(dir.path(), "wc", 3), reporter.clone()).await.unwrap();
        assert_eq!(report.n_map, 2);
        assert_eq!(report.outputs.len(), 3);
        assert_eq!(
            fs::read_to_string(&report.merged).unwrap(),
            "a: 2\nb: 2\nc: 3\n"
        );
        for r in 0..3 {
            for kv in decode_all(&report.outputs[r as usize]).unwrap() {
                assert_eq!(bucket_of(&kv.key, 3), r);
            }
        }
        for m in 0..2 {
            let events = reporter.events_for(&TaskId::map("test", m));
            assert_eq!(events.last(), Some(&TaskEvent::Finished));
        }
    }

    #[tokio::test]
    async fn clean_removes_intermediates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("in-0.txt"), "x y").unwrap();
        let mut job = job(dir.path(), "ii", 2);
        job.clean = true;

        let report = run_job_traced(&job).await.unwrap();
        for r in 0..2 {
            assert!(!intermediate_path(dir.path(), "test", 0, r).exists());
            assert!(report.outputs[r as usize].exists());
        }
    }

    #[tokio::test]
    async fn failing_map_task_stops_the_job() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("in-0.txt"), "ok").unwrap();
        // matches the input glob but cannot be read as a file
        fs::create_dir(dir.path().join("in-1.txt")).unwrap();
        let job = job(dir.path(), "wc", 2);

        let err = run_job_traced(&job).await.unwrap_err();
        assert!(err.to_string().contains("1 of 2 tasks failed"), "{err}");
        assert!(!output_path(dir.path(), "test", 0).exists());
    }

    #[tokio::test]
    async fn non_utf8_input_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("in-0.txt"), b"na\xefve word word").unwrap();

        let report = run_job_traced(&job(dir.path(), "wc", 2)).await.unwrap();
        assert_eq!(
            fs::read_to_string(&report.merged).unwrap(),
            "na: 1\nve: 1\nword: 2\n"
        );
    }

    #[tokio::test]
    async fn unknown_workload() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run_job_traced(&job(dir.path(), "nope", 2)).await.is_err());
    }

    #[tokio::test]
    async fn no_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_job_traced(&job(dir.path(), "wc", 2)).await.unwrap_err();
        assert!(err.to_string().contains("no input files"));
    }
}
