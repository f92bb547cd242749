use std::path::{Path, PathBuf};

use crate::encode::RecordWriter;
use crate::error::{Result, TaskError};
use crate::naming::intermediate_path;
use crate::report::{TaskEvent, TaskId};
use crate::utils::{self, commit_all, PendingFile};
use crate::{bucket_of, KeyValue};

use super::{reported, TaskContext};

/// What a successful map task produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSummary {
    /// Total records emitted by the map function.
    pub records: usize,
    /// Records written to each bucket, indexed by bucket.
    pub per_bucket: Vec<usize>,
    /// The intermediate files, indexed by bucket.
    pub files: Vec<PathBuf>,
}

/// Runs map task `map_task` of job `job_name` over `in_file`.
///
/// Reads the whole input, applies `map_f` to it, and writes every emitted
/// pair to the intermediate file of bucket `ihash(key) % n_reduce`. All
/// `n_reduce` files exist afterwards, empty or not, and replace any left
/// behind by an earlier attempt of the same task.
pub fn do_map<F>(
    ctx: &TaskContext<'_>,
    job_name: &str,
    map_task: u32,
    in_file: &Path,
    n_reduce: u32,
    map_f: F,
) -> Result<MapSummary>
where
    F: Fn(&str, &str) -> Vec<KeyValue>,
{
    let id = TaskId::map(job_name, map_task);
    reported(ctx, &id, || {
        if n_reduce == 0 {
            return Err(TaskError::InvalidArgument(
                "n_reduce must be at least 1".to_string(),
            ));
        }

        let contents = utils::read_to_string(in_file)?;
        ctx.reporter.report(
            &id,
            TaskEvent::InputRead {
                path: in_file.to_path_buf(),
                bytes: contents.len(),
            },
        );

        let filename = in_file.to_string_lossy();
        let kvs = map_f(&filename, contents.as_str());
        ctx.reporter
            .report(&id, TaskEvent::Emitted { records: kvs.len() });

        let mut pending = (0..n_reduce)
            .map(|r| PendingFile::create(intermediate_path(ctx.work_dir(), job_name, map_task, r)))
            .collect::<Result<Vec<_>>>()?;
        let mut per_bucket = vec![0usize; n_reduce as usize];

        for kv in &kvs {
            let r = bucket_of(&kv.key, n_reduce) as usize;
            let file = &mut pending[r];
            let target = file.target().to_path_buf();
            RecordWriter::new(file.writer(), target).write(kv)?;
            per_bucket[r] += 1;
        }

        let files = commit_all(pending)?;
        for (r, path) in files.iter().enumerate() {
            ctx.reporter.report(
                &id,
                TaskEvent::BucketWritten {
                    bucket: r as u32,
                    path: path.clone(),
                    records: per_bucket[r],
                },
            );
        }

        Ok(MapSummary {
            records: kvs.len(),
            per_bucket,
            files,
        })
    })
}
