//! Combines the outputs of every reduce task of a job into one file.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::encode::RecordReader;
use crate::error::{Result, TaskError};
use crate::naming::{output_path, result_name};
use crate::utils::PendingFile;

/// Reads the `n_reduce` reduce outputs of `job_name` from `dir` and writes
/// `"{key}: {value}"` lines, sorted by key, to `mrtmp.{job_name}` in `dir`.
///
/// Returns the path of the merged file.
pub fn merge_outputs(dir: &Path, job_name: &str, n_reduce: u32) -> Result<PathBuf> {
    let mut kvs = Vec::new();
    for r in 0..n_reduce {
        let path = output_path(dir, job_name, r);
        let file = File::open(&path).map_err(|e| TaskError::input(&path, e))?;
        for kv in RecordReader::new(file, &path) {
            kvs.push(kv?);
        }
    }
    kvs.sort_by(|a, b| a.key.cmp(&b.key));

    let mut out = PendingFile::create(dir.join(result_name(job_name)))?;
    let target = out.target().to_path_buf();
    let writer = out.writer();
    for kv in &kvs {
        writeln!(writer, "{}: {}", kv.key, kv.value).map_err(|e| TaskError::output(&target, e))?;
    }
    out.commit()
}
