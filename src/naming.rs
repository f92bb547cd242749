//! File names shared by every task of a job.
//!
//! These functions are the whole contract between map and reduce tasks:
//! a map task writes `reduce_name(job, m, r)` for every bucket `r`, and
//! reduce task `r` reads it back for every map task `m`.

use glob::{glob, Pattern};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the intermediate file produced by map task `map_task` for
/// reduce bucket `reduce_task`.
pub fn reduce_name(job_name: &str, map_task: u32, reduce_task: u32) -> String {
    format!("mrtmp.{}-{}-{}", job_name, map_task, reduce_task)
}

/// Name of the output file of reduce task `reduce_task`.
pub fn merge_name(job_name: &str, reduce_task: u32) -> String {
    format!("mrtmp.{}-res-{}", job_name, reduce_task)
}

/// Name of the merged output of a whole job.
pub fn result_name(job_name: &str) -> String {
    format!("mrtmp.{}", job_name)
}

/// [`reduce_name`] resolved against a working directory.
pub fn intermediate_path(dir: &Path, job_name: &str, map_task: u32, reduce_task: u32) -> PathBuf {
    dir.join(reduce_name(job_name, map_task, reduce_task))
}

/// [`merge_name`] resolved against a working directory.
pub fn output_path(dir: &Path, job_name: &str, reduce_task: u32) -> PathBuf {
    dir.join(merge_name(job_name, reduce_task))
}

/// Removes every intermediate file of a job, and the per-reduce outputs
/// when `outputs` is set. Files that do not exist are skipped.
///
/// Temporaries left behind by killed attempts (`.<name>.<uuid>.tmp`) are
/// swept as well.
///
/// Returns the number of files removed.
pub fn clean_intermediate_files(
    dir: &Path,
    job_name: &str,
    n_map: u32,
    n_reduce: u32,
    outputs: bool,
) -> io::Result<usize> {
    let mut removed = 0;
    for r in 0..n_reduce {
        for m in 0..n_map {
            removed += remove_if_exists(&intermediate_path(dir, job_name, m, r))?;
            removed += remove_temporaries(dir, &reduce_name(job_name, m, r))?;
        }
        if outputs {
            removed += remove_if_exists(&output_path(dir, job_name, r))?;
            removed += remove_temporaries(dir, &merge_name(job_name, r))?;
        }
    }
    Ok(removed)
}

fn remove_temporaries(dir: &Path, name: &str) -> io::Result<usize> {
    let pattern = format!(
        "{}/.{}.*.tmp",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(name)
    );
    let paths = glob(&pattern).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut removed = 0;
    for path in paths {
        removed += remove_if_exists(&path.map_err(glob::GlobError::into_error)?)?;
    }
    Ok(removed)
}

fn remove_if_exists(path: &Path) -> io::Result<usize> {
    match fs::remove_file(path) {
        Ok(()) => Ok(1),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e),
    }
}
