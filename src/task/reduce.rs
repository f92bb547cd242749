use std::fs::File;
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::encode::{RecordReader, RecordWriter};
use crate::error::{Result, TaskError};
use crate::naming::intermediate_path;
use crate::report::{TaskEvent, TaskId};
use crate::utils::PendingFile;
use crate::KeyValue;

use super::{reported, TaskContext};

/// What a successful reduce task produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceSummary {
    /// Intermediate records read across all map tasks.
    pub records_read: usize,
    /// Distinct keys, which is also the number of output records.
    pub keys: usize,
    pub out_file: PathBuf,
}

/// Runs reduce task `reduce_task` of job `job_name`.
///
/// Reads bucket `reduce_task` from each of the `n_map` map tasks, groups the
/// pairs by key and writes `(key, reduce_f(key, values))` to `out_file` in
/// ascending key order. Values reach `reduce_f` in map task order, then in
/// file order.
///
/// `out_file` only appears once every input was read and every key reduced.
pub fn do_reduce<F>(
    ctx: &TaskContext<'_>,
    job_name: &str,
    reduce_task: u32,
    out_file: &Path,
    n_map: u32,
    reduce_f: F,
) -> Result<ReduceSummary>
where
    F: Fn(&str, &[String]) -> String,
{
    let id = TaskId::reduce(job_name, reduce_task);
    reported(ctx, &id, || {
        if n_map == 0 {
            return Err(TaskError::InvalidArgument(
                "n_map must be at least 1".to_string(),
            ));
        }

        let mut kvs: Vec<KeyValue> = Vec::new();
        for m in 0..n_map {
            let path = intermediate_path(ctx.work_dir(), job_name, m, reduce_task);
            let file = File::open(&path).map_err(|e| TaskError::input(&path, e))?;
            let before = kvs.len();
            for kv in RecordReader::new(file, &path) {
                kvs.push(kv?);
            }
            ctx.reporter.report(
                &id,
                TaskEvent::IntermediateRead {
                    map_task: m,
                    path,
                    records: kvs.len() - before,
                },
            );
        }
        let records_read = kvs.len();

        // Stable, so values of a key keep their arrival order.
        kvs.sort_by(|a, b| a.key.cmp(&b.key));

        let mut out = PendingFile::create(out_file.to_path_buf())?;
        let mut writer = RecordWriter::new(out.writer(), out_file);
        for (key, group) in &kvs.into_iter().chunk_by(|kv| kv.key.clone()) {
            let values = group.map(KeyValue::into_value).collect::<Vec<_>>();
            let reduced = reduce_f(key.as_str(), values.as_slice());
            writer.write(&KeyValue::new(key, reduced))?;
        }
        let keys = writer.written();
        ctx.reporter.report(&id, TaskEvent::Grouped { keys });

        let out_file = out.commit()?;
        ctx.reporter.report(
            &id,
            TaskEvent::OutputWritten {
                path: out_file.clone(),
                keys,
            },
        );

        Ok(ReduceSummary {
            records_read,
            keys,
            out_file,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::decode_all;
    use crate::report::MemoryReporter;
    use crate::ErrorKind;
    use std::fs;
    use std::io::Write;

    fn write_bucket(dir: &Path, m: u32, r: u32, records: &[(&str, &str)]) {
        let path = intermediate_path(dir, "test", m, r);
        let mut file = fs::File::create(&path).unwrap();
        let mut writer = RecordWriter::new(&mut file, &path);
        for (k, v) in records {
            writer.write(&KeyValue::new(*k, *v)).unwrap();
        }
        file.flush().unwrap();
    }

    fn sum(_key: &str, values: &[String]) -> String {
        values
            .iter()
            .map(|v| v.parse::<u64>().unwrap())
            .sum::<u64>()
            .to_string()
    }

    fn concat(_key: &str, values: &[String]) -> String {
        values.join(",")
    }

    #[test]
    fn sums_single_bucket() {
        let dir = tempfile::tempdir().unwrap();
        write_bucket(dir.path(), 0, 0, &[("a", "1"), ("a", "1")]);
        let out = dir.path().join("out");
        let ctx = TaskContext::with_tracing(dir.path());

        let summary = do_reduce(&ctx, "test", 0, &out, 1, sum).unwrap();
        assert_eq!(summary.keys, 1);
        assert_eq!(summary.records_read, 2);
        assert_eq!(decode_all(&out).unwrap(), vec![KeyValue::new("a", "2")]);
    }

    #[test]
    fn groups_across_map_tasks_in_key_order() {
        let dir = tempfile::tempdir().unwrap();
        write_bucket(dir.path(), 0, 1, &[("pear", "m0a"), ("apple", "m0b"), ("pear", "m0c")]);
        write_bucket(dir.path(), 1, 1, &[]);
        write_bucket(dir.path(), 2, 1, &[("fig", "m2a"), ("pear", "m2b"), ("Zebra", "m2c")]);
        let out = dir.path().join("out");
        let ctx = TaskContext::with_tracing(dir.path());

        do_reduce(&ctx, "test", 1, &out, 3, concat).unwrap();
        assert_eq!(
            decode_all(&out).unwrap(),
            vec![
                KeyValue::new("Zebra", "m2c"),
                KeyValue::new("apple", "m0b"),
                KeyValue::new("fig", "m2a"),
                KeyValue::new("pear", "m0a,m0c,m2b"),
            ]
        );
    }

    #[test]
    fn empty_inputs_give_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        write_bucket(dir.path(), 0, 0, &[]);
        write_bucket(dir.path(), 1, 0, &[]);
        let out = dir.path().join("out");
        let ctx = TaskContext::with_tracing(dir.path());

        let summary = do_reduce(&ctx, "test", 0, &out, 2, sum).unwrap();
        assert_eq!(summary.keys, 0);
        assert_eq!(fs::read(&out).unwrap(), b"");
    }

    #[test]
    fn missing_intermediate_file_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        write_bucket(dir.path(), 0, 0, &[("a", "1")]);
        let out = dir.path().join("out");
        let reporter = MemoryReporter::new();
        let ctx = TaskContext::new(dir.path(), &reporter);

        let err = do_reduce(&ctx, "test", 0, &out, 2, sum).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputUnreadable);
        assert!(!out.exists());
        assert!(matches!(
            reporter.events_for(&TaskId::reduce("test", 0)).last(),
            Some(TaskEvent::Failed { .. })
        ));
    }

    #[test]
    fn malformed_intermediate_file_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        write_bucket(dir.path(), 0, 0, &[("a", "1")]);
        fs::write(
            intermediate_path(dir.path(), "test", 1, 0),
            "{\"Key\":\"a\",\"Value\":\"1\"}\n{\"Key\":\"a\",",
        )
        .unwrap();
        let out = dir.path().join("out");
        let ctx = TaskContext::with_tracing(dir.path());

        let err = do_reduce(&ctx, "test", 0, &out, 2, sum).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(!out.exists());
        // only the two intermediate files remain
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn rerun_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        write_bucket(dir.path(), 0, 0, &[("b", "1"), ("a", "1"), ("c", "1")]);
        write_bucket(dir.path(), 1, 0, &[("a", "1"), ("c", "1")]);
        let out = dir.path().join("out");
        let ctx = TaskContext::with_tracing(dir.path());

        do_reduce(&ctx, "test", 0, &out, 2, sum).unwrap();
        let first = fs::read(&out).unwrap();
        do_reduce(&ctx, "test", 0, &out, 2, sum).unwrap();
        assert_eq!(fs::read(&out).unwrap(), first);
    }

    #[test]
    fn zero_map_tasks_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = TaskContext::with_tracing(dir.path());
        let err = do_reduce(&ctx, "test", 0, &dir.path().join("out"), 0, sum).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
