//! Worker-side map and reduce task executors for a MapReduce (lite) system.
//!
//! A job is split into `M` map tasks and `N` reduce tasks. Map tasks
//! partition their output into `N` buckets using [`ihash`] and hand it off
//! through intermediate files named by [`naming::reduce_name`]. Each reduce
//! task then reads its bucket from every map task, groups by key and writes
//! one output file. Scheduling and retries are left to the caller.

use serde::{Deserialize, Serialize};
use std::hash::Hasher;

pub mod encode;
pub mod error;
pub mod merge;
pub mod naming;
pub mod report;
pub mod standalone;
pub mod task;
pub mod utils;
pub mod workload;

pub use error::{ErrorKind, TaskError};
pub use task::{do_map, do_reduce, TaskContext};

/////////////////////////////////////////////////////////////////////////////
// MapReduce application types
/////////////////////////////////////////////////////////////////////////////

/// A map function takes the name of an input file and its contents.
///
/// It returns every key-value pair emitted for that input, in any order.
pub type MapFn = fn(filename: &str, contents: &str) -> Vec<KeyValue>;

/// A reduce function takes a key and all values observed for that key,
/// and returns a single output value.
pub type ReduceFn = fn(key: &str, values: &[String]) -> String;

/// A map reduce application.
#[derive(Copy, Clone)]
pub struct Workload {
    pub map_fn: MapFn,
    pub reduce_fn: ReduceFn,
}

/////////////////////////////////////////////////////////////////////////////
// Key-value pairs
/////////////////////////////////////////////////////////////////////////////

/// A single key-value pair.
///
/// Serialized field names are capitalized so intermediate files stay
/// readable by other workers of the same job protocol.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct KeyValue {
    /// The key.
    #[serde(rename = "Key")]
    pub key: String,
    /// The value.
    #[serde(rename = "Value")]
    pub value: String,
}

impl KeyValue {
    /// Construct a new key-value pair from the given key and value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Get the key of this key-value pair.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the value of this key-value pair.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Consumes the key-value pair and returns the value.
    #[inline]
    pub fn into_value(self) -> String {
        self.value
    }
}

/// Hashes an intermediate key. Compute a reduce bucket for a given key
/// by calculating `ihash(key) % n_reduce`.
///
/// 64-bit FNV-1a over the key bytes, truncated to its low 31 bits so the
/// result is non-negative on every platform. Stable across processes and
/// runs. This is not the 32-bit FNV-1a some MapReduce workers use, so
/// buckets only line up with workers running this same function.
pub fn ihash(key: &str) -> u32 {
    let mut hasher = fnv::FnvHasher::default();
    hasher.write(key.as_bytes());
    (hasher.finish() & 0x7fff_ffff) as u32
}

/// The reduce bucket for `key` in a job with `n_reduce` reduce tasks.
///
/// `n_reduce` must be non-zero.
#[inline]
pub fn bucket_of(key: &str, n_reduce: u32) -> u32 {
    ihash(key) % n_reduce
}
