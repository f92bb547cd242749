use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use serde_json::de::IoRead;
use serde_json::StreamDeserializer;

use crate::error::{Result, TaskError};
use crate::KeyValue;

/// Appends encoded records to a writer.
///
/// `path` only names the destination in errors.
pub struct RecordWriter<W: Write> {
    inner: W,
    path: PathBuf,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W, path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            path: path.into(),
            written: 0,
        }
    }

    pub fn write(&mut self, kv: &KeyValue) -> Result<()> {
        serde_json::to_writer(&mut self.inner, kv).map_err(|source| {
            if source.is_io() {
                TaskError::OutputUnwritable {
                    path: self.path.clone(),
                    source: source.into(),
                }
            } else {
                TaskError::Encode {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;
        self.inner
            .write_all(b"\n")
            .map_err(|e| TaskError::output(&self.path, e))?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(|e| TaskError::output(&self.path, e))
    }
}

/// Streams records back out of a reader.
///
/// Yields `None` at a clean end of input. Anything else, including a record
/// cut off at the end of the stream, is reported as an error, after which the
/// reader is exhausted.
pub struct RecordReader<R: Read> {
    stream: StreamDeserializer<'static, IoRead<BufReader<R>>, KeyValue>,
    path: PathBuf,
    failed: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R, path: impl Into<PathBuf>) -> Self {
        Self {
            stream: serde_json::Deserializer::from_reader(BufReader::new(inner)).into_iter(),
            path: path.into(),
            failed: false,
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.stream.next()? {
            Ok(kv) => Some(Ok(kv)),
            Err(source) => {
                self.failed = true;
                Some(Err(if source.is_io() {
                    TaskError::InputUnreadable {
                        path: self.path.clone(),
                        source: source.into(),
                    }
                } else {
                    TaskError::Decode {
                        path: self.path.clone(),
                        source,
                    }
                }))
            }
        }
    }
}

/// Opens `path` and decodes every record in it.
pub fn decode_all(path: &Path) -> Result<Vec<KeyValue>> {
    let file = std::fs::File::open(path).map_err(|e| TaskError::input(path, e))?;
    RecordReader::new(file, path).collect()
}
