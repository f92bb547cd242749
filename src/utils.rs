//! Utility functions shared by the task executors.
//!

use crate::error::{Result, TaskError};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Read an entire file into a [`String`].
///
/// Input files are opaque bytes: invalid UTF-8 sequences are replaced with
/// `U+FFFD` rather than rejected. Returns [`TaskError::InputUnreadable`] only
/// if the file cannot be read.
pub fn read_to_string(path: &Path) -> Result<String> {
    let data = fs::read(path).map_err(|e| TaskError::input(path, e))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// A file that only appears under its final name once committed.
///
/// Data is written to a uniquely named sibling first. [`PendingFile::commit`]
/// renames it over `target`, replacing whatever was there. Dropping an
/// uncommitted `PendingFile` removes the temporary.
pub struct PendingFile {
    target: PathBuf,
    temp: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl PendingFile {
    pub fn create(target: PathBuf) -> Result<Self> {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = target.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4()));
        let file = File::create(&temp).map_err(|e| TaskError::output(&target, e))?;
        Ok(Self {
            target,
            temp,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn writer(&mut self) -> &mut BufWriter<File> {
        // Only `commit` takes the writer, and it consumes `self`.
        self.writer.as_mut().unwrap_or_else(|| unreachable!())
    }

    /// Flushes the data to disk. The file stays under its temporary name.
    pub fn sync(&mut self) -> Result<()> {
        let target = self.target.clone();
        let writer = self.writer();
        writer.flush().map_err(|e| TaskError::output(&target, e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| TaskError::output(&target, e))
    }

    /// Moves the file to its final name.
    pub fn commit(mut self) -> Result<PathBuf> {
        self.sync()?;
        drop(self.writer.take());
        fs::rename(&self.temp, &self.target).map_err(|e| TaskError::output(&self.target, e))?;
        Ok(std::mem::take(&mut self.target))
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if self.writer.is_some() || self.temp.exists() {
            drop(self.writer.take());
            let _ = fs::remove_file(&self.temp);
        }
    }
}

/// Commits every file, in order.
///
/// Files are only renamed once all of them were flushed successfully, so a
/// failed write or flush leaves no new file behind. Renames happen one at a
/// time: if renaming file `k` fails, files before `k` are already in place.
pub fn commit_all(mut files: Vec<PendingFile>) -> Result<Vec<PathBuf>> {
    for file in files.iter_mut() {
        file.sync()?;
    }
    files.into_iter().map(PendingFile::commit).collect()
}
