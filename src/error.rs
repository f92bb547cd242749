//! Task failure types.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Coarse classification of a [`TaskError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputUnreadable,
    OutputUnwritable,
    Encode,
    Decode,
    InvalidArgument,
}

/// Every error here is fatal to the task that raised it. Nothing the task
/// wrote may be treated as valid afterwards.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("cannot read `{}`", path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write `{}`", path.display())]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot encode record for `{}`", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed record stream in `{}`", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl TaskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskError::InputUnreadable { .. } => ErrorKind::InputUnreadable,
            TaskError::OutputUnwritable { .. } => ErrorKind::OutputUnwritable,
            TaskError::Encode { .. } => ErrorKind::Encode,
            TaskError::Decode { .. } => ErrorKind::Decode,
            TaskError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    pub(crate) fn input(path: &Path, source: io::Error) -> Self {
        TaskError::InputUnreadable {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn output(path: &Path, source: io::Error) -> Self {
        TaskError::OutputUnwritable {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T, E = TaskError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = TaskError::input(Path::new("in.txt"), io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.kind(), ErrorKind::InputUnreadable);
        assert_eq!(err.to_string(), "cannot read `in.txt`");

        let err = TaskError::InvalidArgument("n_reduce must be at least 1".into());
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
