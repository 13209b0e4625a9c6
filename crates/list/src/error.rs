use std::{error, fmt, io};

/// An error that occurred while listing a program.
#[derive(Debug)]
pub struct Error {
    inner: ErrorInner,
}

#[derive(Debug)]
enum ErrorInner {
    Io(io::Error),
    Parse(poff::Error),
    Malformed(String),
}

/// The kind of error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input container failed to parse.
    Parse,
    /// An I/O error occurred while reading a container or writing output.
    Io(io::ErrorKind),
    /// A section referenced an offset or index outside another section's
    /// bounds (truncated string table entry, out-of-range symbol name).
    Malformed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            ErrorInner::Io(e) => e.fmt(f),
            ErrorInner::Parse(e) => e.fmt(f),
            ErrorInner::Malformed(e) => f.write_str(e),
        }
    }
}

impl error::Error for Error {}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match &self.inner {
            ErrorInner::Io(e) => ErrorKind::Io(e.kind()),
            ErrorInner::Parse(_) => ErrorKind::Parse,
            ErrorInner::Malformed(_) => ErrorKind::Malformed,
        }
    }

    pub(crate) fn io(error: io::Error) -> Self {
        Self {
            inner: ErrorInner::Io(error),
        }
    }

    pub(crate) fn parse(error: poff::Error) -> Self {
        Self {
            inner: ErrorInner::Parse(error),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self {
            inner: ErrorInner::Malformed(message.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
