use std::{error, fmt, io};

/// An error that occurred while optimizing a program.
#[derive(Debug)]
pub struct Error {
    inner: ErrorInner,
}

#[derive(Debug)]
enum ErrorInner {
    Io(io::Error),
    Parse(poff::Error),
    Relocation(poff::Error),
    Invariant(String),
}

/// The kind of error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input container failed to parse.
    Parse,
    /// The relocation engine rejected the pass's output (§4.3, §7).
    Relocation,
    /// An I/O error occurred while reading or writing a container.
    Io(io::ErrorKind),
    /// A pass-internal invariant was violated (e.g. a rule tried to delete
    /// a multi-word store).
    Invariant,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            ErrorInner::Io(e) => e.fmt(f),
            ErrorInner::Parse(e) => e.fmt(f),
            ErrorInner::Relocation(e) => e.fmt(f),
            ErrorInner::Invariant(e) => f.write_str(e),
        }
    }
}

impl error::Error for Error {}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match &self.inner {
            ErrorInner::Io(e) => ErrorKind::Io(e.kind()),
            ErrorInner::Parse(_) => ErrorKind::Parse,
            ErrorInner::Relocation(_) => ErrorKind::Relocation,
            ErrorInner::Invariant(_) => ErrorKind::Invariant,
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

    pub(crate) fn relocation(error: poff::Error) -> Self {
        Self {
            inner: ErrorInner::Relocation(error),
        }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self {
            inner: ErrorInner::Invariant(message.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
