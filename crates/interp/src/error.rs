use std::{error, fmt, io};

/// An error raised while loading or executing a program (§4.5, §7).
#[derive(Debug)]
pub struct Error {
    inner: ErrorInner,
}

#[derive(Debug)]
enum ErrorInner {
    Io(io::Error),
    Parse(poff::Error),
    Stack(&'static str),
    Heap(&'static str),
    Runtime(String),
}

/// The kind of error, matching the §7 taxonomy the interpreter can raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input image failed to parse.
    Parse,
    /// Data-stack or string-stack under/overflow.
    Stack,
    /// Heap exhaustion.
    Heap,
    /// Divide/modulo by zero, bad file number, invalid library or system
    /// call, or another runtime fault that is not a structural defect in
    /// the image.
    Runtime,
    /// An I/O error occurred while reading the image.
    Io(io::ErrorKind),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            ErrorInner::Io(e) => e.fmt(f),
            ErrorInner::Parse(e) => e.fmt(f),
            ErrorInner::Stack(e) => f.write_str(e),
            ErrorInner::Heap(e) => f.write_str(e),
            ErrorInner::Runtime(e) => f.write_str(e),
        }
    }
}

impl error::Error for Error {}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match &self.inner {
            ErrorInner::Io(e) => ErrorKind::Io(e.kind()),
            ErrorInner::Parse(_) => ErrorKind::Parse,
            ErrorInner::Stack(_) => ErrorKind::Stack,
            ErrorInner::Heap(_) => ErrorKind::Heap,
            ErrorInner::Runtime(_) => ErrorKind::Runtime,
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

    pub(crate) fn stack(message: &'static str) -> Self {
        Self {
            inner: ErrorInner::Stack(message),
        }
    }

    pub(crate) fn heap(message: &'static str) -> Self {
        Self {
            inner: ErrorInner::Heap(message),
        }
    }

    /// Public so a [`crate::host::Host`] implementation outside this
    /// crate can report its own runtime faults (bad file number, library
    /// call it doesn't support, and so on).
    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            inner: ErrorInner::Runtime(message.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
