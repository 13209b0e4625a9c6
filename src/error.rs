//! The error type shared by the POFF container and relocation engine.
//!
//! A single `Error` type with a `Kind` so callers can match on taxonomy
//! (§7) without downcasting, `no_std`-friendly since every message is a
//! static string — no formatting or allocation on the error path.

use core::fmt;

/// The error taxonomy from §7: structural failures in the container or
/// relocation engine, and a translation of the opcode encoder's errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Bad magic, truncated header, or unknown section (§4.2 read path).
    Structural,
    /// `arg1`/`arg2` out of range while encoding (§4.1).
    EncodeOverflow,
    /// Relocation entries arrived out of order or were left unconsumed
    /// (§4.3 invariant, §7).
    Relocation,
    /// Data-stack or string-stack under/overflow (§4.5, §7).
    Stack,
    /// Divide/modulo by zero, or another runtime fault (§4.5, §7).
    Runtime,
    /// Heap exhaustion (§4.5, §7).
    Heap,
    /// An I/O failure while reading or writing a POFF file.
    Io,
}

/// The error type used throughout this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

impl Error {
    /// Construct an error of the given kind.
    pub const fn new(kind: ErrorKind, message: &'static str) -> Error {
        Error { kind, message }
    }

    /// The error's taxonomy (§7), for callers that branch on kind rather
    /// than display text.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// The result type used throughout this crate.
pub type Result<T> = core::result::Result<T, Error>;

pub(crate) trait ReadError<T> {
    fn read_error(self, kind: ErrorKind, message: &'static str) -> Result<T>;
}

impl<T> ReadError<T> for core::result::Result<T, ()> {
    fn read_error(self, kind: ErrorKind, message: &'static str) -> Result<T> {
        self.map_err(|()| Error::new(kind, message))
    }
}

impl<T> ReadError<T> for Option<T> {
    fn read_error(self, kind: ErrorKind, message: &'static str) -> Result<T> {
        self.ok_or(Error::new(kind, message))
    }
}

impl From<crate::opcode::EncodeError> for Error {
    fn from(e: crate::opcode::EncodeError) -> Error {
        match e {
            crate::opcode::EncodeError::Arg1Overflow => {
                Error::new(ErrorKind::EncodeOverflow, "arg1 does not fit in 8 bits")
            }
            crate::opcode::EncodeError::Arg2Overflow => {
                Error::new(ErrorKind::EncodeOverflow, "arg2 outside [-32768, 65535]")
            }
        }
    }
}
