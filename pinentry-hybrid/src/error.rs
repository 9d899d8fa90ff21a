//! Error type.

use std::fmt;
use std::io;

/// Fatal errors that end a protocol session.
///
/// Anything a caller can recover from is reported on the wire as an `ERR` line
/// instead, and never surfaces as an `Error`.
#[derive(Debug)]
pub enum Error {
    /// Reading a command or writing a response failed.
    Io(io::Error),
    /// The caller closed its end of the pipe without sending `BYE`.
    UnexpectedEof,
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "Protocol channel failed: {}", e),
            Error::UnexpectedEof => write!(f, "Could not read command: unexpected end of input"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(inner) => Some(inner),
            Error::UnexpectedEof => None,
        }
    }
}
