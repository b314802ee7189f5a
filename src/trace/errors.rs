use crate::jvm;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;

/// Ways reading or replaying a trace can go wrong
///
/// Line numbers are 1-based and refer to the trace source.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),

    /// Malformed directive or instruction
    Syntax { line: usize, message: String },

    /// Bad name, descriptor, or instruction operand
    Jvm { line: usize, error: jvm::Error },

    /// Mnemonic the interpreter doesn't know (only reported when replay is strict)
    UnknownMnemonic { line: usize, mnemonic: String },

    /// Stack or local access out of bounds while replaying a method
    ///
    /// This means the trace does not match a real instruction stream, or its limits are wrong.
    ContractViolation { method: String, message: String },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Syntax { line, message } => write!(f, "line {}: {}", line, message),
            Error::Jvm { line, error } => write!(f, "line {}: {}", line, error),
            Error::UnknownMnemonic { line, mnemonic } => {
                write!(f, "line {}: unknown mnemonic '{}'", line, mnemonic)
            }
            Error::ContractViolation { method, message } => {
                write!(f, "replaying {}: {}", method, message)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Jvm { error, .. } => Some(error),
            _ => None,
        }
    }
}
