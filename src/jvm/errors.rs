use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug)]
pub enum Error {
    /// Class, member, or local variable name is not valid in the JVM
    BadName(String),

    /// Field or method descriptor failed to parse
    BadDescriptor {
        descriptor: String,
        message: String,
    },

    /// An operand is not usable with its instruction (eg. `newarray` of an object type)
    BadOperand {
        mnemonic: &'static str,
        message: String,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Error::BadName(message) => write!(f, "invalid name: {}", message),
            Error::BadDescriptor {
                descriptor,
                message,
            } => write!(f, "invalid descriptor '{}': {}", descriptor, message),
            Error::BadOperand { mnemonic, message } => {
                write!(f, "invalid operand for '{}': {}", mnemonic, message)
            }
        }
    }
}

impl std::error::Error for Error {}
