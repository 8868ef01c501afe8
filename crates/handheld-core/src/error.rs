//! Error types for decoding and executing boot code.

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Malformed instruction on line {line} ({text:?}): {reason}")]
    MalformedInstruction {
        /// 1-based line in the source listing
        line: usize,
        text: String,
        reason: MalformedReason,
    },

    #[error("Out of bounds: instruction {index} jumps to {destination} (code length {len})")]
    OutOfBounds {
        index: usize,
        destination: i64,
        len: usize,
    },

    #[error("Accumulator overflow at instruction {index}")]
    AccumulatorOverflow { index: usize },

    #[error("Jump overflow: instruction {index} jumps by {operand}, beyond the i64 range")]
    JumpOverflow { index: usize, operand: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Returns true if this error was raised while executing, as opposed to decoding
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Error::OutOfBounds { .. }
                | Error::AccumulatorOverflow { .. }
                | Error::JumpOverflow { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Why a line failed to decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    UnknownOpcode(String),
    MissingOperand,
    UnsignedOperand(String),
    InvalidOperand(String),
    TrailingTokens,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::UnknownOpcode(op) => write!(f, "unknown opcode `{}`", op),
            MalformedReason::MissingOperand => write!(f, "missing operand"),
            MalformedReason::UnsignedOperand(arg) => {
                write!(f, "operand `{}` has no explicit sign", arg)
            }
            MalformedReason::InvalidOperand(arg) => {
                write!(f, "operand `{}` is not a signed integer", arg)
            }
            MalformedReason::TrailingTokens => write!(f, "unexpected tokens after operand"),
        }
    }
}
