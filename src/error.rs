use std::error::Error as StdError;
use std::fmt;

use crate::type_info::TypeInfo;

/// Failure conditions raised by call-record access. Every condition is
/// raised at the point of detection with no partial mutation; callers
/// decide whether to fail the test or handle it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Positional access outside `[0, len)`.
    IndexOutOfRange { index: usize, len: usize },
    /// `set` targeted an ordinary by-value slot.
    ArgumentIsNotOutOrRef { index: usize, declared: TypeInfo },
    /// `set` targeted a by-ref slot with a type-incompatible value.
    ArgumentSetWithIncompatibleValue {
        index: usize,
        declared: TypeInfo,
        supplied: TypeInfo,
    },
    /// Type-directed lookup found no matching argument in either pass.
    ArgumentNotFound { requested: TypeInfo },
    /// Type-directed lookup found more than one candidate in a pass.
    AmbiguousArguments {
        requested: TypeInfo,
        declared_signature: String,
        actual_signature: String,
    },
    /// Positional typed retrieval could not convert the stored value.
    InvalidCast { position: usize, requested: TypeInfo },
}

/// Convenience result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IndexOutOfRange { index, len } => {
                write!(
                    f,
                    "argument index {index} is out of range for a call with {len} arguments"
                )
            }
            Error::ArgumentIsNotOutOrRef { index, declared } => {
                write!(
                    f,
                    "cannot set argument {index} (declared type {declared}): it is not an out or ref argument"
                )
            }
            Error::ArgumentSetWithIncompatibleValue {
                index,
                declared,
                supplied,
            } => {
                write!(
                    f,
                    "cannot set argument {index} (declared type {declared}) to a value of type {supplied}"
                )
            }
            Error::ArgumentNotFound { requested } => {
                write!(f, "no argument of type {requested} found for this call")
            }
            Error::AmbiguousArguments {
                requested,
                declared_signature,
                actual_signature,
            } => {
                write!(
                    f,
                    "more than one argument matches type {requested}: the call signature is ({declared_signature}) and the actual arguments were ({actual_signature})"
                )
            }
            Error::InvalidCast {
                position,
                requested,
            } => {
                write!(
                    f,
                    "argument at position {position} cannot be cast to {requested}"
                )
            }
        }
    }
}

impl StdError for Error {}
