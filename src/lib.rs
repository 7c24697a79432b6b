#![deny(warnings)]
#![deny(clippy::all, clippy::pedantic, clippy::perf, clippy::suspicious)] // Catch correctness + perf + suspicious patterns early.
#![deny(clippy::unwrap_used, clippy::expect_used)]

//! Call-record core for a test-double framework: type-directed access to
//! the arguments of one intercepted invocation.
//!
//! The interception layer materialises each call as a [`CallRecord`]: an
//! ordered, fixed-size sequence of [`Argument`] slots plus the generic
//! type arguments of the invocation. Test and stub-configuration code then
//! reads arguments positionally ([`CallRecord::get`], [`CallRecord::arg_at`])
//! or by type ([`CallRecord::arg`]), and writes ref/out-style slots back to
//! the original call site ([`CallRecord::set`]).
//!
//! Records are single-call, single-thread objects: each intercepted call
//! produces its own record and no record is shared across calls.

pub mod argument;
pub mod call_record;
pub mod error;
pub mod type_info;
pub mod value;

pub use argument::{Argument, ArgumentSlot, CapturedArgument};
pub use call_record::{CallRecord, CallRecordBuilder};
pub use error::{Error, Result};
pub use type_info::TypeInfo;
pub use value::CallValue;
