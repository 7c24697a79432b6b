use std::any::Any;
use std::rc::Rc;

use tracing::trace;

use crate::argument::{Argument, ArgumentSlot, CapturedArgument};
use crate::error::{Error, Result};
use crate::type_info::{TypeInfo, join_short_names};
use crate::value::CallValue;

/// One intercepted invocation: an ordered, fixed-size sequence of argument
/// slots plus the generic type arguments the call was instantiated with.
///
/// A record is created once per intercepted call, consumed on the thread
/// that made the call, and discarded when the stubbed behaviour has run.
/// Length and order never change; only the values of by-ref slots do.
pub struct CallRecord {
    arguments: Vec<Box<dyn Argument>>,
    generic_type_arguments: Vec<TypeInfo>,
}

impl CallRecord {
    #[must_use]
    pub fn new(arguments: Vec<Box<dyn Argument>>, generic_type_arguments: Vec<TypeInfo>) -> Self {
        Self {
            arguments,
            generic_type_arguments,
        }
    }

    #[must_use]
    pub fn builder() -> CallRecordBuilder {
        CallRecordBuilder::default()
    }

    /// Number of argument slots, fixed at construction.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Current value at `index`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` when `index` is outside `[0, len)`.
    pub fn get(&self, index: usize) -> Result<CallValue> {
        Ok(self.argument_at(index)?.value())
    }

    /// Writes `value` through to the slot at `index`, so the original call
    /// site observes the change before this returns.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` when `index` is outside `[0, len)`;
    /// `ArgumentIsNotOutOrRef` when the slot is not a ref/out parameter;
    /// `ArgumentSetWithIncompatibleValue` when a non-absent value's runtime
    /// type is not accepted by the slot's declared type. An absent value
    /// always passes the type check. A failed `set` leaves the slot
    /// untouched.
    pub fn set(&self, index: usize, value: CallValue) -> Result<()> {
        let argument = self.argument_at(index)?;
        if !argument.is_by_ref() {
            return Err(Error::ArgumentIsNotOutOrRef {
                index,
                declared: argument.declared_type(),
            });
        }
        if let Some(runtime_type) = value.runtime_type() {
            if !argument.can_accept_runtime_type(runtime_type) {
                return Err(Error::ArgumentSetWithIncompatibleValue {
                    index,
                    declared: argument.declared_type(),
                    supplied: runtime_type,
                });
            }
        }
        argument.set_value(value);
        Ok(())
    }

    /// Generic type arguments of the invocation; empty for non-generic
    /// calls.
    #[must_use]
    pub fn generic_arguments(&self) -> &[TypeInfo] {
        &self.generic_type_arguments
    }

    /// Snapshot of every slot's current value, in call order.
    #[must_use]
    pub fn args(&self) -> Vec<CallValue> {
        self.arguments
            .iter()
            .map(|argument| argument.value())
            .collect()
    }

    /// Declared type of every slot, in call order.
    #[must_use]
    pub fn arg_types(&self) -> Vec<TypeInfo> {
        self.arguments
            .iter()
            .map(|argument| argument.declared_type())
            .collect()
    }

    /// Retrieves the one argument of type `T` without knowing its
    /// position.
    ///
    /// Resolution runs in two independent passes. Pass 1 matches on
    /// declared types; a single match wins and two or more are ambiguous,
    /// even when fewer value-assignable matches exist. Pass 2 runs only
    /// when pass 1 found nothing and matches on the runtime type of each
    /// slot's current value, which covers loosely-typed declarations
    /// holding a more specific value.
    ///
    /// # Errors
    ///
    /// `AmbiguousArguments` when either pass yields more than one
    /// candidate; `ArgumentNotFound` when both passes yield none;
    /// `InvalidCast` when the matched slot's value is absent.
    pub fn arg<T: Any>(&self) -> Result<Rc<T>> {
        let requested = TypeInfo::of::<T>();

        let declared = self.matching(|argument| {
            argument.is_declared_type_compatible_with(requested)
        });
        match declared.as_slice() {
            [] => {}
            [(index, argument)] => return typed_value(*index, *argument, requested),
            _ => return Err(self.ambiguous(requested)),
        }

        trace!(%requested, "no declared-type match, trying value assignability");
        let assignable = self.matching(|argument| argument.is_value_assignable_to(requested));
        match assignable.as_slice() {
            [] => Err(Error::ArgumentNotFound { requested }),
            [(index, argument)] => typed_value(*index, *argument, requested),
            _ => Err(self.ambiguous(requested)),
        }
    }

    /// Value at `position`, cast to `T`. The positional alternative to
    /// [`CallRecord::arg`] for callers that already know the slot.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` when `position` is outside `[0, len)`;
    /// `InvalidCast` when the stored value (including an absent value)
    /// cannot be converted to `T`.
    pub fn arg_at<T: Any>(&self, position: usize) -> Result<Rc<T>> {
        let argument = self.argument_at(position)?;
        typed_value(position, argument, TypeInfo::of::<T>())
    }

    fn argument_at(&self, index: usize) -> Result<&dyn Argument> {
        self.arguments
            .get(index)
            .map(|argument| argument.as_ref())
            .ok_or_else(|| Error::IndexOutOfRange {
                index,
                len: self.arguments.len(),
            })
    }

    fn matching<F>(&self, predicate: F) -> Vec<(usize, &dyn Argument)>
    where
        F: Fn(&dyn Argument) -> bool,
    {
        self.arguments
            .iter()
            .enumerate()
            .map(|(index, argument)| (index, argument.as_ref()))
            .filter(|(_, argument)| predicate(*argument))
            .collect()
    }

    fn ambiguous(&self, requested: TypeInfo) -> Error {
        Error::AmbiguousArguments {
            requested,
            declared_signature: join_short_names(
                self.arguments.iter().map(|argument| argument.declared_type()),
            ),
            actual_signature: join_short_names(
                self.arguments.iter().map(|argument| argument.actual_type()),
            ),
        }
    }
}

fn typed_value<T: Any>(
    position: usize,
    argument: &dyn Argument,
    requested: TypeInfo,
) -> Result<Rc<T>> {
    argument
        .value()
        .downcast::<T>()
        .ok_or(Error::InvalidCast {
            position,
            requested,
        })
}

/// Assembles a [`CallRecord`] slot by slot, for interception layers and
/// tests.
#[derive(Default)]
pub struct CallRecordBuilder {
    arguments: Vec<Box<dyn Argument>>,
    generic_type_arguments: Vec<TypeInfo>,
}

impl CallRecordBuilder {
    /// An ordinary by-value parameter declared as the value's own type.
    #[must_use]
    pub fn by_value<T: Any>(mut self, value: T) -> Self {
        self.arguments.push(Box::new(CapturedArgument::by_value(
            TypeInfo::of::<T>(),
            CallValue::of(value),
        )));
        self
    }

    /// A loosely-typed parameter: declared erased, holding a more specific
    /// value.
    #[must_use]
    pub fn erased<T: Any>(mut self, value: T) -> Self {
        self.arguments.push(Box::new(CapturedArgument::by_value(
            TypeInfo::erased(),
            CallValue::of(value),
        )));
        self
    }

    /// A ref/out-style parameter backed by a slot handle the call site
    /// also holds.
    #[must_use]
    pub fn by_ref(mut self, declared: TypeInfo, slot: ArgumentSlot) -> Self {
        self.arguments
            .push(Box::new(CapturedArgument::by_ref(declared, slot)));
        self
    }

    /// A custom [`Argument`] implementation.
    #[must_use]
    pub fn argument(mut self, argument: Box<dyn Argument>) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Appends a generic type argument of the invocation.
    #[must_use]
    pub fn generic<T: Any + ?Sized>(mut self) -> Self {
        self.generic_type_arguments.push(TypeInfo::of::<T>());
        self
    }

    #[must_use]
    pub fn build(self) -> CallRecord {
        CallRecord::new(self.arguments, self.generic_type_arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_argument_call() -> (CallRecord, ArgumentSlot) {
        // (name: String = "x", count: i32 = 5, flag: out bool)
        let flag = ArgumentSlot::new(CallValue::none());
        let record = CallRecord::builder()
            .by_value(String::from("x"))
            .by_value(5_i32)
            .by_ref(TypeInfo::of::<bool>(), flag.clone())
            .build();
        (record, flag)
    }

    #[test]
    fn get_returns_construction_values() {
        let (record, _flag) = three_argument_call();
        assert_eq!(record.len(), 3);
        assert!(!record.is_empty());
        assert_eq!(record.get(0).unwrap().downcast_ref::<String>().unwrap(), "x");
        assert_eq!(record.get(1).unwrap().downcast_ref::<i32>(), Some(&5));
        assert!(record.get(2).unwrap().is_none());
    }

    #[test]
    fn get_out_of_range_reports_index_and_len() {
        let (record, _flag) = three_argument_call();
        assert_eq!(
            record.get(3).unwrap_err(),
            Error::IndexOutOfRange { index: 3, len: 3 }
        );
    }

    #[test]
    fn declared_type_match_wins_over_assignability() {
        // Slot 0 is declared i32; slot 1 is erased but also holds an i32.
        let record = CallRecord::builder().by_value(5_i32).erased(7_i32).build();
        assert_eq!(*record.arg::<i32>().unwrap(), 5);
    }

    #[test]
    fn two_declared_matches_are_ambiguous_even_without_values() {
        let record = CallRecord::builder()
            .by_ref(TypeInfo::of::<i32>(), ArgumentSlot::new(CallValue::none()))
            .by_ref(TypeInfo::of::<i32>(), ArgumentSlot::new(CallValue::none()))
            .build();
        let err = record.arg::<i32>().unwrap_err();
        assert!(matches!(err, Error::AmbiguousArguments { .. }));
    }

    #[test]
    fn fallback_pass_matches_on_value_type() {
        // (a: object = 1, b: object = "s")
        let record = CallRecord::builder()
            .erased(1_i32)
            .erased(String::from("s"))
            .build();
        assert_eq!(record.arg::<String>().unwrap().as_str(), "s");
        assert_eq!(*record.arg::<i32>().unwrap(), 1);
    }

    #[test]
    fn two_fallback_matches_are_ambiguous() {
        let record = CallRecord::builder()
            .erased(1_i32)
            .erased(2_i32)
            .build();
        let err = record.arg::<i32>().unwrap_err();
        assert!(matches!(err, Error::AmbiguousArguments { .. }));
    }

    #[test]
    fn no_match_in_either_pass_is_not_found() {
        let (record, _flag) = three_argument_call();
        assert_eq!(
            record.arg::<f64>(),
            Err(Error::ArgumentNotFound {
                requested: TypeInfo::of::<f64>(),
            })
        );
    }

    #[test]
    fn declared_match_with_absent_value_is_an_invalid_cast() {
        let record = CallRecord::builder()
            .by_ref(TypeInfo::of::<bool>(), ArgumentSlot::new(CallValue::none()))
            .build();
        assert_eq!(
            record.arg::<bool>(),
            Err(Error::InvalidCast {
                position: 0,
                requested: TypeInfo::of::<bool>(),
            })
        );
    }

    #[test]
    fn set_rejects_by_value_slots_without_mutating() {
        let (record, _flag) = three_argument_call();
        assert_eq!(
            record.set(0, CallValue::of(42_i32)),
            Err(Error::ArgumentIsNotOutOrRef {
                index: 0,
                declared: TypeInfo::of::<String>(),
            })
        );
        assert_eq!(record.get(0).unwrap().downcast_ref::<String>().unwrap(), "x");
    }

    #[test]
    fn set_writes_through_compatible_by_ref_values() {
        let (record, flag) = three_argument_call();
        record.set(2, CallValue::of(true)).unwrap();
        assert_eq!(record.get(2).unwrap().downcast_ref::<bool>(), Some(&true));
        assert_eq!(flag.get().downcast_ref::<bool>(), Some(&true));
    }

    #[test]
    fn set_rejects_incompatible_values_without_mutating() {
        let (record, flag) = three_argument_call();
        record.set(2, CallValue::of(true)).unwrap();
        assert_eq!(
            record.set(2, CallValue::of(7_i32)),
            Err(Error::ArgumentSetWithIncompatibleValue {
                index: 2,
                declared: TypeInfo::of::<bool>(),
                supplied: TypeInfo::of::<i32>(),
            })
        );
        assert_eq!(flag.get().downcast_ref::<bool>(), Some(&true));
    }

    #[test]
    fn set_accepts_an_absent_value_regardless_of_declared_type() {
        let (record, flag) = three_argument_call();
        record.set(2, CallValue::of(true)).unwrap();
        record.set(2, CallValue::none()).unwrap();
        assert!(flag.get().is_none());
    }

    #[test]
    fn set_out_of_range_is_checked_before_settability() {
        let (record, _flag) = three_argument_call();
        assert_eq!(
            record.set(9, CallValue::of(true)),
            Err(Error::IndexOutOfRange { index: 9, len: 3 })
        );
    }

    #[test]
    fn bulk_accessors_follow_call_order() {
        let (record, _flag) = three_argument_call();
        let args = record.args();
        assert_eq!(args.len(), 3);
        assert_eq!(args[1].downcast_ref::<i32>(), Some(&5));

        let types = record.arg_types();
        assert_eq!(
            types,
            vec![
                TypeInfo::of::<String>(),
                TypeInfo::of::<i32>(),
                TypeInfo::of::<bool>(),
            ]
        );
    }

    #[test]
    fn generic_arguments_are_exposed_verbatim() {
        let record = CallRecord::builder()
            .by_value(5_i32)
            .generic::<String>()
            .generic::<i32>()
            .build();
        assert_eq!(
            record.generic_arguments(),
            &[TypeInfo::of::<String>(), TypeInfo::of::<i32>()]
        );

        let plain = CallRecord::builder().by_value(5_i32).build();
        assert!(plain.generic_arguments().is_empty());
    }

    #[test]
    fn arg_at_casts_positionally() {
        let (record, _flag) = three_argument_call();
        assert_eq!(record.arg_at::<String>(0).unwrap().as_str(), "x");
        assert_eq!(*record.arg_at::<i32>(1).unwrap(), 5);
        assert_eq!(
            record.arg_at::<i32>(9),
            Err(Error::IndexOutOfRange { index: 9, len: 3 })
        );
        assert_eq!(
            record.arg_at::<bool>(1),
            Err(Error::InvalidCast {
                position: 1,
                requested: TypeInfo::of::<bool>(),
            })
        );
    }
}
