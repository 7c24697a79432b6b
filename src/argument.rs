use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::type_info::TypeInfo;
use crate::value::CallValue;

/// One parameter slot of an intercepted call: its declared type, the
/// runtime type of the supplied value, the current value, and whether the
/// slot may legally be written back to the caller.
///
/// By-ref-ness is a flag and the declared type is always the element type;
/// there are no wrapped by-ref descriptors to unwrap during lookup.
///
/// `set_value` is a plain write-through; settability validation (by-ref
/// flag, type compatibility) happens in the call record before it is
/// invoked.
pub trait Argument {
    fn declared_type(&self) -> TypeInfo;

    /// Runtime type of the current value, falling back to the declared
    /// type while the value is absent.
    fn actual_type(&self) -> TypeInfo;

    fn value(&self) -> CallValue;

    fn set_value(&self, value: CallValue);

    fn is_by_ref(&self) -> bool;

    fn is_declared_type_compatible_with(&self, requested: TypeInfo) -> bool;

    fn is_value_assignable_to(&self, requested: TypeInfo) -> bool;

    fn can_accept_runtime_type(&self, runtime_type: TypeInfo) -> bool;
}

/// Caller-owned storage for one parameter. The interception layer keeps a
/// clone of the handle; the record's argument writes through the same
/// cell, so the call site observes a successful `set` synchronously.
#[derive(Clone, Debug)]
pub struct ArgumentSlot {
    cell: Rc<RefCell<CallValue>>,
}

impl ArgumentSlot {
    #[must_use]
    pub fn new(value: CallValue) -> Self {
        Self {
            cell: Rc::new(RefCell::new(value)),
        }
    }

    #[must_use]
    pub fn get(&self) -> CallValue {
        self.cell.borrow().clone()
    }

    pub fn set(&self, value: CallValue) {
        *self.cell.borrow_mut() = value;
    }
}

/// Default [`Argument`] implementation used by the builder. Interception
/// layers with their own storage model can substitute any other impl.
pub struct CapturedArgument {
    declared: TypeInfo,
    by_ref: bool,
    slot: ArgumentSlot,
}

impl CapturedArgument {
    /// An ordinary by-value parameter; the record owns the only handle.
    #[must_use]
    pub fn by_value(declared: TypeInfo, value: CallValue) -> Self {
        Self {
            declared,
            by_ref: false,
            slot: ArgumentSlot::new(value),
        }
    }

    /// A ref/out-style parameter backed by a shared slot handle.
    #[must_use]
    pub fn by_ref(declared: TypeInfo, slot: ArgumentSlot) -> Self {
        Self {
            declared,
            by_ref: true,
            slot,
        }
    }

    /// Another handle to this argument's storage.
    #[must_use]
    pub fn slot(&self) -> ArgumentSlot {
        self.slot.clone()
    }
}

impl Argument for CapturedArgument {
    fn declared_type(&self) -> TypeInfo {
        self.declared
    }

    fn actual_type(&self) -> TypeInfo {
        self.slot.get().runtime_type().unwrap_or(self.declared)
    }

    fn value(&self) -> CallValue {
        self.slot.get()
    }

    fn set_value(&self, value: CallValue) {
        trace!(declared = %self.declared, "argument write-through");
        self.slot.set(value);
    }

    fn is_by_ref(&self) -> bool {
        self.by_ref
    }

    fn is_declared_type_compatible_with(&self, requested: TypeInfo) -> bool {
        self.declared == requested
    }

    fn is_value_assignable_to(&self, requested: TypeInfo) -> bool {
        self.slot
            .get()
            .runtime_type()
            .is_some_and(|runtime_type| runtime_type == requested)
    }

    fn can_accept_runtime_type(&self, runtime_type: TypeInfo) -> bool {
        self.declared.is_erased() || self.declared == runtime_type
    }
}
