use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::type_info::TypeInfo;

/// A captured argument value: cheaply clonable, dynamically typed, and
/// possibly absent. The runtime [`TypeInfo`] is captured at construction
/// because a bare `TypeId` cannot be rendered in diagnostics.
///
/// An absent value stands in for the original's `null`; it carries no
/// runtime type.
#[derive(Clone)]
pub struct CallValue {
    inner: Option<Rc<dyn Any>>,
    runtime_type: Option<TypeInfo>,
}

impl CallValue {
    /// Wraps a concrete value, capturing its runtime type descriptor.
    #[must_use]
    pub fn of<T: Any>(value: T) -> Self {
        Self {
            inner: Some(Rc::new(value)),
            runtime_type: Some(TypeInfo::of::<T>()),
        }
    }

    /// The absent value.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            inner: None,
            runtime_type: None,
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        self.inner.is_none()
    }

    /// Runtime type of the held value; `None` when the value is absent.
    #[must_use]
    pub fn runtime_type(&self) -> Option<TypeInfo> {
        self.runtime_type
    }

    /// Shared handle to the value as `T`, when the concrete runtime type
    /// is exactly `T`.
    #[must_use]
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        let inner = self.inner.clone()?;
        inner.downcast::<T>().ok()
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for CallValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.runtime_type {
            Some(runtime_type) => write!(f, "CallValue({})", runtime_type.short_name()),
            None => f.write_str("CallValue(none)"),
        }
    }
}
