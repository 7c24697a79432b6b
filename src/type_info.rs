use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime type descriptor: a [`TypeId`] paired with the full type-name
/// string so diagnostics can render the type a caller asked for.
///
/// Equality and hashing go through the id only; the name is display-only
/// and may differ between compilations.
#[derive(Clone, Copy, Debug)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    /// Descriptor for a static type.
    #[must_use]
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Descriptor for a loosely-typed ("object"-like) declared parameter.
    /// A slot declared erased accepts a value of any runtime type.
    #[must_use]
    pub fn erased() -> Self {
        Self::of::<dyn Any>()
    }

    #[must_use]
    pub fn is_erased(self) -> bool {
        self.id == TypeId::of::<dyn Any>()
    }

    #[must_use]
    pub fn id(self) -> TypeId {
        self.id
    }

    /// Full name as reported by `std::any::type_name`.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.name
    }

    /// Unqualified name, with generic arguments shortened segment-wise:
    /// `core::option::Option<alloc::string::String>` becomes
    /// `Option<String>`.
    #[must_use]
    pub fn short_name(self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut segment = String::new();
        for ch in self.name.chars() {
            if ch.is_alphanumeric() || ch == '_' || ch == ':' {
                segment.push(ch);
            } else {
                flush_segment(&mut out, &mut segment);
                out.push(ch);
            }
        }
        flush_segment(&mut out, &mut segment);
        out
    }
}

fn flush_segment(out: &mut String, segment: &mut String) {
    if segment.is_empty() {
        return;
    }
    let short = segment.rsplit("::").next().unwrap_or(segment.as_str());
    out.push_str(short);
    segment.clear();
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// Renders a type sequence the way every diagnostic in this crate does:
/// short names, comma-and-space joined, order preserved.
#[must_use]
pub fn join_short_names<I>(types: I) -> String
where
    I: IntoIterator<Item = TypeInfo>,
{
    types
        .into_iter()
        .map(TypeInfo::short_name)
        .collect::<Vec<_>>()
        .join(", ")
}
