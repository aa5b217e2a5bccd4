//! Runtime type metadata.
//!
//! Route compilation compares the type an extractor produces with the type a
//! handler parameter declares, and with the input type a validator accepts.
//! [`TypeInfo`] carries that identity. Besides concrete types it has three
//! abstract families used by validators: any value, any number, any text.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Family {
    Exact,
    Any,
    Number,
    Text,
}

struct AnyMarker;
struct NumberMarker;
struct TextMarker;

/// Identity and display name of a type.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    family: Family,
}

macro_rules! numeric_ids {
    ($($ty:ty),*) => {
        fn numeric_ids() -> [TypeId; 24] {
            [$(TypeId::of::<$ty>(), TypeId::of::<Option<$ty>>()),*]
        }

        /// Read a numeric value (or a present optional one) as `f64`.
        pub fn numeric_value(value: &dyn Any) -> Option<f64> {
            $(
                if let Some(v) = value.downcast_ref::<$ty>() {
                    return Some(*v as f64);
                }
                if let Some(v) = value.downcast_ref::<Option<$ty>>() {
                    return v.map(|v| v as f64);
                }
            )*
            None
        }
    };
}

numeric_ids!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// Read a text value (or a present optional one).
pub fn text_value(value: &dyn Any) -> Option<&str> {
    if let Some(s) = value.downcast_ref::<String>() {
        return Some(s);
    }
    value
        .downcast_ref::<Option<String>>()
        .and_then(|s| s.as_deref())
}

/// Whether a value is an explicit "no value" marker (`None` of a common type).
pub fn is_absent(value: &dyn Any) -> bool {
    value.downcast_ref::<Option<String>>().is_some_and(Option::is_none)
        || (numeric_value(value).is_none() && TypeInfo::numeric_id(value.type_id()))
}

impl TypeInfo {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            family: Family::Exact,
        }
    }

    /// Accepts every type.
    pub fn any() -> Self {
        Self {
            id: TypeId::of::<AnyMarker>(),
            name: "any",
            family: Family::Any,
        }
    }

    /// Accepts every integer and float type and their `Option`s.
    pub fn number() -> Self {
        Self {
            id: TypeId::of::<NumberMarker>(),
            name: "number",
            family: Family::Number,
        }
    }

    /// Accepts `String` and `Option<String>`.
    pub fn text() -> Self {
        Self {
            id: TypeId::of::<TextMarker>(),
            name: "text",
            family: Family::Text,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.family == Family::Exact && self.id == TypeId::of::<T>()
    }

    pub fn is_abstract(&self) -> bool {
        self.family != Family::Exact
    }

    fn numeric_id(id: TypeId) -> bool {
        numeric_ids().contains(&id)
    }

    pub fn is_numeric(&self) -> bool {
        self.family == Family::Number
            || (self.family == Family::Exact && Self::numeric_id(self.id))
    }

    pub fn is_text(&self) -> bool {
        self.family == Family::Text || self.is::<String>() || self.is::<Option<String>>()
    }

    /// Types whose values are raw request strings: `String` and `Vec<String>`.
    pub fn is_string_like(&self) -> bool {
        self.is::<String>() || self.is::<Vec<String>>()
    }

    /// Whether a value of type `other` can be used where `self` is expected.
    pub fn is_assignable_from(&self, other: &TypeInfo) -> bool {
        match self.family {
            Family::Any => true,
            Family::Number => other.is_numeric(),
            Family::Text => other.is_text(),
            Family::Exact => other.family == Family::Exact && other.id == self.id,
        }
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.family == other.family
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.family.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
