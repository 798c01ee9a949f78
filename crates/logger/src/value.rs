//! Runtime values accepted as log arguments.

use serde::Serialize;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Declared display type of an identity-bearing value.
///
/// Each display type owns its own id bucket in the identity registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayType {
    /// A task or thread of execution (`T`).
    Task,
    /// A callable (`f`).
    Callable,
    /// A native handle such as a socket or file descriptor (`c`).
    Native,
    /// Any other declared type, rendered with the given prefix.
    Named(&'static str),
}

impl DisplayType {
    /// Prefix placed in front of the id in a display token.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Task => "T",
            Self::Callable => "f",
            Self::Native => "c",
            Self::Named(prefix) => prefix,
        }
    }
}

/// Capability interface for values with identity.
///
/// Every method is optional. A value that declares nothing is rendered as an
/// opaque `o<id>` token.
pub trait Inspect: Any + Send + Sync {
    /// The declared display type, if any.
    fn display_type(&self) -> Option<DisplayType> {
        None
    }

    /// Custom display text. Takes precedence over the structural dump and the
    /// identity token.
    fn display(&self) -> Option<String> {
        None
    }

    /// Plain data view, pretty-printed when no display type is declared.
    fn structure(&self) -> Option<serde_json::Value> {
        None
    }
}

/// A log argument.
#[derive(Clone)]
pub enum Value<'a> {
    /// Absent value.
    Nil,
    /// Boolean, rendered `Y` / `N`.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Str(Cow<'a, str>),
    /// Plain data aggregate without identity.
    Data(serde_json::Value),
    /// Identity-bearing handle.
    Handle(Arc<dyn Inspect>),
}

impl Value<'static> {
    /// Builds a plain data aggregate from any serializable value.
    ///
    /// A value that fails to serialize becomes a text argument describing the
    /// failure instead.
    pub fn data<T: Serialize + ?Sized>(value: &T) -> Value<'static> {
        match serde_json::to_value(value) {
            Ok(data) => Value::Data(data),
            Err(e) => Value::Str(Cow::Owned(format!("<unserializable: {e}>"))),
        }
    }

    /// Wraps a shared handle.
    pub fn handle<T: Inspect>(value: &Arc<T>) -> Value<'static> {
        Value::Handle(value.clone())
    }
}

impl Value<'_> {
    /// Converts into an owned value.
    #[must_use]
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Nil => Value::Nil,
            Value::Bool(b) => Value::Bool(b),
            Value::Int(i) => Value::Int(i),
            Value::UInt(u) => Value::UInt(u),
            Value::Float(f) => Value::Float(f),
            Value::Str(s) => Value::Str(Cow::Owned(s.into_owned())),
            Value::Data(d) => Value::Data(d),
            Value::Handle(h) => Value::Handle(h),
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("Nil"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::UInt(u) => f.debug_tuple("UInt").field(u).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Data(d) => f.debug_tuple("Data").field(d).finish(),
            Self::Handle(h) => f
                .debug_tuple("Handle")
                .field(&Arc::as_ptr(h).cast::<()>())
                .finish(),
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value<'_> {
            fn from(value: $ty) -> Self {
                Self::Int(i64::from(value))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value<'_> {
            fn from(value: $ty) -> Self {
                Self::UInt(u64::from(value))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<isize> for Value<'_> {
    fn from(value: isize) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Str(Cow::Owned(value.to_string())), Self::Int)
    }
}

impl From<usize> for Value<'_> {
    fn from(value: usize) -> Self {
        u64::try_from(value).map_or_else(|_| Self::Str(Cow::Owned(value.to_string())), Self::UInt)
    }
}

impl From<f32> for Value<'_> {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for Value<'_> {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(value: &'a String) -> Self {
        Self::Str(Cow::Borrowed(value.as_str()))
    }
}

impl From<String> for Value<'_> {
    fn from(value: String) -> Self {
        Self::Str(Cow::Owned(value))
    }
}

impl<'a> From<Cow<'a, str>> for Value<'a> {
    fn from(value: Cow<'a, str>) -> Self {
        Self::Str(value)
    }
}

impl From<serde_json::Value> for Value<'_> {
    fn from(value: serde_json::Value) -> Self {
        Self::Data(value)
    }
}

impl<T: Inspect> From<Arc<T>> for Value<'_> {
    fn from(value: Arc<T>) -> Self {
        Self::Handle(value)
    }
}

impl<T: Inspect> From<&Arc<T>> for Value<'_> {
    fn from(value: &Arc<T>) -> Self {
        Self::Handle(value.clone())
    }
}

impl<'a, T> From<Option<T>> for Value<'a>
where
    T: Into<Value<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

impl<'a> From<&Value<'a>> for Value<'a> {
    fn from(value: &Value<'a>) -> Self {
        value.clone()
    }
}
