//! Defines the [`Value`] type that templates are rendered against.

pub(crate) mod cow;
mod from;
#[cfg(feature = "serde")]
mod ser;

use std::fmt;
use std::sync::Arc;

pub use std::collections::BTreeMap as Map;
pub use std::vec::Vec as List;

#[cfg(feature = "serde")]
pub use crate::value::ser::to_value;
use crate::{Format, Section};

/// Data to be rendered, represented as a recursive enum.
///
/// In addition to the usual scalar, list, and map shapes a value can be
/// *lazy*: a [`lazy`][Value::lazy] thunk yields another value on demand and
/// a [`lazy_format`][Value::lazy_format] thunk yields a whole compiled
/// template, which is rendered in the environment of the tag that invoked
/// it. These correspond to Mustache lambdas.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(List<Value>),
    Map(Map<String, Value>),
    Lazy(Lazy),
    LazyFormat(LazyFormat),
}

/// A deferred value.
///
/// Invoked with the surrounding section body in section position and with
/// `None` in variable position; the value it yields is rendered in its
/// place, recursively if it is itself lazy.
#[derive(Clone)]
pub struct Lazy(Arc<dyn Fn(Option<&Section<'_>>) -> Value + Send + Sync>);

/// A deferred template.
///
/// Invoked like [`Lazy`], but yields a compiled [`Format`] which is rendered
/// in the current environment.
#[derive(Clone)]
pub struct LazyFormat(Arc<dyn Fn(Option<&Section<'_>>) -> Format + Send + Sync>);

/// The coarse kinds the section interpreter dispatches on.
///
/// The strict kinds order before the lazy kinds; that ordering is the only
/// property the interpreter relies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Kind {
    Null,
    Atom,
    Object,
    List,
    LazyValue,
    LazyFormat,
}

impl Value {
    /// Constructs a lazy value from a thunk.
    ///
    /// ```
    /// use bristle::Value;
    ///
    /// let v = Value::lazy(|_section| Value::from("computed later"));
    /// ```
    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn(Option<&Section<'_>>) -> Value + Send + Sync + 'static,
    {
        Self::Lazy(Lazy(Arc::new(f)))
    }

    /// Constructs a lazy format from a thunk.
    ///
    /// ```
    /// use bristle::{Format, Value};
    ///
    /// let v = Value::lazy_format(|_section| Format::new("<b>{{text}}</b>").unwrap());
    /// ```
    pub fn lazy_format<F>(f: F) -> Self
    where
        F: Fn(Option<&Section<'_>>) -> Format + Send + Sync + 'static,
    {
        Self::LazyFormat(LazyFormat(Arc::new(f)))
    }

    pub(crate) fn kind(&self) -> Kind {
        match self {
            Value::None => Kind::Null,
            Value::Bool(_) | Value::Integer(_) | Value::Float(_) | Value::String(_) => Kind::Atom,
            Value::Map(_) => Kind::Object,
            Value::List(_) => Kind::List,
            Value::Lazy(_) => Kind::LazyValue,
            Value::LazyFormat(_) => Kind::LazyFormat,
        }
    }

    /// Truthiness in section position.
    pub(crate) fn test(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(list) => !list.is_empty(),
            Value::Map(_) => true,
            Value::Lazy(_) | Value::LazyFormat(_) => true,
        }
    }
}

impl Lazy {
    pub(crate) fn call(&self, section: Option<&Section<'_>>) -> Value {
        (self.0)(section)
    }
}

impl LazyFormat {
    pub(crate) fn call(&self, section: Option<&Section<'_>>) -> Format {
        (self.0)(section)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Lazy(a), Value::Lazy(b)) => Arc::ptr_eq(&a.0, &b.0),
            (Value::LazyFormat(a), Value::LazyFormat(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Integer(n) => f.debug_tuple("Integer").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::List(list) => f.debug_tuple("List").field(list).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Lazy(_) => f.write_str("Lazy(..)"),
            Value::LazyFormat(_) => f.write_str("LazyFormat(..)"),
        }
    }
}
