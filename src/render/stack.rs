//! The scope chain that dotted keys are resolved against.

use crate::value::cow::ValueCow;
use crate::Value;

/// The object scopes a render is currently inside, innermost last.
///
/// Every frame is an object value; the root frame wraps an empty object
/// when the render data is not an object.
#[cfg_attr(test, derive(Debug))]
pub(crate) struct Stack<'render> {
    frames: Vec<ValueCow<'render>>,
}

impl<'render> Stack<'render> {
    pub fn new(globals: ValueCow<'render>) -> Self {
        Self {
            frames: vec![globals],
        }
    }

    pub fn push(&mut self, frame: ValueCow<'render>) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Looks a key up through the whole chain. The innermost frame whose
    /// object contains the key wins, even when the stored value is `None`.
    pub fn lookup(&self, key: &str) -> Option<ValueCow<'render>> {
        self.frames.iter().rev().find_map(|frame| get(frame, key))
    }

    /// Looks a key up in the innermost frame only. Leading-dot keys such as
    /// `.name` resolve this way.
    pub fn lookup_innermost(&self, key: &str) -> Option<ValueCow<'render>> {
        self.frames.last().and_then(|frame| get(frame, key))
    }
}

/// Fetches a field from an object frame. Owned frames clone only the edge
/// value that is looked up.
fn get<'render>(frame: &ValueCow<'render>, key: &str) -> Option<ValueCow<'render>> {
    match frame {
        ValueCow::Borrowed(Value::Map(map)) => map.get(key).map(ValueCow::Borrowed),
        ValueCow::Owned(Value::Map(map)) => map.get(key).map(|v| ValueCow::Owned(v.clone())),
        _ => None,
    }
}

/// Descends through nested objects with the remaining segments of a dotted
/// key. Any missing key or non-object intermediate resolves to nothing.
pub(crate) fn lookup_path<'render, 'key>(
    value: ValueCow<'render>,
    path: impl Iterator<Item = &'key str>,
) -> Option<ValueCow<'render>> {
    match value {
        ValueCow::Borrowed(v) => {
            let mut v = v;
            for segment in path {
                v = field(v, segment)?;
            }
            Some(ValueCow::Borrowed(v))
        }
        ValueCow::Owned(v) => {
            let mut curr = &v;
            for segment in path {
                curr = field(curr, segment)?;
            }
            Some(ValueCow::Owned(curr.clone()))
        }
    }
}

fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Map(map) => map.get(key),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn lookup_walks_outward() {
        let outer = Value::from([("a", "outer"), ("b", "outer")]);
        let inner = Value::from([("a", "inner")]);
        let mut stack = Stack::new(ValueCow::Borrowed(&outer));
        stack.push(ValueCow::Borrowed(&inner));

        assert_eq!(&*stack.lookup("a").unwrap(), &Value::from("inner"));
        assert_eq!(&*stack.lookup("b").unwrap(), &Value::from("outer"));
        assert!(stack.lookup("c").is_none());
    }

    #[test]
    fn lookup_stops_on_explicit_none() {
        let outer = Value::from([("a", Value::from("outer"))]);
        let inner = Value::from([("a", Value::None)]);
        let mut stack = Stack::new(ValueCow::Borrowed(&outer));
        stack.push(ValueCow::Borrowed(&inner));

        assert_eq!(&*stack.lookup("a").unwrap(), &Value::None);
    }

    #[test]
    fn lookup_innermost_ignores_parents() {
        let outer = Value::from([("a", "outer")]);
        let inner = Value::from([("b", "inner")]);
        let mut stack = Stack::new(ValueCow::Borrowed(&outer));
        stack.push(ValueCow::Borrowed(&inner));

        assert!(stack.lookup_innermost("a").is_none());
        assert_eq!(&*stack.lookup_innermost("b").unwrap(), &Value::from("inner"));
    }

    #[test]
    fn lookup_path_descends_objects() {
        let value = Value::from([("b", Value::from([("c", Value::from("hi"))]))]);
        let found = lookup_path(ValueCow::Borrowed(&value), ["b", "c"].into_iter()).unwrap();
        assert_eq!(&*found, &Value::from("hi"));
    }

    #[test]
    fn lookup_path_fails_on_non_object_intermediate() {
        let value = Value::from([("b", 1)]);
        assert!(lookup_path(ValueCow::Borrowed(&value), ["b", "c"].into_iter()).is_none());
    }

    #[test]
    fn lookup_path_owned_clones_edge() {
        let value = Value::from([("b", Value::from([("c", Value::from("hi"))]))]);
        let found = lookup_path(ValueCow::Owned(value), ["b", "c"].into_iter()).unwrap();
        assert!(matches!(found, ValueCow::Owned(_)));
        assert_eq!(&*found, &Value::from("hi"));
    }
}
