use std::fmt::Write;
use std::mem;
use std::sync::Arc;

use crate::fmt::Formatter;
use crate::render::stack::{self, Stack};
use crate::types::ast::{Block, BlockTag, Content, OverrideMap, Partial, Section, Variable};
use crate::value::cow::ValueCow;
use crate::value::Kind;
use crate::{Engine, Error, Result, Value};

/// A renderer that interprets a compiled template's contents.
///
/// One renderer serves one render: it owns the scope stack, the cursor
/// backing `.` lookups, the override chain for template inheritance, and
/// the indentation state for partial expansion. Every push is paired with
/// a restore, so the state returns to its entry shape at every section and
/// partial boundary.
pub(crate) struct RendererImpl<'render> {
    engine: &'render Engine<'render>,
    stack: Stack<'render>,
    cursor: ValueCow<'render>,
    chain: Vec<Arc<OverrideMap>>,
    indent: String,
    needs_indent: bool,
    depth: usize,
}

impl<'render> RendererImpl<'render> {
    pub fn new(engine: &'render Engine<'render>, data: &'render Value) -> Self {
        // A non-object root still becomes the cursor, but resolves keys as
        // if the root scope were an empty object.
        let globals = match data {
            Value::Map(_) => ValueCow::Borrowed(data),
            _ => ValueCow::Owned(Value::Map(crate::value::Map::new())),
        };
        Self {
            engine,
            stack: Stack::new(globals),
            cursor: ValueCow::Borrowed(data),
            chain: Vec::new(),
            indent: String::new(),
            needs_indent: false,
            depth: 0,
        }
    }

    pub fn render(mut self, f: &mut Formatter<'_>, contents: &[Content]) -> Result<()> {
        self.expand(f, contents)?;
        debug_assert!(self.stack.depth() == 1);
        debug_assert!(self.chain.is_empty());
        debug_assert!(self.indent.is_empty());
        Ok(())
    }

    fn expand(&mut self, f: &mut Formatter<'_>, contents: &[Content]) -> Result<()> {
        for content in contents {
            match content {
                Content::Text(text) => self.emit_text(f, text)?,
                Content::Variable(variable) => self.visit_variable(f, variable)?,
                Content::Block(block) => self.visit_block(f, block)?,
                Content::Partial(partial) => self.visit_partial(f, partial)?,
            }
        }
        Ok(())
    }

    /// Emits a text run, injecting the current indent after every interior
    /// newline. A final newline instead arms `needs_indent` so that no
    /// trailing indent is produced at the end of a partial.
    fn emit_text(&mut self, f: &mut Formatter<'_>, text: &str) -> Result<()> {
        debug_assert!(!text.is_empty(), "empty text shouldn't be in the ast");
        if self.indent.is_empty() {
            f.write_str(text)?;
            return Ok(());
        }
        if self.needs_indent {
            f.write_str(&self.indent)?;
        }
        let bytes = text.as_bytes();
        let mut line_start = 0;
        for i in 0..bytes.len() - 1 {
            if bytes[i] == b'\n' {
                f.write_str(&text[line_start..=i])?;
                f.write_str(&self.indent)?;
                line_start = i + 1;
            }
        }
        self.needs_indent = bytes[bytes.len() - 1] == b'\n';
        f.write_str(&text[line_start..])?;
        Ok(())
    }

    fn visit_variable(&mut self, f: &mut Formatter<'_>, variable: &Variable) -> Result<()> {
        let value = match self.resolve(&variable.key) {
            Some(value) => value,
            None => match &self.engine.unresolved {
                Some(unresolved) => ValueCow::Owned(unresolved(&variable.key)),
                None => ValueCow::Owned(Value::None),
            },
        };
        if self.needs_indent {
            f.write_str(&self.indent)?;
            self.needs_indent = false;
        }
        self.print_value(f, !variable.raw, &value)
    }

    fn visit_block(&mut self, f: &mut Formatter<'_>, block: &Block) -> Result<()> {
        if block.tag == BlockTag::Inheritance {
            // The first matching override map wins: it was pushed by the
            // most derived template in the inheritance chain.
            let overriding = self
                .chain
                .iter()
                .find(|map| map.contains_key(&block.key))
                .map(Arc::clone);
            return match overriding.as_ref().and_then(|map| map.get(&block.key)) {
                Some(contents) => self.expand(f, contents),
                None => self.expand(f, &block.contents),
            };
        }

        // A missing section key behaves like an explicit `None`.
        let value = self
            .resolve(&block.key)
            .unwrap_or(ValueCow::Owned(Value::None));
        let saved = mem::replace(&mut self.cursor, value.clone());
        if self.expand_section(f, block.tag, &block.contents, &value)? {
            self.expand(f, &block.contents)?;
        }
        self.cursor = saved;
        Ok(())
    }

    fn visit_partial(&mut self, f: &mut Formatter<'_>, partial: &Partial) -> Result<()> {
        // Unknown partials are skipped.
        let Some(format) = self.engine.templates.get(partial.key.as_str()) else {
            return Ok(());
        };
        if format.contents.is_empty() {
            return Ok(());
        }
        if self.depth >= self.engine.max_partial_depth {
            return Err(Error::max_partial_depth(self.engine.max_partial_depth));
        }

        self.depth += 1;
        let indent_len = self.indent.len();
        let chain_len = self.chain.len();
        self.indent.push_str(&partial.indent);
        self.needs_indent |= !partial.indent.is_empty();
        if let Some(overriders) = &partial.overriders {
            self.chain.push(Arc::clone(overriders));
        }

        let result = self.expand(f, &format.contents);

        self.chain.truncate(chain_len);
        self.indent.truncate(indent_len);
        self.depth -= 1;
        result
    }

    /// Resolves a dotted key against the cursor and the scope chain.
    ///
    /// `.` is the cursor; `.a.b` looks `a` up in the innermost scope only;
    /// any other key walks the whole chain with its first segment and then
    /// descends the rest through object fields.
    fn resolve(&self, key: &str) -> Option<ValueCow<'render>> {
        if key.is_empty() {
            return None;
        }
        if let Some(rest) = key.strip_prefix('.') {
            if rest.is_empty() {
                return Some(self.cursor.clone());
            }
            let mut segments = rest.split('.');
            let first = segments.next()?;
            let value = self.stack.lookup_innermost(first)?;
            return stack::lookup_path(value, segments);
        }
        let mut segments = key.split('.');
        let first = segments.next()?;
        let value = self.stack.lookup(first)?;
        stack::lookup_path(value, segments)
    }

    /// Runs a section body against a resolved value, dispatching on the
    /// section tag and the value kind. Returns whether the caller should
    /// render the body itself in the current environment.
    fn expand_section(
        &mut self,
        f: &mut Formatter<'_>,
        tag: BlockTag,
        contents: &[Content],
        value: &ValueCow<'render>,
    ) -> Result<bool> {
        let mut inverted = false;
        let mut kind = value.kind();
        if kind < Kind::LazyValue {
            match tag {
                BlockTag::Inversion => {
                    inverted = true;
                    kind = Kind::Atom;
                }
                BlockTag::Filter => kind = Kind::Atom,
                BlockTag::Loop => kind = Kind::List,
                BlockTag::Section | BlockTag::Inheritance => {}
            }
        } else if tag == BlockTag::Inversion {
            // An inverted section over a lazy never renders.
            return Ok(false);
        }
        match kind {
            Kind::Null => Ok(inverted),
            Kind::Atom => Ok(value.test() != inverted),
            Kind::Object => {
                self.expand_on_object(f, contents, value)?;
                Ok(false)
            }
            Kind::List => {
                match value {
                    ValueCow::Borrowed(Value::List(items)) => {
                        for item in items {
                            self.cursor = ValueCow::Borrowed(item);
                            self.expand_on_value(f, contents, &ValueCow::Borrowed(item))?;
                        }
                    }
                    ValueCow::Owned(Value::List(items)) => {
                        for item in items {
                            let item = ValueCow::Owned(item.clone());
                            self.cursor = item.clone();
                            self.expand_on_value(f, contents, &item)?;
                        }
                    }
                    // A loop section over a non-list renders the body once
                    // against the value itself.
                    value => self.expand_on_value(f, contents, value)?,
                }
                Ok(false)
            }
            Kind::LazyValue => {
                let Value::Lazy(lazy) = &**value else {
                    unreachable!()
                };
                let section = Section { contents };
                let value = ValueCow::Owned(lazy.call(Some(&section)));
                self.expand_section(f, tag, contents, &value)
            }
            Kind::LazyFormat => {
                // A filter over a lazy format signals the caller to render
                // the body itself.
                if tag == BlockTag::Filter {
                    return Ok(true);
                }
                let Value::LazyFormat(lazy) = &**value else {
                    unreachable!()
                };
                let section = Section { contents };
                let format = lazy.call(Some(&section));
                self.expand(f, &format.contents)?;
                Ok(false)
            }
        }
    }

    fn expand_on_object(
        &mut self,
        f: &mut Formatter<'_>,
        contents: &[Content],
        value: &ValueCow<'render>,
    ) -> Result<()> {
        self.stack.push(value.clone());
        let result = self.expand(f, contents);
        self.stack.pop();
        result
    }

    fn expand_on_value(
        &mut self,
        f: &mut Formatter<'_>,
        contents: &[Content],
        value: &ValueCow<'render>,
    ) -> Result<()> {
        if value.kind() == Kind::Object {
            self.expand_on_object(f, contents, value)
        } else {
            self.expand(f, contents)
        }
    }

    /// Prints a value in variable position. Lazies are invoked without a
    /// section body; only strings pass through the escape function.
    fn print_value(&mut self, f: &mut Formatter<'_>, escape: bool, value: &Value) -> Result<()> {
        match value {
            Value::None => {}
            Value::Bool(b) => write!(f, "{b}")?,
            Value::Integer(n) => write!(f, "{n}")?,
            Value::Float(n) => write!(f, "{n}")?,
            Value::String(s) => {
                if escape {
                    (self.engine.escape)(f, s)?;
                } else {
                    f.write_str(s)?;
                }
            }
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        f.write_str(",")?;
                    }
                    self.print_value(f, escape, item)?;
                }
            }
            Value::Map(_) => f.write_str("[Object]")?,
            Value::Lazy(lazy) => {
                let value = lazy.call(None);
                self.print_value(f, escape, &value)?;
            }
            Value::LazyFormat(lazy) => {
                let format = lazy.call(None);
                self.expand(f, &format.contents)?;
            }
        }
        Ok(())
    }
}
