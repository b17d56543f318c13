//! A Mustache-compatible template engine.
//!
//! # Features
//!
//! - Variables with dotted keys: `{{user.name}}`, raw emission with
//!   `{{{html}}}` or `{{&html}}`
//! - Sections and inverted sections: `{{#items}} … {{/items}}`,
//!   `{{^items}} … {{/items}}`
//! - Loop and filter sections: `{{*item}} … {{/item}}`,
//!   `{{?cond}} … {{/cond}}`
//! - Partials with Mustache-compliant indentation: `{{>header}}`
//! - Template inheritance: `{{<base}}{{$block}} … {{/block}}{{/base}}`
//! - Lazy values and lazy formats (Mustache lambdas)
//! - Comments `{{! … }}` and custom delimiters `{{=<% %>=}}`
//! - Render using any [`serde`][serde] serializable value, or construct
//!   data with the [`value!`] macro
//! - Configurable escaping; HTML escaping by default
//!
//! # Introduction
//!
//! Your entry point is the compilation and rendering [`Engine`], which
//! stores named templates and the escape configuration. Templates stored in
//! the engine are also what `{{>partial}}` tags resolve against. Generally
//! you only need to construct one engine.
//!
//! ```
//! let engine = bristle::Engine::new();
//! ```
//!
//! Compiling a template returns a [`Template`] bound to the engine.
//!
//! ```
//! # let engine = bristle::Engine::new();
//! let template = engine.compile("Hello {{name}}!")?;
//! let result = template.render(bristle::value! { name: "World" })?;
//! assert_eq!(result, "Hello World!");
//! # Ok::<(), bristle::Error>(())
//! ```
//!
//! # Examples
//!
//! ### Render using structured data
//!
//! ```
//! #[derive(serde::Serialize)]
//! struct Context {
//!     user: User,
//! }
//!
//! #[derive(serde::Serialize)]
//! struct User {
//!     name: String,
//! }
//!
//! let ctx = Context {
//!     user: User {
//!         name: "John Smith".into(),
//!     },
//! };
//!
//! let result = bristle::Engine::new()
//!     .compile("Hello {{user.name}}")?
//!     .render(&ctx)?;
//!
//! assert_eq!(result, "Hello John Smith");
//! # Ok::<(), bristle::Error>(())
//! ```
//!
//! ### Partials
//!
//! Named templates double as the partial lookup context. A standalone
//! partial tag passes its leading whitespace on to every line of the
//! partial's output.
//!
//! ```
//! let mut engine = bristle::Engine::new();
//! engine.add_template("list", "<ul>\n  {{>item}}\n</ul>")?;
//! engine.add_template("item", "<li>{{name}}</li>\n")?;
//!
//! let result = engine
//!     .get_template("list")
//!     .unwrap()
//!     .render(bristle::value! { name: "one" })?;
//! assert_eq!(result, "<ul>\n  <li>one</li>\n</ul>");
//! # Ok::<(), bristle::Error>(())
//! ```
//!
//! ### Template inheritance
//!
//! A parent tag includes another template and replaces its inheritance
//! blocks.
//!
//! ```
//! let mut engine = bristle::Engine::new();
//! engine.add_template("base", "<title>{{$title}}Home{{/title}}</title>")?;
//!
//! let result = engine
//!     .compile("{{<base}}{{$title}}About{{/title}}{{/base}}")?
//!     .render(bristle::value! {})?;
//! assert_eq!(result, "<title>About</title>");
//! # Ok::<(), bristle::Error>(())
//! ```
//!
//! ### Lazy values
//!
//! A [`Value::lazy`] thunk is invoked when the tag referencing it is
//! rendered; a [`Value::lazy_format`] thunk yields a whole template. Lazy
//! data cannot round trip through serde, so pass it with
//! [`render_from`][Template::render_from].
//!
//! ```
//! use bristle::Value;
//!
//! let data = Value::from([
//!     ("name", Value::from("World")),
//!     ("loud", Value::lazy(|_| Value::from("HELLO"))),
//! ]);
//!
//! let result = bristle::Engine::new()
//!     .compile("{{loud}} {{name}}")?
//!     .render_from(&data)?;
//! assert_eq!(result, "HELLO World");
//! # Ok::<(), bristle::Error>(())
//! ```

mod compile;
mod error;
pub mod fmt;
mod macros;
mod render;
mod types;
pub mod value;

use std::collections::HashMap;
use std::io;

pub use crate::error::Error;
use crate::fmt::EscapeFn;
use crate::types::ast::Content;
pub use crate::types::ast::Section;
#[cfg(feature = "serde")]
pub use crate::value::to_value;
pub use crate::value::{Lazy, LazyFormat, List, Map, Value};

/// A type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The default limit on nested partial expansion.
const DEFAULT_MAX_PARTIAL_DEPTH: usize = 64;

/// The compilation and rendering engine.
pub struct Engine<'engine> {
    pub(crate) templates: HashMap<&'engine str, Format>,
    pub(crate) escape: EscapeFn,
    pub(crate) unresolved: Option<Box<UnresolvedFn>>,
    pub(crate) max_partial_depth: usize,
}

/// A callback consulted for variable keys that fail to resolve.
type UnresolvedFn = dyn Fn(&str) -> Value + Send + Sync;

/// A compiled template, not yet bound to an engine.
///
/// This is the type that lazy format thunks return; see
/// [`Value::lazy_format`].
#[derive(Clone)]
pub struct Format {
    pub(crate) contents: Vec<Content>,
}

/// A compiled template bound to an [`Engine`].
pub struct Template<'engine> {
    engine: &'engine Engine<'engine>,
    format: Format,
}

/// A reference to a compiled template stored in an [`Engine`].
pub struct TemplateRef<'engine> {
    engine: &'engine Engine<'engine>,
    format: &'engine Format,
}

impl Default for Engine<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'engine> Engine<'engine> {
    /// Construct a new engine that escapes HTML.
    #[inline]
    pub fn new() -> Self {
        Self::with_escape(fmt::html)
    }

    /// Construct a new engine with a custom escape function.
    ///
    /// # Examples
    ///
    /// ```
    /// use bristle::{fmt, Engine};
    ///
    /// let engine = Engine::with_escape(fmt::none);
    /// ```
    #[inline]
    pub fn with_escape(escape: EscapeFn) -> Self {
        Self {
            templates: HashMap::new(),
            escape,
            unresolved: None,
            max_partial_depth: DEFAULT_MAX_PARTIAL_DEPTH,
        }
    }

    /// Set the callback consulted when a variable key cannot be resolved.
    ///
    /// The callback receives the full dotted key and its returned value is
    /// rendered in place of the variable. It is never consulted for
    /// section keys, which resolve to [`Value::None`] when missing.
    pub fn set_unresolved_fn<F>(&mut self, f: F)
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        self.unresolved = Some(Box::new(f));
    }

    /// Set the maximum allowed depth of nested partials.
    ///
    /// Rendering fails once more than `depth` partials are active at the
    /// same time, which guards against recursive templates.
    pub fn set_max_partial_depth(&mut self, depth: usize) {
        self.max_partial_depth = depth;
    }

    /// Compile a template and store it with the given name.
    ///
    /// Stored templates are also the lookup context for `{{>partial}}` and
    /// `{{<parent}}` tags.
    pub fn add_template(&mut self, name: &'engine str, source: &str) -> Result<()> {
        let format = compile::format(source)?;
        self.templates.insert(name, format);
        Ok(())
    }

    /// Store an already compiled template with the given name.
    pub fn add_format(&mut self, name: &'engine str, format: Format) {
        self.templates.insert(name, format);
    }

    /// Lookup a template by name.
    #[inline]
    pub fn get_template(&self, name: &str) -> Option<TemplateRef<'_>> {
        self.templates.get(name).map(|format| TemplateRef {
            engine: self,
            format,
        })
    }

    /// Compile a template bound to this engine.
    #[inline]
    pub fn compile(&self, source: &str) -> Result<Template<'_>> {
        Ok(Template {
            engine: self,
            format: compile::format(source)?,
        })
    }
}

impl std::fmt::Debug for Engine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("templates", &self.templates.keys())
            .field("max_partial_depth", &self.max_partial_depth)
            .finish_non_exhaustive()
    }
}

impl Format {
    /// Compile Mustache source into a format.
    #[inline]
    pub fn new(source: &str) -> Result<Self> {
        compile::format(source)
    }
}

impl std::str::FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl std::fmt::Debug for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Format").finish_non_exhaustive()
    }
}

impl Template<'_> {
    /// Render the template to a string using the provided data.
    #[cfg(feature = "serde")]
    #[inline]
    pub fn render<S>(&self, ctx: S) -> Result<String>
    where
        S: serde::Serialize,
    {
        render::to_string(self.engine, &self.format, &to_value(ctx)?)
    }

    /// Render the template to a string using the provided value.
    #[inline]
    pub fn render_from(&self, value: &Value) -> Result<String> {
        render::to_string(self.engine, &self.format, value)
    }

    /// Render the template to the given writer using the provided data.
    #[cfg(feature = "serde")]
    #[inline]
    pub fn render_to_writer<W, S>(&self, writer: W, ctx: S) -> Result<()>
    where
        W: io::Write,
        S: serde::Serialize,
    {
        render::to_writer(self.engine, &self.format, &to_value(ctx)?, writer)
    }

    /// Render the template to the given writer using the provided value.
    #[inline]
    pub fn render_from_to_writer<W>(&self, writer: W, value: &Value) -> Result<()>
    where
        W: io::Write,
    {
        render::to_writer(self.engine, &self.format, value, writer)
    }
}

impl std::fmt::Debug for Template<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template").finish_non_exhaustive()
    }
}

impl TemplateRef<'_> {
    /// Render the template to a string using the provided data.
    #[cfg(feature = "serde")]
    #[inline]
    pub fn render<S>(&self, ctx: S) -> Result<String>
    where
        S: serde::Serialize,
    {
        render::to_string(self.engine, self.format, &to_value(ctx)?)
    }

    /// Render the template to a string using the provided value.
    #[inline]
    pub fn render_from(&self, value: &Value) -> Result<String> {
        render::to_string(self.engine, self.format, value)
    }

    /// Render the template to the given writer using the provided data.
    #[cfg(feature = "serde")]
    #[inline]
    pub fn render_to_writer<W, S>(&self, writer: W, ctx: S) -> Result<()>
    where
        W: io::Write,
        S: serde::Serialize,
    {
        render::to_writer(self.engine, self.format, &to_value(ctx)?, writer)
    }

    /// Render the template to the given writer using the provided value.
    #[inline]
    pub fn render_from_to_writer<W>(&self, writer: W, value: &Value) -> Result<()>
    where
        W: io::Write,
    {
        render::to_writer(self.engine, self.format, value, writer)
    }
}

impl std::fmt::Debug for TemplateRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRef").finish_non_exhaustive()
    }
}
