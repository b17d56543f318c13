//! Output formatting and escaping.
//!
//! Rendered output flows through a [`Formatter`], a [`std::fmt::Write`]
//! façade over either a [`String`] or an arbitrary [`std::io::Write`]
//! buffer. Literal text and resolved values are written straight through;
//! string values emitted by an escaped variable (`{{key}}`) additionally
//! pass through the engine's [`EscapeFn`].
//!
//! Two escape functions are provided: [`html`], the default, and [`none`]
//! which disables escaping entirely.
//!
//! ```
//! use bristle::{fmt, Engine};
//!
//! let engine = Engine::with_escape(fmt::none);
//! let result = engine
//!     .compile("{{greeting}}")?
//!     .render(bristle::value! { greeting: "<b>hello</b>" })?;
//! assert_eq!(result, "<b>hello</b>");
//! # Ok::<(), bristle::Error>(())
//! ```

use std::fmt;
use std::fmt::Write as _;
use std::io;

/// An escape function applied to string values emitted through the escaping
/// sink.
pub type EscapeFn = fn(&mut Formatter<'_>, &str) -> fmt::Result;

/// A [`std::fmt::Write`] façade over the render output.
pub struct Formatter<'a> {
    buf: &'a mut (dyn fmt::Write + 'a),
}

pub(crate) struct Writer<W> {
    writer: W,
    err: Option<io::Error>,
}

impl<'a> Formatter<'a> {
    pub(crate) fn with_string(buf: &'a mut String) -> Self {
        Self { buf }
    }

    pub(crate) fn with_writer<W>(buf: &'a mut Writer<W>) -> Self
    where
        W: io::Write,
    {
        Self { buf }
    }
}

impl fmt::Write for Formatter<'_> {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        fmt::Write::write_str(self.buf, s)
    }

    #[inline]
    fn write_char(&mut self, c: char) -> fmt::Result {
        fmt::Write::write_char(self.buf, c)
    }

    #[inline]
    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        fmt::Write::write_fmt(self.buf, args)
    }
}

impl<W> Writer<W>
where
    W: io::Write,
{
    pub fn new(writer: W) -> Self {
        Self { writer, err: None }
    }

    pub fn take_err(&mut self) -> Option<io::Error> {
        self.err.take()
    }
}

impl<W> fmt::Write for Writer<W>
where
    W: io::Write,
{
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.writer.write_all(s.as_bytes()).map_err(|e| {
            self.err = Some(e);
            fmt::Error
        })
    }

    #[inline]
    fn write_char(&mut self, c: char) -> fmt::Result {
        self.writer
            .write_all(c.encode_utf8(&mut [0; 4]).as_bytes())
            .map_err(|e| {
                self.err = Some(e);
                fmt::Error
            })
    }
}

/// The default escape function.
///
/// Replaces `&`, `<`, `>`, `"`, and `\` with their HTML entities.
pub fn html(f: &mut Formatter<'_>, s: &str) -> fmt::Result {
    let mut last = 0;
    for (i, byte) in s.bytes().enumerate() {
        let entity = match byte {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            b'\\' => "&#92;",
            _ => continue,
        };
        f.write_str(&s[last..i])?;
        f.write_str(entity)?;
        last = i + 1;
    }
    f.write_str(&s[last..])
}

/// An escape function that writes the string through unchanged.
pub fn none(f: &mut Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped(s: &str) -> String {
        let mut out = String::new();
        html(&mut Formatter::with_string(&mut out), s).unwrap();
        out
    }

    #[test]
    fn html_plain() {
        assert_eq!(escaped("hello world"), "hello world");
    }

    #[test]
    fn html_entities() {
        assert_eq!(
            escaped(r#"<a href="x">&\</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#92;&lt;/a&gt;"
        );
    }

    #[test]
    fn html_multibyte() {
        assert_eq!(escaped("héllo <wörld>"), "héllo &lt;wörld&gt;");
    }
}
