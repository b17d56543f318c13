use std::cmp::max;
use std::fmt;
use std::io;

use unicode_width::UnicodeWidthStr;

use crate::types::span::Span;

/// An error that can occur during template compilation or rendering.
pub struct Error {
    kind: ErrorKind,
    span: Option<(String, Span)>,
}

#[derive(Debug)]
enum ErrorKind {
    Compile(String),
    Render(String),
    Io(io::Error),
    Fmt(fmt::Error),
    #[cfg(feature = "serde")]
    Serialize(String),
}

impl Error {
    pub(crate) fn compile(msg: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        Self {
            kind: ErrorKind::Compile(msg.into()),
            span: Some((source.to_string(), span.into())),
        }
    }

    pub(crate) fn render(msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Render(msg.into()),
            span: None,
        }
    }

    pub(crate) fn max_partial_depth(max: usize) -> Self {
        Self::render(format!("maximum partial depth of {max} exceeded"))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self {
            kind: ErrorKind::Io(err),
            span: None,
        }
    }
}

impl From<fmt::Error> for Error {
    fn from(err: fmt::Error) -> Self {
        Self {
            kind: ErrorKind::Fmt(err),
            span: None,
        }
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Self {
            kind: ErrorKind::Serialize(msg.to_string()),
            span: None,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(err) => Some(err),
            ErrorKind::Fmt(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some((source, span)) => fmt_pretty(&self.kind, source, *span, f),
            None => f
                .debug_struct("Error")
                .field("kind", &self.kind)
                .field("span", &self.span)
                .finish(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some((source, span)) => fmt_pretty(&self.kind, source, *span, f),
            None => fmt::Display::fmt(&self.kind, f),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Compile(msg) => write!(f, "compile error: {msg}"),
            ErrorKind::Render(msg) => write!(f, "render error: {msg}"),
            ErrorKind::Io(_) => write!(f, "io error"),
            ErrorKind::Fmt(_) => write!(f, "format error"),
            #[cfg(feature = "serde")]
            ErrorKind::Serialize(msg) => write!(f, "serialize error: {msg}"),
        }
    }
}

/// Renders the error together with the offending line of template source and
/// an underline marking the span.
fn fmt_pretty(kind: &ErrorKind, source: &str, span: Span, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let lines: Vec<&str> = source.split_terminator('\n').collect();
    let (line, col) = to_line_col(&lines, span.start);
    let code = lines
        .get(line)
        .or_else(|| lines.last())
        .copied()
        .unwrap_or("");
    let width = max(1, source[span].width());

    let num = (line + 1).to_string();
    let pad = num.width();
    let underline = "^".repeat(width);
    let msg = match kind {
        ErrorKind::Compile(msg) | ErrorKind::Render(msg) => msg.as_str(),
        #[cfg(feature = "serde")]
        ErrorKind::Serialize(msg) => msg.as_str(),
        ErrorKind::Io(_) => "io error",
        ErrorKind::Fmt(_) => "format error",
    };

    writeln!(f)?;
    writeln!(f, " {:pad$} |", "")?;
    writeln!(f, " {num} | {code}")?;
    writeln!(f, " {:pad$} | {underline:>width$} {msg}", "", width = col + width)
}

fn to_line_col(lines: &[&str], offset: usize) -> (usize, usize) {
    let mut n = 0;
    for (i, line) in lines.iter().enumerate() {
        let len = line.width() + 1;
        if n + len > offset {
            return (i, offset - n);
        }
        n += len;
    }
    (
        lines.len().saturating_sub(1),
        lines.last().map(|line| line.width()).unwrap_or(0),
    )
}
