//! Compiles Mustache template text into the content tree the renderer
//! walks.
//!
//! The grammar is Mustache with the block sigils `#` (section), `^`
//! (inverted), `*` (loop), `?` (filter), `$` (inheritance block), `<`
//! (parent) and `>` (partial), plus `!` comments and `=` set-delimiter
//! tags. Lines that contain nothing but whitespace around a single
//! non-variable tag are stripped per the Mustache whitespace rules, and the
//! leading whitespace of a standalone partial is captured as its indent.

use std::mem;
use std::sync::Arc;

use crate::types::ast::{Block, BlockTag, Content, OverrideMap, Partial, Variable};
use crate::types::span::Span;
use crate::{Error, Format, Result};

pub(crate) fn format(source: &str) -> Result<Format> {
    let parser = Parser {
        source,
        pos: 0,
        open: "{{",
        close: "}}",
        blocks: Vec::new(),
        contents: Vec::new(),
    };
    parser.parse()
}

struct Parser<'s> {
    source: &'s str,
    pos: usize,
    open: &'s str,
    close: &'s str,
    blocks: Vec<OpenBlock>,
    contents: Vec<Content>,
}

/// A section or parent tag whose closing tag has not been seen yet.
struct OpenBlock {
    kind: OpenKind,
    key: String,
    span: Span,
    indent: String,
    enclosing: Vec<Content>,
}

enum OpenKind {
    Block(BlockTag),
    Parent,
}

/// A single lexed tag.
struct Tag<'s> {
    sigil: Sigil<'s>,
    span: Span,
    end: usize,
}

enum Sigil<'s> {
    Variable { key: &'s str, raw: bool },
    Open(BlockTag, &'s str),
    Parent(&'s str),
    Partial(&'s str),
    Close(&'s str),
    Comment,
    Delimiters(&'s str, &'s str),
}

impl Sigil<'_> {
    /// Variables are never standalone; every other tag form can be.
    fn standalone_eligible(&self) -> bool {
        !matches!(self, Sigil::Variable { .. })
    }
}

impl<'s> Parser<'s> {
    fn parse(mut self) -> Result<Format> {
        while let Some(i) = self.source[self.pos..].find(self.open) {
            let text_end = self.pos + i;
            let tag = self.lex_tag(text_end)?;

            let standalone = if tag.sigil.standalone_eligible() {
                self.standalone(text_end, tag.end)
            } else {
                None
            };
            let (text, indent, resume) = match standalone {
                Some((ws_start, resume)) => (
                    &self.source[self.pos..ws_start],
                    &self.source[ws_start..text_end],
                    resume,
                ),
                None => (&self.source[self.pos..text_end], "", tag.end),
            };

            if !text.is_empty() {
                self.contents.push(Content::Text(text.to_owned()));
            }
            self.pos = resume;
            self.dispatch(tag, indent)?;
        }

        if self.pos < self.source.len() {
            self.contents
                .push(Content::Text(self.source[self.pos..].to_owned()));
        }
        if let Some(block) = self.blocks.last() {
            return Err(Error::compile(
                format!("unclosed section `{}`", block.key),
                self.source,
                block.span,
            ));
        }
        Ok(Format {
            contents: self.contents,
        })
    }

    /// A tag is standalone when its line contains nothing but whitespace
    /// around it. Returns the start of the leading whitespace and the
    /// position just past the trailing newline.
    fn standalone(&self, tag_start: usize, tag_end: usize) -> Option<(usize, usize)> {
        let bytes = self.source.as_bytes();

        let mut ws_start = tag_start;
        while ws_start > 0 && matches!(bytes[ws_start - 1], b' ' | b'\t') {
            ws_start -= 1;
        }
        if !(ws_start == 0 || bytes[ws_start - 1] == b'\n') {
            return None;
        }
        if ws_start < self.pos {
            return None;
        }

        let mut resume = tag_end;
        while resume < bytes.len() && matches!(bytes[resume], b' ' | b'\t') {
            resume += 1;
        }
        match bytes.get(resume) {
            None => Some((ws_start, resume)),
            Some(b'\n') => Some((ws_start, resume + 1)),
            Some(b'\r') if bytes.get(resume + 1) == Some(&b'\n') => Some((ws_start, resume + 2)),
            Some(_) => None,
        }
    }

    fn lex_tag(&self, start: usize) -> Result<Tag<'s>> {
        let inner_start = start + self.open.len();

        // `{{{ … }}}` is only recognized with the default delimiters.
        if self.open == "{{" && self.source[inner_start..].starts_with('{') {
            let Some(i) = self.source[inner_start + 1..].find("}}}") else {
                return Err(self.unclosed(start));
            };
            let inner_end = inner_start + 1 + i;
            let end = inner_end + 3;
            let span = Span::new(start, end);
            let key = self.source[inner_start + 1..inner_end].trim();
            if key.is_empty() {
                return Err(Error::compile("empty tag", self.source, span));
            }
            return Ok(Tag {
                sigil: Sigil::Variable { key, raw: true },
                span,
                end,
            });
        }

        let Some(i) = self.source[inner_start..].find(self.close) else {
            return Err(self.unclosed(start));
        };
        let inner_end = inner_start + i;
        let end = inner_end + self.close.len();
        let span = Span::new(start, end);
        let inner = self.source[inner_start..inner_end].trim();

        let key = |sigil_len: usize| -> Result<&'s str> {
            let key = inner[sigil_len..].trim_start();
            if key.is_empty() {
                return Err(Error::compile("empty tag", self.source, span));
            }
            Ok(key)
        };

        let sigil = match inner.as_bytes().first() {
            None => return Err(Error::compile("empty tag", self.source, span)),
            Some(b'!') => Sigil::Comment,
            Some(b'=') => self.delimiters(inner, span)?,
            Some(b'&') => Sigil::Variable {
                key: key(1)?,
                raw: true,
            },
            Some(b'#') => Sigil::Open(BlockTag::Section, key(1)?),
            Some(b'^') => Sigil::Open(BlockTag::Inversion, key(1)?),
            Some(b'*') => Sigil::Open(BlockTag::Loop, key(1)?),
            Some(b'?') => Sigil::Open(BlockTag::Filter, key(1)?),
            Some(b'$') => Sigil::Open(BlockTag::Inheritance, key(1)?),
            Some(b'<') => Sigil::Parent(key(1)?),
            Some(b'>') => Sigil::Partial(key(1)?),
            Some(b'/') => Sigil::Close(key(1)?),
            Some(_) => Sigil::Variable {
                key: inner,
                raw: false,
            },
        };
        Ok(Tag { sigil, span, end })
    }

    fn delimiters(&self, inner: &'s str, span: Span) -> Result<Sigil<'s>> {
        let invalid = || Error::compile("invalid set-delimiter tag", self.source, span);
        let body = inner
            .strip_prefix('=')
            .and_then(|body| body.strip_suffix('='))
            .ok_or_else(invalid)?;
        let mut parts = body.split_whitespace();
        let (open, close) = match (parts.next(), parts.next(), parts.next()) {
            (Some(open), Some(close), None) => (open, close),
            _ => return Err(invalid()),
        };
        if open.contains('=') || close.contains('=') {
            return Err(invalid());
        }
        Ok(Sigil::Delimiters(open, close))
    }

    fn unclosed(&self, start: usize) -> Error {
        Error::compile(
            "unclosed tag",
            self.source,
            Span::new(start, start + self.open.len()),
        )
    }

    fn dispatch(&mut self, tag: Tag<'s>, indent: &str) -> Result<()> {
        match tag.sigil {
            Sigil::Comment => {}

            Sigil::Delimiters(open, close) => {
                self.open = open;
                self.close = close;
            }

            Sigil::Variable { key, raw } => self.contents.push(Content::Variable(Variable {
                key: key.to_owned(),
                raw,
            })),

            Sigil::Partial(key) => self.contents.push(Content::Partial(Partial {
                key: key.to_owned(),
                indent: indent.to_owned(),
                overriders: None,
            })),

            Sigil::Open(block_tag, key) => self.blocks.push(OpenBlock {
                kind: OpenKind::Block(block_tag),
                key: key.to_owned(),
                span: tag.span,
                indent: String::new(),
                enclosing: mem::take(&mut self.contents),
            }),

            Sigil::Parent(key) => self.blocks.push(OpenBlock {
                kind: OpenKind::Parent,
                key: key.to_owned(),
                span: tag.span,
                indent: indent.to_owned(),
                enclosing: mem::take(&mut self.contents),
            }),

            Sigil::Close(key) => {
                let Some(block) = self.blocks.pop() else {
                    return Err(Error::compile(
                        "unexpected closing tag",
                        self.source,
                        tag.span,
                    ));
                };
                if block.key != key {
                    return Err(Error::compile(
                        format!("mismatched closing tag, expected `{}`", block.key),
                        self.source,
                        tag.span,
                    ));
                }
                let contents = mem::replace(&mut self.contents, block.enclosing);
                let content = match block.kind {
                    OpenKind::Block(block_tag) => Content::Block(Block {
                        tag: block_tag,
                        key: block.key,
                        contents,
                    }),
                    OpenKind::Parent => {
                        // Only inheritance blocks inside a parent tag
                        // contribute overrides; everything else is dropped.
                        let mut overriders = OverrideMap::new();
                        for content in contents {
                            if let Content::Block(inner) = content {
                                if inner.tag == BlockTag::Inheritance {
                                    overriders.insert(inner.key, inner.contents);
                                }
                            }
                        }
                        Content::Partial(Partial {
                            key: block.key,
                            indent: block.indent,
                            overriders: (!overriders.is_empty()).then(|| Arc::new(overriders)),
                        })
                    }
                };
                self.contents.push(content);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn contents(source: &str) -> Vec<Content> {
        format(source).unwrap().contents
    }

    fn text(s: &str) -> Content {
        Content::Text(String::from(s))
    }

    fn var(key: &str) -> Content {
        Content::Variable(Variable {
            key: String::from(key),
            raw: false,
        })
    }

    fn raw_var(key: &str) -> Content {
        Content::Variable(Variable {
            key: String::from(key),
            raw: true,
        })
    }

    fn block(tag: BlockTag, key: &str, contents: Vec<Content>) -> Content {
        Content::Block(Block {
            tag,
            key: String::from(key),
            contents,
        })
    }

    #[test]
    fn text_only() {
        assert_eq!(contents("lorem ipsum"), vec![text("lorem ipsum")]);
    }

    #[test]
    fn empty() {
        assert_eq!(contents(""), vec![]);
    }

    #[test]
    fn variable_forms() {
        assert_eq!(
            contents("{{a}} {{ b.c }} {{{d}}} {{&e}} {{.}}"),
            vec![
                var("a"),
                text(" "),
                var("b.c"),
                text(" "),
                raw_var("d"),
                text(" "),
                raw_var("e"),
                text(" "),
                var("."),
            ]
        );
    }

    #[test]
    fn section_inline() {
        assert_eq!(
            contents("a{{#b}}c{{/b}}d"),
            vec![
                text("a"),
                block(BlockTag::Section, "b", vec![text("c")]),
                text("d"),
            ]
        );
    }

    #[test]
    fn section_tags() {
        assert_eq!(
            contents("{{^a}}{{/a}}{{*b}}{{/b}}{{?c}}{{/c}}{{$d}}{{/d}}"),
            vec![
                block(BlockTag::Inversion, "a", vec![]),
                block(BlockTag::Loop, "b", vec![]),
                block(BlockTag::Filter, "c", vec![]),
                block(BlockTag::Inheritance, "d", vec![]),
            ]
        );
    }

    #[test]
    fn standalone_section_lines_stripped() {
        assert_eq!(
            contents("a\n{{#b}}\nc\n{{/b}}\nd"),
            vec![
                text("a\n"),
                block(BlockTag::Section, "b", vec![text("c\n")]),
                text("d"),
            ]
        );
    }

    #[test]
    fn standalone_with_leading_whitespace() {
        assert_eq!(
            contents("a\n  {{#b}}  \nc\n{{/b}}\n"),
            vec![
                text("a\n"),
                block(BlockTag::Section, "b", vec![text("c\n")]),
            ]
        );
    }

    #[test]
    fn adjacent_standalone_tags() {
        assert_eq!(
            contents("{{#a}}\n{{/a}}\n"),
            vec![block(BlockTag::Section, "a", vec![])]
        );
    }

    #[test]
    fn tag_with_other_content_not_standalone() {
        assert_eq!(
            contents("x {{#a}}\ny\n{{/a}}"),
            vec![
                text("x "),
                block(BlockTag::Section, "a", vec![text("\ny\n")]),
            ]
        );
    }

    #[test]
    fn two_tags_on_one_line_not_standalone() {
        assert_eq!(
            contents("{{#a}}{{/a}}\n"),
            vec![block(BlockTag::Section, "a", vec![]), text("\n")]
        );
    }

    #[test]
    fn standalone_partial_captures_indent() {
        assert_eq!(
            contents("  {{>p}}\nx"),
            vec![
                Content::Partial(Partial {
                    key: String::from("p"),
                    indent: String::from("  "),
                    overriders: None,
                }),
                text("x"),
            ]
        );
    }

    #[test]
    fn inline_partial_has_no_indent() {
        assert_eq!(
            contents("x {{>p}}"),
            vec![
                text("x "),
                Content::Partial(Partial {
                    key: String::from("p"),
                    indent: String::new(),
                    overriders: None,
                }),
            ]
        );
    }

    #[test]
    fn comment_removed() {
        assert_eq!(contents("a{{! ignore me }}b"), vec![text("a"), text("b")]);
    }

    #[test]
    fn standalone_comment_strips_line() {
        assert_eq!(contents("a\n{{! note }}\nb"), vec![text("a\n"), text("b")]);
    }

    #[test]
    fn set_delimiters() {
        assert_eq!(
            contents("{{=<% %>=}}<%a%><%={{ }}=%>{{b}}"),
            vec![var("a"), var("b")]
        );
    }

    #[test]
    fn parent_collects_overriders() {
        let contents = contents("{{<base}}ignored{{$x}}y{{/x}}{{/base}}");
        let [Content::Partial(partial)] = contents.as_slice() else {
            panic!("expected a single partial, got {contents:?}");
        };
        assert_eq!(partial.key, "base");
        let overriders = partial.overriders.as_ref().unwrap();
        assert_eq!(overriders.len(), 1);
        assert_eq!(overriders["x"], vec![text("y")]);
    }

    #[test]
    fn parent_without_blocks_has_no_overriders() {
        let contents = contents("{{<base}}{{/base}}");
        let [Content::Partial(partial)] = contents.as_slice() else {
            panic!("expected a single partial, got {contents:?}");
        };
        assert!(partial.overriders.is_none());
    }

    #[test]
    fn crlf_standalone() {
        assert_eq!(
            contents("a\r\n{{#b}}\r\nc\r\n{{/b}}\r\n"),
            vec![
                text("a\r\n"),
                block(BlockTag::Section, "b", vec![text("c\r\n")]),
            ]
        );
    }

    #[test]
    fn err_unclosed_tag() {
        assert!(format("lorem {{ ipsum").is_err());
    }

    #[test]
    fn err_unclosed_section() {
        assert!(format("{{#a}}b").is_err());
    }

    #[test]
    fn err_unexpected_close() {
        assert!(format("a{{/b}}").is_err());
    }

    #[test]
    fn err_mismatched_close() {
        assert!(format("{{#a}}{{/b}}").is_err());
    }

    #[test]
    fn err_empty_tag() {
        assert!(format("{{}}").is_err());
        assert!(format("{{#}}x{{/}}").is_err());
        assert!(format("{{{}}}").is_err());
    }

    #[test]
    fn err_invalid_set_delimiters() {
        assert!(format("{{=<%=}}").is_err());
        assert!(format("{{=a b c=}}").is_err());
        assert!(format("{{=a= =b=}}").is_err());
    }
}
