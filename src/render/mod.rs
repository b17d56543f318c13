mod core;
mod stack;

use std::io;

use crate::fmt::{Formatter, Writer};
use crate::render::core::RendererImpl;
use crate::{Engine, Error, Format, Result, Value};

pub(crate) fn to_string(engine: &Engine<'_>, format: &Format, data: &Value) -> Result<String> {
    let mut s = String::new();
    let mut f = Formatter::with_string(&mut s);
    RendererImpl::new(engine, data).render(&mut f, &format.contents)?;
    Ok(s)
}

pub(crate) fn to_writer<W>(
    engine: &Engine<'_>,
    format: &Format,
    data: &Value,
    writer: W,
) -> Result<()>
where
    W: io::Write,
{
    let mut w = Writer::new(writer);
    let mut f = Formatter::with_writer(&mut w);
    RendererImpl::new(engine, data)
        .render(&mut f, &format.contents)
        .map_err(|err| w.take_err().map(Error::from).unwrap_or(err))
}
