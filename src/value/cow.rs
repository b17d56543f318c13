//! A clone-on-write reference to a [`Value`].
//!
//! Borrowed values stay borrowed for the whole render; owned values only
//! exist where a lazy thunk produced them, and cloning one clones just the
//! edge that is being carried forward.

use std::ops::Deref;

use crate::Value;

#[derive(Clone)]
#[cfg_attr(test, derive(Debug))]
pub(crate) enum ValueCow<'a> {
    Borrowed(&'a Value),
    Owned(Value),
}

impl Deref for ValueCow<'_> {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Borrowed(v) => v,
            Self::Owned(v) => v,
        }
    }
}
