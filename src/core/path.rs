//! Purpose: Track where in a payload the decoder currently is.
//! Exports: `WirePath`.
//! Role: Borrowed breadcrumb chain rendered only when an error is built.
//! Invariants: Building a child path never allocates.
use std::fmt;

#[derive(Clone, Copy, Debug)]
pub enum WirePath<'a> {
    Root,
    Field(&'a WirePath<'a>, &'a str),
    Index(&'a WirePath<'a>, usize),
}

impl<'a> WirePath<'a> {
    pub fn field<'b>(&'b self, name: &'b str) -> WirePath<'b> {
        WirePath::Field(self, name)
    }

    pub fn index(&self, index: usize) -> WirePath<'_> {
        WirePath::Index(self, index)
    }
}

impl fmt::Display for WirePath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WirePath::Root => f.write_str("$"),
            WirePath::Field(parent, name) => write!(f, "{parent}.{name}"),
            WirePath::Index(parent, index) => write!(f, "{parent}[{index}]"),
        }
    }
}
