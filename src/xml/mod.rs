//! XML text ↔ element tree, backed by `quick-xml`.
//!
//! The node engine only sees [`Element`](crate::core::Element)s; this module
//! is the one place that touches XML syntax.

mod reader;
mod writer;

pub use reader::parse;
pub use writer::write;

/// Output options for [`write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Indentation width in spaces; `None` writes everything on one line.
    pub indent: Option<usize>,
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>`.
    pub declaration: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: None,
            declaration: true,
        }
    }
}

impl WriteOptions {
    /// Indented output for humans.
    pub fn pretty() -> Self {
        Self {
            indent: Some(2),
            ..Self::default()
        }
    }
}
