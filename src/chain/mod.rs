//! Original chain ("cadena original") generation.
//!
//! The original chain is the exact byte sequence the issuer signs in
//! `Sello` and the SAT signs in `SelloSAT`: selected field values in the
//! order fixed by the SAT, each whitespace-normalized, joined by `|` and
//! wrapped in `||`. Optional fields are skipped entirely when absent.

mod complements;
mod comprobante;

pub use comprobante::original_chain;

use crate::core::{AttrValue, CfdiError, SchemaVersion};

/// Collapse whitespace the way the SAT transform does: control characters
/// become spaces, runs collapse to one space, ends are trimmed.
pub fn normalize_whitespace(value: &str) -> String {
    value
        .split(|c: char| c.is_whitespace() || c.is_control())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Accumulates chain fields in order.
#[derive(Debug, Default, Clone)]
pub struct ChainBuilder {
    fields: Vec<String>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field the chain cannot be generated without.
    pub fn required<T: AttrValue>(
        &mut self,
        node: &'static str,
        field: &'static str,
        value: Option<&T>,
    ) -> Result<&mut Self, CfdiError> {
        let normalized = value
            .map(|v| normalize_whitespace(&v.format_attr()))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CfdiError::Chain(format!("{node}: missing required field '{field}'")))?;
        self.fields.push(normalized);
        Ok(self)
    }

    /// Append a field only if present.
    pub fn optional<T: AttrValue>(&mut self, value: Option<&T>) -> &mut Self {
        if let Some(v) = value
            .map(|v| normalize_whitespace(&v.format_attr()))
            .filter(|v| !v.is_empty())
        {
            self.fields.push(v);
        }
        self
    }

    /// Required from 4.0 on, optional in 3.3 documents.
    pub fn required_since_40<T: AttrValue>(
        &mut self,
        version: SchemaVersion,
        node: &'static str,
        field: &'static str,
        value: Option<&T>,
    ) -> Result<&mut Self, CfdiError> {
        match version {
            SchemaVersion::V40 => self.required(node, field, value),
            SchemaVersion::V33 => Ok(self.optional(value)),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `||f1|f2|...|fn||`
    pub fn build(&self) -> String {
        format!("||{}||", self.fields.join("|"))
    }
}
