//! Core node engine, typed values, and validation.
//!
//! This module provides the generic machinery every CFDI node type is built
//! on: the keyword catalog, the [`Node`] trait with its population and
//! translation protocol, exact decimal arithmetic, and catalog validation.

pub mod catalog;
pub mod codes;
pub mod decimal;
mod element;
mod error;
mod node;
pub mod registry;
mod validation;
mod values;

pub use catalog::{AttrDef, ChildDef, Presence, Relation, attach_unique};
pub use element::*;
pub use error::*;
pub use node::Node;
pub use registry::{ComplementKind, Namespace, Tag};
pub use validation::*;
pub use values::*;
