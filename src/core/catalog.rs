//! Per-node-type keyword catalog.
//!
//! Every node type owns two immutable tables: its attributes and its
//! children. Each entry lists the accepted external keywords (official
//! Spanish name first, English alias after) and maps them at compile time
//! to a typed getter/setter pair or to a typed child slot. Input accepts
//! any listed keyword; output always uses the first one.

use serde_json::Value;

use super::element::Element;
use super::error::CfdiError;
use super::node::Node;
use super::registry::Tag;
use super::values::SchemaVersion;

/// Whether an attribute must be present before the node can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Optional in 3.3, mandatory in 4.0.
    RequiredSince40,
}

impl Presence {
    pub fn is_required(self, version: SchemaVersion) -> bool {
        match self {
            Self::Required => true,
            Self::Optional => false,
            Self::RequiredSince40 => version == SchemaVersion::V40,
        }
    }
}

/// How a child slot holds its nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// At most one child; populating it twice is an error.
    Unique,
    /// Ordered list, no uniqueness constraint.
    Array,
}

/// Attribute entry of a node's catalog.
pub struct AttrDef<N> {
    /// Accepted keywords; the first is the one written on output.
    pub keywords: &'static [&'static str],
    pub presence: Presence,
    pub get: fn(&N) -> Option<String>,
    pub set: fn(&mut N, &str) -> Result<(), String>,
}

impl<N> AttrDef<N> {
    /// Canonical (official) name.
    pub fn name(&self) -> &'static str {
        self.keywords[0]
    }

    pub fn accepts(&self, key: &str) -> bool {
        self.keywords.contains(&key)
    }
}

/// Child entry of a node's catalog.
pub struct ChildDef<N> {
    /// Accepted local names; the first is the official tag.
    pub keywords: &'static [&'static str],
    /// Tag of the child node type.
    pub tag: Tag,
    pub relation: Relation,
    /// Build a child from an element and attach it.
    pub read_element: fn(&mut N, &Element) -> Result<(), CfdiError>,
    /// Build child(ren) from loosely-typed input and attach.
    pub read_value: fn(&mut N, &Value) -> Result<(), CfdiError>,
    /// Serialize the slot, in list order for arrays.
    pub write: fn(&N, SchemaVersion) -> Result<Vec<Element>, CfdiError>,
}

impl<N> ChildDef<N> {
    pub fn name(&self) -> &'static str {
        self.keywords[0]
    }

    /// True when `el` is this child: same local name and, if the element
    /// carries a namespace or prefix, the child type's own.
    pub fn matches(&self, el: &Element) -> bool {
        if !self.keywords.contains(&el.local_name()) {
            return false;
        }
        match (&el.namespace, el.prefix()) {
            (Some(ns), _) => self.tag.namespace.matches(ns),
            (None, Some(prefix)) => prefix == self.tag.prefix(),
            (None, None) => true,
        }
    }

    /// True when a loosely-typed input key names this child, with or
    /// without a namespace prefix.
    pub fn accepts_key(&self, key: &str) -> bool {
        let local = key.rsplit_once(':').map_or(key, |(_, local)| local);
        self.keywords.contains(&local)
    }
}

/// Namespace and schema-location declarations. These are fixed per node
/// type and never business data, so population skips them.
pub fn is_base_attribute(key: &str) -> bool {
    key == "xmlns" || key.starts_with("xmlns:") || key.starts_with("xsi:")
}

/// Attach `child` to a unique slot, failing if it is already occupied.
pub fn attach_unique<C>(
    slot: &mut Option<C>,
    child: C,
    node: &'static str,
    name: &'static str,
) -> Result<(), CfdiError> {
    if slot.is_some() {
        return Err(CfdiError::DuplicateChild { node, child: name });
    }
    *slot = Some(child);
    Ok(())
}

/// Populate a unique slot from a map value.
pub fn unique_from_value<C: Node>(
    slot: &mut Option<C>,
    value: &Value,
    node: &'static str,
    name: &'static str,
) -> Result<(), CfdiError> {
    match value {
        Value::Object(map) => attach_unique(slot, C::from_map(map)?, node, name),
        Value::Array(_) => Err(CfdiError::WrongRelation {
            node,
            child: name,
            expected: "a single map",
        }),
        Value::Null => Ok(()),
        other => Err(CfdiError::InvalidInput {
            node,
            reason: format!("child '{name}' must be a map, got {other}"),
        }),
    }
}

/// Append to an array slot from a list of map values.
pub fn array_from_value<C: Node>(
    list: &mut Vec<C>,
    value: &Value,
    node: &'static str,
    name: &'static str,
) -> Result<(), CfdiError> {
    match value {
        Value::Array(items) => {
            for item in items {
                let Value::Object(map) = item else {
                    return Err(CfdiError::InvalidInput {
                        node,
                        reason: format!("items of '{name}' must be maps, got {item}"),
                    });
                };
                list.push(C::from_map(map)?);
            }
            Ok(())
        }
        Value::Object(_) => Err(CfdiError::WrongRelation {
            node,
            child: name,
            expected: "a list of maps",
        }),
        Value::Null => Ok(()),
        other => Err(CfdiError::InvalidInput {
            node,
            reason: format!("child '{name}' must be a list of maps, got {other}"),
        }),
    }
}

/// Catalog entry for a scalar attribute stored as `Option<T: AttrValue>`.
///
/// `attr!(Node, field, ["Official", "alias"], Required)`
macro_rules! attr {
    ($node:ty, $field:ident, [$($kw:literal),+ $(,)?], $presence:ident) => {
        $crate::core::AttrDef::<$node> {
            keywords: &[$($kw),+],
            presence: $crate::core::Presence::$presence,
            get: |n: &$node| n.$field.as_ref().map($crate::core::AttrValue::format_attr),
            set: |n: &mut $node, raw: &str| {
                n.$field = if raw.is_empty() {
                    None
                } else {
                    Some($crate::core::AttrValue::parse_attr(raw)?)
                };
                Ok(())
            },
        }
    };
}

/// Catalog entry for a unique child stored as `Option<C: Node>`.
macro_rules! unique_child {
    ($node:ty, $field:ident: $child:ty, [$($kw:literal),+ $(,)?]) => {
        $crate::core::ChildDef::<$node> {
            keywords: &[$($kw),+],
            tag: <$child as $crate::core::Node>::TAG,
            relation: $crate::core::Relation::Unique,
            read_element: |n: &mut $node, el: &$crate::core::Element| {
                let child = <$child as $crate::core::Node>::from_element(el)?;
                $crate::core::catalog::attach_unique(
                    &mut n.$field,
                    child,
                    <$node as $crate::core::Node>::TAG.name,
                    <$child as $crate::core::Node>::TAG.name,
                )
            },
            read_value: |n: &mut $node, v: &serde_json::Value| {
                $crate::core::catalog::unique_from_value(
                    &mut n.$field,
                    v,
                    <$node as $crate::core::Node>::TAG.name,
                    <$child as $crate::core::Node>::TAG.name,
                )
            },
            write: |n: &$node, version: $crate::core::SchemaVersion| {
                n.$field
                    .iter()
                    .map(|c| $crate::core::Node::to_element_in(c, version))
                    .collect()
            },
        }
    };
}

/// Catalog entry for an array child stored as `Vec<C: Node>`.
macro_rules! array_child {
    ($node:ty, $field:ident: $child:ty, [$($kw:literal),+ $(,)?]) => {
        $crate::core::ChildDef::<$node> {
            keywords: &[$($kw),+],
            tag: <$child as $crate::core::Node>::TAG,
            relation: $crate::core::Relation::Array,
            read_element: |n: &mut $node, el: &$crate::core::Element| {
                n.$field
                    .push(<$child as $crate::core::Node>::from_element(el)?);
                Ok(())
            },
            read_value: |n: &mut $node, v: &serde_json::Value| {
                $crate::core::catalog::array_from_value(
                    &mut n.$field,
                    v,
                    <$node as $crate::core::Node>::TAG.name,
                    <$child as $crate::core::Node>::TAG.name,
                )
            },
            write: |n: &$node, version: $crate::core::SchemaVersion| {
                n.$field
                    .iter()
                    .map(|c| $crate::core::Node::to_element_in(c, version))
                    .collect()
            },
        }
    };
}

pub(crate) use {array_child, attr, unique_child};
