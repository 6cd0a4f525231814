//! The generic tree unit.
//!
//! A node type declares its [`Tag`] and its catalog tables; everything
//! else (population from loosely-typed maps, reading from and writing to
//! [`Element`]s, presence validation) is provided here once for all types.
//!
//! Validation runs on read, not on write: setters only check the shape of
//! a single value, and required attributes are enforced every time
//! [`Node::attributes`] or [`Node::to_element`] is called, so a tree can be
//! assembled in any order and mutated after a failed attempt.

use serde_json::{Map, Value};

use super::catalog::{AttrDef, ChildDef, is_base_attribute};
use super::element::Element;
use super::error::CfdiError;
use super::registry::{self, Tag};
use super::values::SchemaVersion;

pub trait Node: Default + Sized + 'static {
    /// Self-declared qualified name and namespace.
    const TAG: Tag;

    /// Attribute catalog, in output order.
    fn attribute_defs() -> &'static [AttrDef<Self>];

    /// Child catalog, in schema order.
    fn child_defs() -> &'static [ChildDef<Self>] {
        &[]
    }

    /// Namespace and schema-location declarations written before any
    /// business attribute. Empty for nodes that inherit them.
    fn base_attributes(&self, _version: SchemaVersion) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Version this node pins for its own subtree (only roots do).
    fn own_version(&self) -> Option<SchemaVersion> {
        None
    }

    /// Semantic checks beyond attribute presence.
    fn check(&self) -> Result<(), CfdiError> {
        Ok(())
    }

    /// Called for a child element no catalog entry claims. Strict
    /// containers reject it; extension containers override this to keep it.
    fn accept_unknown_child(&mut self, el: &Element) -> Result<(), CfdiError> {
        Err(CfdiError::UnknownChild {
            node: Self::TAG.name,
            tag: el.name.clone(),
        })
    }

    /// Children written after the catalog ones (extension containers).
    fn extra_children(&self, _version: SchemaVersion) -> Result<Vec<Element>, CfdiError> {
        Ok(Vec::new())
    }

    /// Build a node from a loosely-typed key-value map.
    fn from_map(data: &Map<String, Value>) -> Result<Self, CfdiError> {
        let mut node = Self::default();
        node.populate(data)?;
        Ok(node)
    }

    /// Apply every key of `data`: declarations are skipped, scalar keys go
    /// through the attribute setters, map/list keys build children.
    fn populate(&mut self, data: &Map<String, Value>) -> Result<(), CfdiError> {
        for (key, value) in data {
            if is_base_attribute(key) {
                continue;
            }
            if Self::attribute_defs().iter().any(|d| d.accepts(key)) {
                match value {
                    Value::Null => {}
                    Value::String(s) => self.set_attribute(key, s)?,
                    Value::Number(n) => self.set_attribute(key, &n.to_string())?,
                    Value::Bool(b) => self.set_attribute(key, &b.to_string())?,
                    Value::Array(_) | Value::Object(_) => {
                        return Err(CfdiError::InvalidInput {
                            node: Self::TAG.name,
                            reason: format!("attribute '{key}' must be a scalar"),
                        });
                    }
                }
            } else if let Some(def) = registry::resolve_child_key::<Self>(key) {
                (def.read_value)(self, value)?;
            } else {
                return Err(CfdiError::UnknownAttribute {
                    node: Self::TAG.name,
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Set one attribute by any of its keywords. An empty value clears it.
    fn set_attribute(&mut self, key: &str, raw: &str) -> Result<(), CfdiError> {
        let def = Self::attribute_defs()
            .iter()
            .find(|d| d.accepts(key))
            .ok_or_else(|| CfdiError::UnknownAttribute {
                node: Self::TAG.name,
                key: key.to_string(),
            })?;
        (def.set)(self, raw).map_err(|reason| CfdiError::InvalidValue {
            node: Self::TAG.name,
            attribute: def.name(),
            value: raw.to_string(),
            reason,
        })
    }

    /// Current value of an attribute by any of its keywords, formatted.
    fn attribute(&self, key: &str) -> Option<String> {
        Self::attribute_defs()
            .iter()
            .find(|d| d.accepts(key))
            .and_then(|d| (d.get)(self))
    }

    /// Build a node from an external element, recursing into children.
    fn from_element(el: &Element) -> Result<Self, CfdiError> {
        let mut node = Self::default();
        node.read_element(el)?;
        Ok(node)
    }

    fn read_element(&mut self, el: &Element) -> Result<(), CfdiError> {
        for (key, value) in &el.attributes {
            if !is_base_attribute(key) {
                self.set_attribute(key, value)?;
            }
        }
        for child in el.child_elements() {
            match registry::resolve_child::<Self>(child) {
                Some(def) => (def.read_element)(self, child)?,
                None => self.accept_unknown_child(child)?,
            }
        }
        Ok(())
    }

    /// Presence and semantic validation for this node only.
    fn validate_in(&self, version: SchemaVersion) -> Result<(), CfdiError> {
        for def in Self::attribute_defs() {
            if def.presence.is_required(version)
                && (def.get)(self).is_none_or(|v| v.trim().is_empty())
            {
                return Err(CfdiError::MissingAttribute {
                    node: Self::TAG.name,
                    attribute: def.name(),
                });
            }
        }
        self.check()
    }

    fn validate(&self) -> Result<(), CfdiError> {
        self.validate_in(self.own_version().unwrap_or_default())
    }

    /// Output attributes: declarations first, then every present attribute
    /// in catalog order under its official keyword. Fails instead of
    /// returning partial data.
    fn attributes_in(&self, version: SchemaVersion) -> Result<Vec<(String, String)>, CfdiError> {
        self.validate_in(version)?;
        let mut out = self.base_attributes(version);
        for def in Self::attribute_defs() {
            if let Some(value) = (def.get)(self).filter(|v| !v.is_empty()) {
                out.push((def.name().to_string(), value));
            }
        }
        Ok(out)
    }

    fn attributes(&self) -> Result<Vec<(String, String)>, CfdiError> {
        self.attributes_in(self.own_version().unwrap_or_default())
    }

    /// Serialize this subtree. Children are written in catalog order, array
    /// children in list order.
    fn to_element_in(&self, version: SchemaVersion) -> Result<Element, CfdiError> {
        let version = self.own_version().unwrap_or(version);
        let mut el = Element::new(Self::TAG.name).with_namespace(Self::TAG.namespace.uri(version));
        el.attributes = self.attributes_in(version)?;
        for def in Self::child_defs() {
            for child in (def.write)(self, version)? {
                el.push_child(child);
            }
        }
        for child in self.extra_children(version)? {
            el.push_child(child);
        }
        Ok(el)
    }

    fn to_element(&self) -> Result<Element, CfdiError> {
        self.to_element_in(self.own_version().unwrap_or_default())
    }
}
