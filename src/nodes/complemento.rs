//! Extension containers: `cfdi:Complemento`, `cfdi:ComplementoConcepto`
//! and `cfdi:Addenda`.
//!
//! Unlike the rest of the tree these containers hold elements from
//! namespaces the CFDI schema does not know ahead of time. Known complement
//! kinds are parsed into their typed nodes; anything else is kept verbatim
//! and reported through [`Complemento::warnings`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::{ImpuestosLocales, Pagos, TimbreFiscalDigital};
use crate::core::catalog::is_base_attribute;
use crate::core::registry::{self, ComplementKind};
use crate::core::*;

/// One entry of a `cfdi:Complemento`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComplementNode {
    FiscalStamp(TimbreFiscalDigital),
    Payments(Pagos),
    LocalTaxes(ImpuestosLocales),
    /// Unrecognized extension, carried as read.
    Unknown(Element),
}

impl ComplementNode {
    pub fn kind(&self) -> Option<ComplementKind> {
        match self {
            Self::FiscalStamp(_) => Some(ComplementKind::FiscalStamp),
            Self::Payments(_) => Some(ComplementKind::Payments),
            Self::LocalTaxes(_) => Some(ComplementKind::LocalTaxes),
            Self::Unknown(_) => None,
        }
    }

    fn tag_name(&self) -> &'static str {
        match self {
            Self::FiscalStamp(_) => TimbreFiscalDigital::TAG.name,
            Self::Payments(_) => Pagos::TAG.name,
            Self::LocalTaxes(_) => ImpuestosLocales::TAG.name,
            Self::Unknown(_) => "unknown",
        }
    }

    fn build(kind: ComplementKind, el: &Element) -> Result<Self, CfdiError> {
        Ok(match kind {
            ComplementKind::FiscalStamp => Self::FiscalStamp(TimbreFiscalDigital::from_element(el)?),
            ComplementKind::Payments => Self::Payments(Pagos::from_element(el)?),
            ComplementKind::LocalTaxes => Self::LocalTaxes(ImpuestosLocales::from_element(el)?),
        })
    }

    fn build_from_map(kind: ComplementKind, map: &Map<String, Value>) -> Result<Self, CfdiError> {
        Ok(match kind {
            ComplementKind::FiscalStamp => Self::FiscalStamp(TimbreFiscalDigital::from_map(map)?),
            ComplementKind::Payments => Self::Payments(Pagos::from_map(map)?),
            ComplementKind::LocalTaxes => Self::LocalTaxes(ImpuestosLocales::from_map(map)?),
        })
    }

    fn to_element_in(&self, version: SchemaVersion) -> Result<Element, CfdiError> {
        match self {
            Self::FiscalStamp(n) => n.to_element_in(version),
            Self::Payments(n) => n.to_element_in(version),
            Self::LocalTaxes(n) => n.to_element_in(version),
            Self::Unknown(el) => Ok(el.clone()),
        }
    }
}

/// `cfdi:Complemento`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Complemento {
    pub nodes: Vec<ComplementNode>,
}

impl Node for Complemento {
    const TAG: Tag = Tag::cfdi("cfdi:Complemento");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    /// Known complements are keyed by their own name (prefix optional);
    /// other keys become verbatim unknown elements.
    fn populate(&mut self, data: &Map<String, Value>) -> Result<(), CfdiError> {
        for (key, value) in data {
            if is_base_attribute(key) {
                continue;
            }
            match registry::resolve_key(key) {
                Some(kind) => match value {
                    Value::Object(map) => self.add(ComplementNode::build_from_map(kind, map)?)?,
                    Value::Null => {}
                    _ => {
                        return Err(CfdiError::WrongRelation {
                            node: Self::TAG.name,
                            child: kind_tag(kind),
                            expected: "a single map",
                        });
                    }
                },
                None => {
                    for el in elements_from_value(Self::TAG.name, key, value)? {
                        self.accept_unknown_child(&el)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn accept_unknown_child(&mut self, el: &Element) -> Result<(), CfdiError> {
        match registry::resolve_element(el) {
            Some(kind) => self.add(ComplementNode::build(kind, el)?),
            None => {
                warn!("{}: keeping unknown complement {}", Self::TAG.name, el.name);
                self.nodes.push(ComplementNode::Unknown(el.with_declarations()));
                Ok(())
            }
        }
    }

    fn extra_children(&self, version: SchemaVersion) -> Result<Vec<Element>, CfdiError> {
        self.nodes.iter().map(|n| n.to_element_in(version)).collect()
    }
}

impl Complemento {
    /// Append a complement. Known kinds may appear only once.
    pub fn add(&mut self, node: ComplementNode) -> Result<(), CfdiError> {
        let kind = node.kind();
        if kind.is_some() && self.nodes.iter().any(|n| n.kind() == kind) {
            return Err(CfdiError::DuplicateChild {
                node: Self::TAG.name,
                child: node.tag_name(),
            });
        }
        self.nodes.push(node);
        Ok(())
    }

    pub fn fiscal_stamp(&self) -> Option<&TimbreFiscalDigital> {
        self.nodes.iter().find_map(|n| match n {
            ComplementNode::FiscalStamp(t) => Some(t),
            _ => None,
        })
    }

    pub fn pagos(&self) -> Option<&Pagos> {
        self.nodes.iter().find_map(|n| match n {
            ComplementNode::Payments(p) => Some(p),
            _ => None,
        })
    }

    pub fn pagos_mut(&mut self) -> Option<&mut Pagos> {
        self.nodes.iter_mut().find_map(|n| match n {
            ComplementNode::Payments(p) => Some(p),
            _ => None,
        })
    }

    pub fn impuestos_locales(&self) -> Option<&ImpuestosLocales> {
        self.nodes.iter().find_map(|n| match n {
            ComplementNode::LocalTaxes(i) => Some(i),
            _ => None,
        })
    }

    /// Elements kept verbatim because no complement type claims them.
    pub fn unknown(&self) -> impl Iterator<Item = &Element> {
        self.nodes.iter().filter_map(|n| match n {
            ComplementNode::Unknown(el) => Some(el),
            _ => None,
        })
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.unknown().map(|el| warning(Self::TAG.name, el)).collect()
    }
}

fn kind_tag(kind: ComplementKind) -> &'static str {
    match kind {
        ComplementKind::FiscalStamp => TimbreFiscalDigital::TAG.name,
        ComplementKind::Payments => Pagos::TAG.name,
        ComplementKind::LocalTaxes => ImpuestosLocales::TAG.name,
    }
}

fn warning(node: &'static str, el: &Element) -> Warning {
    Warning {
        node,
        tag: el.name.clone(),
        namespace: el.namespace.clone(),
    }
}

/// `cfdi:ComplementoConcepto`: per-item extensions. No item complement is
/// modelled, so every child is kept verbatim and reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplementoConcepto {
    pub nodes: Vec<Element>,
}

impl Node for ComplementoConcepto {
    const TAG: Tag = Tag::cfdi("cfdi:ComplementoConcepto");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    fn populate(&mut self, data: &Map<String, Value>) -> Result<(), CfdiError> {
        for (key, value) in data.iter().filter(|(k, _)| !is_base_attribute(k)) {
            for el in elements_from_value(Self::TAG.name, key, value)? {
                self.accept_unknown_child(&el)?;
            }
        }
        Ok(())
    }

    fn accept_unknown_child(&mut self, el: &Element) -> Result<(), CfdiError> {
        warn!("{}: keeping unknown item complement {}", Self::TAG.name, el.name);
        self.nodes.push(el.with_declarations());
        Ok(())
    }

    fn extra_children(&self, _version: SchemaVersion) -> Result<Vec<Element>, CfdiError> {
        Ok(self.nodes.clone())
    }
}

impl ComplementoConcepto {
    pub fn warnings(&self) -> Vec<Warning> {
        self.nodes.iter().map(|el| warning(Self::TAG.name, el)).collect()
    }
}

/// `cfdi:Addenda`: free-form data outside the signed content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Addenda {
    pub nodes: Vec<Element>,
}

impl Node for Addenda {
    const TAG: Tag = Tag::cfdi("cfdi:Addenda");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    fn populate(&mut self, data: &Map<String, Value>) -> Result<(), CfdiError> {
        for (key, value) in data.iter().filter(|(k, _)| !is_base_attribute(k)) {
            self.nodes.extend(elements_from_value(Self::TAG.name, key, value)?);
        }
        Ok(())
    }

    fn accept_unknown_child(&mut self, el: &Element) -> Result<(), CfdiError> {
        self.nodes.push(el.with_declarations());
        Ok(())
    }

    fn extra_children(&self, _version: SchemaVersion) -> Result<Vec<Element>, CfdiError> {
        Ok(self.nodes.clone())
    }
}

/// Build raw elements from loosely-typed input: a map becomes one element
/// (scalars as attributes, maps and lists as children), a list of maps
/// becomes one element per item.
fn elements_from_value(
    node: &'static str,
    name: &str,
    value: &Value,
) -> Result<Vec<Element>, CfdiError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => {
            let mut el = Element::new(name);
            for (key, v) in map {
                match v {
                    Value::Null => {}
                    Value::String(s) => el.set_attribute(key.as_str(), s.as_str()),
                    Value::Number(n) => el.set_attribute(key.as_str(), n.to_string()),
                    Value::Bool(b) => el.set_attribute(key.as_str(), b.to_string()),
                    Value::Object(_) | Value::Array(_) => {
                        for child in elements_from_value(node, key, v)? {
                            el.push_child(child);
                        }
                    }
                }
            }
            Ok(vec![el])
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if !item.is_object() {
                    return Err(CfdiError::InvalidInput {
                        node,
                        reason: format!("items of '{name}' must be maps, got {item}"),
                    });
                }
                out.extend(elements_from_value(node, name, item)?);
            }
            Ok(out)
        }
        other => Err(CfdiError::InvalidInput {
            node,
            reason: format!("'{name}' must be a map or a list of maps, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::ns;

    fn stamp_element() -> Element {
        let mut el = Element::new("tfd:TimbreFiscalDigital").with_namespace(ns::TFD);
        for (k, v) in [
            ("Version", "1.1"),
            ("UUID", "6F6B2A8C-3C3E-4C1B-9E43-1E1E6D2A9B11"),
            ("FechaTimbrado", "2024-01-15T10:31:00"),
            ("RfcProvCertif", "SAT970701NN3"),
            ("SelloCFD", "abc"),
            ("NoCertificadoSAT", "00001000000504465028"),
            ("SelloSAT", "def"),
        ] {
            el.set_attribute(k, v);
        }
        el
    }

    #[test]
    fn unknown_complement_is_kept_and_reported() {
        let mut c = Complemento::default();
        let nomina = Element::new("nomina12:Nomina").with_namespace("http://www.sat.gob.mx/nomina12");
        c.read_element(&{
            let mut parent = Element::new("cfdi:Complemento");
            parent.push_child(nomina.clone());
            parent
        })
        .unwrap();

        assert_eq!(c.nodes, vec![ComplementNode::Unknown(nomina.with_declarations())]);
        let ComplementNode::Unknown(kept) = &c.nodes[0] else {
            panic!("expected an unknown complement");
        };
        assert_eq!(kept.attribute("xmlns:nomina12"), Some("http://www.sat.gob.mx/nomina12"));
        let warnings = c.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].tag, "nomina12:Nomina");
    }

    #[test]
    fn second_fiscal_stamp_is_rejected() {
        let mut parent = Element::new("cfdi:Complemento");
        parent.push_child(stamp_element());
        parent.push_child(stamp_element());

        let err = Complemento::from_element(&parent).unwrap_err();
        assert!(matches!(
            err,
            CfdiError::DuplicateChild { child: "tfd:TimbreFiscalDigital", .. }
        ));
    }

    #[test]
    fn known_complement_from_map() {
        let data = serde_json::json!({
            "tfd:TimbreFiscalDigital": {
                "Version": "1.1",
                "UUID": "6F6B2A8C-3C3E-4C1B-9E43-1E1E6D2A9B11"
            }
        });
        let c = Complemento::from_map(data.as_object().unwrap()).unwrap();
        assert!(c.fiscal_stamp().is_some());
        assert!(c.warnings().is_empty());
    }

    #[test]
    fn other_pagos_version_stays_unknown() {
        let data = serde_json::json!({ "pago10:Pagos": { "Version": "1.0" } });
        let c = Complemento::from_map(data.as_object().unwrap()).unwrap();
        assert!(c.pagos().is_none());
        assert_eq!(c.warnings()[0].tag, "pago10:Pagos");
    }

    #[test]
    fn addenda_keeps_children_without_warnings() {
        let data = serde_json::json!({ "Pedido": { "Numero": "42" } });
        let a = Addenda::from_map(data.as_object().unwrap()).unwrap();
        assert_eq!(a.nodes.len(), 1);
        assert_eq!(a.nodes[0].attribute("Numero"), Some("42"));
    }
}
