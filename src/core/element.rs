//! Library-independent external element tree.
//!
//! Nodes read from and write to [`Element`]; turning XML text into elements
//! is the job of the `xml` feature.

use serde::{Deserialize, Serialize};

/// An element or a run of character data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum XmlNode {
    Element(Element),
    Text(String),
}

/// A generic XML element: qualified name, resolved namespace, ordered
/// attributes and ordered children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Qualified name as written (e.g. `cfdi:Emisor`).
    pub name: String,
    /// Resolved namespace URI, if the name is bound to one.
    pub namespace: Option<String>,
    /// Attributes in document order, keyed by qualified name.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Name without its prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value under the same key.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(XmlNode::Element(child));
    }

    /// Child elements in order, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.local_name() == local_name)
    }

    /// Concatenated character data of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => out.push_str(&e.text()),
            }
        }
        out
    }

    /// Copy of this subtree that declares every namespace its element names
    /// are bound to, so it stays well-formed when written without the
    /// ancestors it was read under.
    pub fn with_declarations(&self) -> Element {
        let mut el = self.clone();
        el.declare_namespaces(&mut Vec::new());
        el
    }

    fn declare_namespaces(&mut self, scope: &mut Vec<(String, String)>) {
        let depth = scope.len();
        for (key, value) in &self.attributes {
            if key == "xmlns" {
                scope.push((String::new(), value.clone()));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                scope.push((prefix.to_string(), value.clone()));
            }
        }
        if let Some(uri) = self.namespace.clone() {
            let prefix = self.prefix().unwrap_or("").to_string();
            let bound = scope
                .iter()
                .rev()
                .find(|(p, _)| *p == prefix)
                .is_some_and(|(_, u)| *u == uri);
            if !bound {
                let key = if prefix.is_empty() {
                    "xmlns".to_string()
                } else {
                    format!("xmlns:{prefix}")
                };
                match self.attributes.iter_mut().find(|(k, _)| *k == key) {
                    Some(slot) => slot.1 = uri.clone(),
                    None => self.attributes.insert(0, (key, uri.clone())),
                }
                scope.push((prefix, uri));
            }
        }
        for child in &mut self.children {
            if let XmlNode::Element(e) = child {
                e.declare_namespaces(scope);
            }
        }
        scope.truncate(depth);
    }

    /// Attributes as a flat loosely-typed map, the input shape of
    /// [`Node::populate`](super::Node::populate).
    pub fn attribute_map(&self) -> serde_json::Map<String, serde_json::Value> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect()
    }
}
