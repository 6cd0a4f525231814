//! Tag names, namespaces, and element-to-node-type dispatch.

use super::catalog::ChildDef;
use super::element::Element;
use super::node::Node;
use super::values::SchemaVersion;

/// Namespace URIs and schema locations.
pub mod ns {
    pub const CFDI_33: &str = "http://www.sat.gob.mx/cfd/3";
    pub const CFDI_40: &str = "http://www.sat.gob.mx/cfd/4";
    pub const CFDI_33_XSD: &str = "http://www.sat.gob.mx/sitio_internet/cfd/3/cfdv33.xsd";
    pub const CFDI_40_XSD: &str = "http://www.sat.gob.mx/sitio_internet/cfd/4/cfdv40.xsd";
    pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
    pub const TFD: &str = "http://www.sat.gob.mx/TimbreFiscalDigital";
    pub const TFD_XSD: &str =
        "http://www.sat.gob.mx/sitio_internet/cfd/TimbreFiscalDigital/TimbreFiscalDigitalv11.xsd";
    pub const PAGOS_20: &str = "http://www.sat.gob.mx/Pagos20";
    pub const PAGOS_20_XSD: &str = "http://www.sat.gob.mx/sitio_internet/cfd/Pagos/Pagos20.xsd";
    pub const IMPLOCAL: &str = "http://www.sat.gob.mx/implocal";
    pub const IMPLOCAL_XSD: &str =
        "http://www.sat.gob.mx/sitio_internet/cfd/implocal/implocal.xsd";
}

/// Namespace a node type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// The versioned CFDI namespace (`cfd/3` or `cfd/4`).
    Cfdi,
    /// A complement namespace that does not change with the CFDI version.
    Fixed(&'static str),
}

impl Namespace {
    pub fn uri(&self, version: SchemaVersion) -> &'static str {
        match self {
            Self::Cfdi => match version {
                SchemaVersion::V33 => ns::CFDI_33,
                SchemaVersion::V40 => ns::CFDI_40,
            },
            Self::Fixed(uri) => uri,
        }
    }

    pub fn matches(&self, uri: &str) -> bool {
        match self {
            Self::Cfdi => uri == ns::CFDI_33 || uri == ns::CFDI_40,
            Self::Fixed(own) => *own == uri,
        }
    }
}

/// Self-declared name of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    /// Qualified name written on output (e.g. `cfdi:Emisor`).
    pub name: &'static str,
    pub namespace: Namespace,
}

impl Tag {
    pub const fn cfdi(name: &'static str) -> Self {
        Self {
            name,
            namespace: Namespace::Cfdi,
        }
    }

    pub const fn fixed(name: &'static str, namespace: &'static str) -> Self {
        Self {
            name,
            namespace: Namespace::Fixed(namespace),
        }
    }

    pub fn local(&self) -> &'static str {
        self.name
            .split_once(':')
            .map_or(self.name, |(_, local)| local)
    }

    pub fn prefix(&self) -> &'static str {
        self.name.split_once(':').map_or("", |(prefix, _)| prefix)
    }

    /// True when `el` carries this fully-qualified name: same local name
    /// and same namespace (or, for unbound elements, same prefix).
    pub fn matches(&self, el: &Element) -> bool {
        if el.local_name() != self.local() {
            return false;
        }
        match &el.namespace {
            Some(uri) => self.namespace.matches(uri),
            None => el.prefix().unwrap_or("") == self.prefix(),
        }
    }
}

/// Child entry of `N` responsible for `el`, if any.
pub fn resolve_child<N: Node>(el: &Element) -> Option<&'static ChildDef<N>> {
    N::child_defs().iter().find(|def| def.matches(el))
}

/// Child entry of `N` named by a loosely-typed input key, if any.
pub fn resolve_child_key<N: Node>(key: &str) -> Option<&'static ChildDef<N>> {
    N::child_defs().iter().find(|def| def.accepts_key(key))
}

/// Known complement types, dispatched by their own qualified name since
/// they come from namespaces the CFDI schema does not know ahead of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplementKind {
    FiscalStamp,
    Payments,
    LocalTaxes,
}

/// Resolve a complement element by local name and namespace.
pub fn resolve(local_name: &str, namespace: Option<&str>) -> Option<ComplementKind> {
    use crate::nodes::{ImpuestosLocales, Pagos, TimbreFiscalDigital};

    let candidates = [
        (TimbreFiscalDigital::TAG, ComplementKind::FiscalStamp),
        (Pagos::TAG, ComplementKind::Payments),
        (ImpuestosLocales::TAG, ComplementKind::LocalTaxes),
    ];
    candidates
        .into_iter()
        .find(|(tag, _)| {
            tag.local() == local_name && namespace.is_none_or(|uri| tag.namespace.matches(uri))
        })
        .map(|(_, kind)| kind)
}

/// [`resolve`] applied to an element, falling back to its prefix when the
/// element carries no namespace.
pub fn resolve_element(el: &Element) -> Option<ComplementKind> {
    match &el.namespace {
        Some(uri) => resolve(el.local_name(), Some(uri)),
        None => {
            let kind = resolve(el.local_name(), None)?;
            let expected = match kind {
                ComplementKind::FiscalStamp => crate::nodes::TimbreFiscalDigital::TAG,
                ComplementKind::Payments => crate::nodes::Pagos::TAG,
                ComplementKind::LocalTaxes => crate::nodes::ImpuestosLocales::TAG,
            };
            expected.matches(el).then_some(kind)
        }
    }
}

/// [`resolve`] applied to a loosely-typed input key. A prefixed key must
/// carry the complement's own prefix; a bare local name matches any known
/// complement with that name.
pub fn resolve_key(key: &str) -> Option<ComplementKind> {
    match key.split_once(':') {
        Some(_) => resolve_element(&Element::new(key)),
        None => resolve(key, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cfdi_namespace_matches_both_versions() {
        assert!(Namespace::Cfdi.matches(ns::CFDI_33));
        assert!(Namespace::Cfdi.matches(ns::CFDI_40));
        assert_eq!(Namespace::Cfdi.uri(SchemaVersion::V33), ns::CFDI_33);
        assert!(!Namespace::Fixed(ns::TFD).matches(ns::CFDI_40));
    }

    #[test]
    fn tag_splits_prefix() {
        let tag = Tag::fixed("tfd:TimbreFiscalDigital", ns::TFD);
        assert_eq!(tag.local(), "TimbreFiscalDigital");
        assert_eq!(tag.prefix(), "tfd");
    }

    #[test]
    fn resolves_complements_by_namespace() {
        assert_eq!(
            resolve("TimbreFiscalDigital", Some(ns::TFD)),
            Some(ComplementKind::FiscalStamp)
        );
        assert_eq!(resolve("Pagos", Some(ns::PAGOS_20)), Some(ComplementKind::Payments));
        // Pagos 1.0 lives in another namespace and is not known.
        assert_eq!(resolve("Pagos", Some("http://www.sat.gob.mx/Pagos")), None);
        assert_eq!(resolve("Nomina", Some("http://www.sat.gob.mx/nomina12")), None);
    }

    #[test]
    fn unbound_elements_resolve_by_prefix() {
        assert_eq!(
            resolve_element(&Element::new("implocal:ImpuestosLocales")),
            Some(ComplementKind::LocalTaxes)
        );
        assert_eq!(resolve_element(&Element::new("pago10:Pagos")), None);
    }

    #[test]
    fn keys_resolve_by_prefix() {
        assert_eq!(resolve_key("pago20:Pagos"), Some(ComplementKind::Payments));
        assert_eq!(resolve_key("Pagos"), Some(ComplementKind::Payments));
        assert_eq!(resolve_key("pago10:Pagos"), None);
        assert_eq!(resolve_key("tfd:TimbreFiscalDigital"), Some(ComplementKind::FiscalStamp));
    }
}
