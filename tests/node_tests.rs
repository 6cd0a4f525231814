//! Node engine: loosely-typed population, element reading and writing,
//! presence validation and the tolerant complement containers.

use cfdi::core::registry::ns;
use cfdi::nodes::*;
use cfdi::{CfdiError, Element, Node, SchemaVersion, TaxKind};
use rust_decimal_macros::dec;
use serde_json::{Map, Value, json};

fn map(v: Value) -> Map<String, Value> {
    v.as_object().unwrap().clone()
}

fn comprobante_data() -> Value {
    json!({
        "Version": "4.0",
        "Fecha": "2024-01-15T10:30:00",
        "SubTotal": "100.00",
        "Moneda": "MXN",
        "Total": "116.00",
        "TipoDeComprobante": "I",
        "Exportacion": "01",
        "LugarExpedicion": "06000",
        "Emisor": { "Rfc": "AAA010101AAA", "Nombre": "ACME", "RegimenFiscal": "601" },
        "Receptor": {
            "Rfc": "XAXX010101000",
            "Nombre": "PUBLICO EN GENERAL",
            "DomicilioFiscalReceptor": "06000",
            "RegimenFiscalReceptor": "616",
            "UsoCFDI": "S01"
        },
        "Conceptos": {
            "Concepto": [{
                "ClaveProdServ": "84111506",
                "Cantidad": "1",
                "ClaveUnidad": "E48",
                "Descripcion": "Servicio",
                "ValorUnitario": "100.00",
                "Importe": "100.00",
                "ObjetoImp": "02",
                "Impuestos": {
                    "Traslados": {
                        "Traslado": [{
                            "Base": "100.00",
                            "Impuesto": "002",
                            "TipoFactor": "Tasa",
                            "TasaOCuota": "0.160000",
                            "Importe": "16.00"
                        }]
                    }
                }
            }]
        }
    })
}

#[test]
fn populates_full_tree_from_map() {
    let c = Comprobante::from_map(&map(comprobante_data())).unwrap();
    assert_eq!(c.schema_version(), SchemaVersion::V40);
    assert_eq!(c.emisor.as_ref().unwrap().rfc.as_ref().unwrap().as_str(), "AAA010101AAA");
    let concepto = &c.concepts()[0];
    assert_eq!(concepto.importe, Some(dec!(100.00)));
    assert_eq!(concepto.traslados()[0].impuesto, Some(TaxKind::Iva));
}

#[test]
fn english_aliases_build_the_same_node() {
    let official = Concepto::from_map(&map(json!({
        "ClaveProdServ": "84111506",
        "Cantidad": "2",
        "ClaveUnidad": "H87",
        "Descripcion": "Pieza",
        "ValorUnitario": "5.00",
        "Importe": "10.00",
    })))
    .unwrap();
    let alias = Concepto::from_map(&map(json!({
        "product_code": "84111506",
        "quantity": 2,
        "unit_code": "H87",
        "description": "Pieza",
        "unit_value": "5.00",
        "amount": "10.00",
    })))
    .unwrap();
    assert_eq!(official, alias);
}

#[test]
fn output_uses_official_names_in_catalog_order() {
    let e = Emisor::from_map(&map(json!({
        "tax_regime": "601",
        "name": "ACME",
        "rfc": "AAA010101AAA",
    })))
    .unwrap();
    let keys: Vec<String> = e.attributes().unwrap().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["Rfc", "Nombre", "RegimenFiscal"]);
}

#[test]
fn unknown_attribute_is_rejected() {
    let err = Receptor::from_map(&map(json!({ "Calle": "Reforma" }))).unwrap_err();
    assert!(matches!(err, CfdiError::UnknownAttribute { node: "cfdi:Receptor", .. }));
}

#[test]
fn unique_child_rejects_list_input() {
    let err = Comprobante::from_map(&map(json!({ "Emisor": [{ "Rfc": "AAA010101AAA" }] }))).unwrap_err();
    assert!(matches!(err, CfdiError::WrongRelation { .. }));
}

#[test]
fn array_child_rejects_single_map() {
    let err = Conceptos::from_map(&map(json!({ "Concepto": { "Cantidad": "1" } }))).unwrap_err();
    assert!(matches!(err, CfdiError::WrongRelation { .. }));
}

#[test]
fn duplicate_unique_child_in_xml_is_rejected() {
    let mut root = Element::new("cfdi:Comprobante").with_namespace(ns::CFDI_40);
    root.push_child(Element::new("cfdi:Emisor").with_namespace(ns::CFDI_40));
    root.push_child(Element::new("cfdi:Emisor").with_namespace(ns::CFDI_40));
    let err = Comprobante::from_element(&root).unwrap_err();
    assert!(matches!(err, CfdiError::DuplicateChild { child: "cfdi:Emisor", .. }));
}

#[test]
fn unknown_child_in_strict_node_is_rejected() {
    let mut root = Element::new("cfdi:Comprobante").with_namespace(ns::CFDI_40);
    root.push_child(Element::new("cfdi:Domicilio").with_namespace(ns::CFDI_40));
    let err = Comprobante::from_element(&root).unwrap_err();
    assert!(matches!(err, CfdiError::UnknownChild { .. }));
}

#[test]
fn child_from_foreign_namespace_is_not_matched() {
    let mut root = Element::new("cfdi:Comprobante").with_namespace(ns::CFDI_40);
    root.push_child(Element::new("x:Emisor").with_namespace("urn:other"));
    assert!(Comprobante::from_element(&root).is_err());
}

#[test]
fn required_attribute_checked_on_output() {
    let mut c = Comprobante::from_map(&map(comprobante_data())).unwrap();
    c.lugar_expedicion = None;
    let err = c.to_element().unwrap_err();
    assert_eq!(
        err.to_string(),
        "cfdi:Comprobante: missing required attribute 'LugarExpedicion'"
    );
    // The tree stays usable after a failed write.
    c.lugar_expedicion = Some("06000".into());
    assert!(c.to_element().is_ok());
}

#[test]
fn invalid_value_is_a_setter_error() {
    let mut c = Concepto::default();
    let err = c.set_attribute("Cantidad", "uno").unwrap_err();
    assert!(matches!(err, CfdiError::InvalidValue { attribute: "Cantidad", .. }));
    assert_eq!(c.cantidad, None);

    c.set_attribute("ObjetoImp", "02").unwrap();
    c.set_attribute("tax_object", "").unwrap();
    assert_eq!(c.objeto_imp, None);
}

#[test]
fn to_element_writes_declarations_and_children_in_order() {
    let c = Comprobante::from_map(&map(comprobante_data())).unwrap();
    let el = c.to_element().unwrap();
    assert_eq!(el.namespace.as_deref(), Some(ns::CFDI_40));
    assert_eq!(el.attributes[0], ("xmlns:cfdi".to_string(), ns::CFDI_40.to_string()));
    assert_eq!(el.attribute("Version"), Some("4.0"));
    let children: Vec<&str> = el.child_elements().map(|e| e.name.as_str()).collect();
    assert_eq!(children, ["cfdi:Emisor", "cfdi:Receptor", "cfdi:Conceptos"]);
}

#[test]
fn exempt_transfer_with_rate_fails_validation() {
    let t = ConceptoTraslado::from_map(&map(json!({
        "Base": "100.00",
        "Impuesto": "002",
        "TipoFactor": "Exento",
        "TasaOCuota": "0.160000",
    })))
    .unwrap();
    assert!(matches!(t.validate(), Err(CfdiError::Validation(_))));
}

#[test]
fn complement_keeps_unknown_and_reports_warning() {
    let mut el = Element::new("cfdi:Complemento").with_namespace(ns::CFDI_40);
    let mut stamp = Element::new("tfd:TimbreFiscalDigital").with_namespace(ns::TFD);
    stamp.set_attribute("Version", "1.1");
    stamp.set_attribute("UUID", "X");
    el.push_child(stamp);
    el.push_child(Element::new("nomina12:Nomina").with_namespace("http://www.sat.gob.mx/nomina12"));

    let complemento = Complemento::from_element(&el).unwrap();
    assert_eq!(complemento.fiscal_stamp().unwrap().uuid.as_deref(), Some("X"));
    let warnings = complemento.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].tag, "nomina12:Nomina");
    assert_eq!(
        warnings[0].to_string(),
        "cfdi:Complemento: unknown node nomina12:Nomina (http://www.sat.gob.mx/nomina12)"
    );
}

#[test]
fn known_complement_may_appear_once() {
    let mut el = Element::new("cfdi:Complemento").with_namespace(ns::CFDI_40);
    el.push_child(Element::new("implocal:ImpuestosLocales").with_namespace(ns::IMPLOCAL));
    el.push_child(Element::new("implocal:ImpuestosLocales").with_namespace(ns::IMPLOCAL));
    let err = Complemento::from_element(&el).unwrap_err();
    assert!(matches!(err, CfdiError::DuplicateChild { .. }));
}

#[test]
fn complement_from_map_resolves_known_keys() {
    let complemento = Complemento::from_map(&map(json!({
        "tfd:TimbreFiscalDigital": { "Version": "1.1", "UUID": "ABC" },
        "leyendasFisc:LeyendasFiscales": { "version": "1.0" },
    })))
    .unwrap();
    assert_eq!(complemento.fiscal_stamp().unwrap().uuid.as_deref(), Some("ABC"));
    assert_eq!(complemento.unknown().count(), 1);
}

#[test]
fn addenda_is_kept_without_warnings() {
    let mut el = Element::new("cfdi:Addenda").with_namespace(ns::CFDI_40);
    let mut custom = Element::new("Proveedor");
    custom.set_attribute("Numero", "42");
    el.push_child(custom.clone());
    let addenda = Addenda::from_element(&el).unwrap();
    assert_eq!(addenda.nodes, vec![custom]);
    let out = addenda.to_element_in(SchemaVersion::V40).unwrap();
    assert_eq!(out.child("Proveedor").unwrap().attribute("Numero"), Some("42"));
}

#[test]
fn pagos_declares_its_own_namespace() {
    let pagos = Pagos {
        version: Some("2.0".into()),
        totales: Some(Totales {
            monto_total_pagos: Some(dec!(0.00)),
            ..Default::default()
        }),
        pago: Vec::new(),
    };
    let el = pagos.to_element_in(SchemaVersion::V40).unwrap();
    assert_eq!(el.name, "pago20:Pagos");
    assert_eq!(el.namespace.as_deref(), Some(ns::PAGOS_20));
    assert_eq!(el.attribute("xmlns:pago20"), Some(ns::PAGOS_20));
}

/// Drop each attribute required in 4.0, one at a time, and expect reading
/// the attributes to name exactly that one.
fn assert_each_required_is_enforced<N: Node>(full: Value) {
    let full = map(full);
    N::from_map(&full).unwrap().attributes_in(SchemaVersion::V40).unwrap();

    let required: Vec<_> = N::attribute_defs()
        .iter()
        .filter(|d| d.presence.is_required(SchemaVersion::V40))
        .collect();
    assert!(!required.is_empty());
    for def in required {
        let mut partial = full.clone();
        assert!(partial.remove(def.name()).is_some(), "{} not in input", def.name());
        let node = N::from_map(&partial).unwrap();
        match node.attributes_in(SchemaVersion::V40) {
            Err(CfdiError::MissingAttribute { node, attribute }) => {
                assert_eq!(node, N::TAG.name);
                assert_eq!(attribute, def.name());
            }
            other => panic!("{} without {}: {other:?}", N::TAG.name, def.name()),
        }
    }
}

#[test]
fn required_attributes_are_enforced_per_node() {
    assert_each_required_is_enforced::<Emisor>(json!({
        "Rfc": "AAA010101AAA", "Nombre": "ACME", "RegimenFiscal": "601",
    }));
    assert_each_required_is_enforced::<Receptor>(json!({
        "Rfc": "XAXX010101000",
        "Nombre": "PUBLICO EN GENERAL",
        "DomicilioFiscalReceptor": "06000",
        "RegimenFiscalReceptor": "616",
        "UsoCFDI": "S01",
    }));
    assert_each_required_is_enforced::<Concepto>(json!({
        "ClaveProdServ": "84111506",
        "Cantidad": "1",
        "ClaveUnidad": "E48",
        "Descripcion": "Servicio",
        "ValorUnitario": "100.00",
        "Importe": "100.00",
        "ObjetoImp": "02",
    }));
    assert_each_required_is_enforced::<ConceptoTraslado>(json!({
        "Base": "100.00", "Impuesto": "002", "TipoFactor": "Tasa",
        "TasaOCuota": "0.160000", "Importe": "16.00",
    }));
    assert_each_required_is_enforced::<Traslado>(json!({
        "Base": "100.00", "Impuesto": "002", "TipoFactor": "Tasa",
        "TasaOCuota": "0.160000", "Importe": "16.00",
    }));
    assert_each_required_is_enforced::<Pago>(json!({
        "FechaPago": "2024-02-01T12:00:00",
        "FormaDePagoP": "03",
        "MonedaP": "MXN",
        "Monto": "116.00",
    }));
    assert_each_required_is_enforced::<DoctoRelacionado>(json!({
        "IdDocumento": "6F6B2A8C-3C3E-4C1B-9E43-1E1E6D2A9B11",
        "MonedaDR": "MXN",
        "NumParcialidad": "1",
        "ImpSaldoAnt": "116.00",
        "ImpPagado": "116.00",
        "ImpSaldoInsoluto": "0.00",
        "ObjetoImpDR": "02",
    }));
}
