//! XML reading and writing, and the document-level operations that rely on
//! external collaborators.
//!
//! Run with: `cargo test --test xml_tests`

#![cfg(feature = "xml")]

use std::cell::RefCell;

use cfdi::services::*;
use cfdi::xml::WriteOptions;
use cfdi::*;

const INVOICE: &str = include_str!("fixtures/invoice_40.xml");
const UUID: &str = "6F6B2A8C-3C3E-4C1B-9E43-1E1E6D2A9B11";

// --- Collaborator doubles ---

#[derive(Default)]
struct RecordingVerifier {
    calls: RefCell<Vec<(String, String, String)>>,
}

impl SignatureVerifier for RecordingVerifier {
    fn verify(&self, chain: &str, signature: &str, certificate: &str) -> Result<bool, CfdiError> {
        self.calls
            .borrow_mut()
            .push((chain.to_string(), signature.to_string(), certificate.to_string()));
        Ok(true)
    }
}

struct SatCertificates;

impl CertificateStore for SatCertificates {
    fn certificate(&self, serial: &str) -> Result<Option<String>, CfdiError> {
        Ok((serial == "00001000000504465028").then(|| "U0FUQ0VSVA==".to_string()))
    }
}

struct FixedStatus(DocumentStatus, RefCell<Option<String>>);

impl StatusService for FixedStatus {
    fn query(&self, query: &StatusQuery) -> Result<DocumentStatus, CfdiError> {
        *self.1.borrow_mut() = Some(query.expression());
        Ok(self.0)
    }
}

struct Validator(Vec<SchemaIssue>, RefCell<Option<SchemaVersion>>);

impl SchemaValidator for Validator {
    fn validate(&self, _xml: &str, version: SchemaVersion) -> Result<Vec<SchemaIssue>, CfdiError> {
        *self.1.borrow_mut() = Some(version);
        Ok(self.0.clone())
    }
}

struct EchoTransformer;

impl ChainTransformer for EchoTransformer {
    fn transform(&self, xml: &str, version: SchemaVersion) -> Result<String, CfdiError> {
        Ok(format!("{}:{}", version.code(), xml.len()))
    }
}

// --- Reading and writing ---

#[test]
fn round_trip_preserves_tree() {
    let cfdi = Cfdi::from_xml(INVOICE).unwrap();
    let again = Cfdi::from_xml(&cfdi.to_xml().unwrap()).unwrap();
    assert_eq!(again.comprobante(), cfdi.comprobante());
}

#[test]
fn pretty_output_reads_back() {
    let cfdi = Cfdi::from_xml(INVOICE).unwrap();
    let pretty = cfdi.to_xml_with(&WriteOptions::pretty()).unwrap();
    assert!(pretty.contains("\n  <cfdi:Emisor"));
    let again = Cfdi::from_xml(&pretty).unwrap();
    assert_eq!(again.comprobante(), cfdi.comprobante());
}

#[test]
fn output_keeps_declared_scale_and_declarations() {
    let xml = Cfdi::from_xml(INVOICE).unwrap().to_xml().unwrap();
    assert!(xml.starts_with(
        r#"<?xml version="1.0" encoding="UTF-8"?><cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#
    ));
    assert!(xml.contains(r#"SubTotal="150.00""#));
    assert!(xml.contains(r#"TasaOCuota="0.160000""#));
    assert!(xml.contains(r#"<tfd:TimbreFiscalDigital xmlns:tfd="http://www.sat.gob.mx/TimbreFiscalDigital""#));
}

#[test]
fn special_characters_survive() {
    let mut cfdi = Cfdi::from_xml(INVOICE).unwrap();
    cfdi.comprobante_mut().emisor.as_mut().unwrap().nombre = Some(r#"A & B "<C>""#.into());
    let again = Cfdi::from_xml(&cfdi.to_xml().unwrap()).unwrap();
    assert_eq!(
        again.comprobante().emisor.as_ref().unwrap().nombre.as_deref(),
        Some(r#"A & B "<C>""#)
    );
}

#[test]
fn unknown_complement_and_addenda_round_trip() {
    let xml = INVOICE.replace(
        "</cfdi:Complemento>",
        concat!(
            r#"<leyendasFisc:LeyendasFiscales xmlns:leyendasFisc="http://www.sat.gob.mx/leyendasFiscales" version="1.0">"#,
            r#"<leyendasFisc:Leyenda textoLeyenda="Texto"/></leyendasFisc:LeyendasFiscales>"#,
            r#"</cfdi:Complemento><cfdi:Addenda><Pedido Numero="42"/></cfdi:Addenda>"#
        ),
    );
    let cfdi = Cfdi::from_xml(&xml).unwrap();
    let warnings = cfdi.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].namespace.as_deref(), Some("http://www.sat.gob.mx/leyendasFiscales"));

    let out = cfdi.to_xml().unwrap();
    assert!(out.contains(r#"<leyendasFisc:Leyenda textoLeyenda="Texto"/>"#));
    assert!(out.contains(r#"<cfdi:Addenda><Pedido Numero="42"/></cfdi:Addenda>"#));
    assert_eq!(Cfdi::from_xml(&out).unwrap().comprobante(), cfdi.comprobante());
}

#[test]
fn complement_declared_on_root_keeps_its_namespace() {
    let uri = "http://www.sat.gob.mx/leyendasFiscales";
    let xml = INVOICE
        .replace(
            r#"xmlns:cfdi="http://www.sat.gob.mx/cfd/4""#,
            &format!(r#"xmlns:cfdi="http://www.sat.gob.mx/cfd/4" xmlns:leyendasFisc="{uri}""#),
        )
        .replace(
            "</cfdi:Complemento>",
            concat!(
                r#"<leyendasFisc:LeyendasFiscales version="1.0">"#,
                r#"<leyendasFisc:Leyenda textoLeyenda="Texto"/></leyendasFisc:LeyendasFiscales>"#,
                "</cfdi:Complemento>"
            ),
        );
    let cfdi = Cfdi::from_xml(&xml).unwrap();
    assert_eq!(cfdi.warnings()[0].namespace.as_deref(), Some(uri));

    let out = cfdi.to_xml().unwrap();
    assert!(out.contains(&format!(
        r#"<leyendasFisc:LeyendasFiscales xmlns:leyendasFisc="{uri}" version="1.0">"#
    )));

    let again = Cfdi::from_xml(&out).unwrap();
    assert_eq!(again.warnings()[0].namespace.as_deref(), Some(uri));
    assert_eq!(again.comprobante(), cfdi.comprobante());
}

#[test]
fn wrong_root_is_rejected() {
    let err = Cfdi::from_xml(r#"<cfdi:Retenciones xmlns:cfdi="http://www.sat.gob.mx/cfd/4"/>"#).unwrap_err();
    assert!(matches!(err, CfdiError::UnknownChild { .. }));
    let err = Cfdi::from_xml(r#"<cfdi:Comprobante xmlns:cfdi="urn:other" Version="4.0"/>"#).unwrap_err();
    assert!(matches!(err, CfdiError::UnknownChild { .. }));
}

#[test]
fn malformed_xml_is_an_xml_error() {
    assert!(matches!(Cfdi::from_xml("<cfdi:Comprobante"), Err(CfdiError::Xml(_))));
    assert!(matches!(Cfdi::from_xml("not xml"), Err(CfdiError::Xml(_))));
}

#[test]
fn source_text_is_kept() {
    let cfdi = Cfdi::from_xml(INVOICE).unwrap();
    assert_eq!(cfdi.original_xml(), Some(INVOICE));
    assert_eq!(Cfdi::new(cfdi.comprobante().clone()).original_xml(), None);
}

// --- Collaborators ---

#[test]
fn schema_issues_reject_the_document() {
    let validator = Validator(
        vec![SchemaIssue {
            code: "cvc-pattern-valid".into(),
            line: Some(3),
            message: "bad Rfc".into(),
        }],
        RefCell::new(None),
    );
    let err = Cfdi::from_xml_validated(INVOICE, &validator).unwrap_err();
    assert_eq!(
        err.to_string(),
        "validation failed: schema validation failed: [cvc-pattern-valid] line 3: bad Rfc"
    );
    assert_eq!(*validator.1.borrow(), Some(SchemaVersion::V40));

    let clean = Validator(Vec::new(), RefCell::new(None));
    assert!(Cfdi::from_xml_validated(INVOICE, &clean).is_ok());
}

#[test]
fn transformer_receives_source_text() {
    let cfdi = Cfdi::from_xml(INVOICE).unwrap();
    let chain = cfdi.original_chain_with(&EchoTransformer).unwrap();
    assert_eq!(chain, format!("4.0:{}", INVOICE.len()));
}

#[test]
fn seal_is_checked_over_the_native_chain() {
    let cfdi = Cfdi::from_xml(INVOICE).unwrap();
    let verifier = RecordingVerifier::default();
    assert!(cfdi.verify_seal(&verifier).unwrap());
    let calls = verifier.calls.borrow();
    assert_eq!(calls[0].0, cfdi.original_chain().unwrap());
    assert_eq!(calls[0].1, "c2VsbG8=");
    assert_eq!(calls[0].2, "TUlJQw==");
}

#[test]
fn unsigned_document_cannot_be_verified() {
    let mut cfdi = Cfdi::from_xml(INVOICE).unwrap();
    cfdi.comprobante_mut().sello = None;
    let err = cfdi.verify_seal(&RecordingVerifier::default()).unwrap_err();
    assert!(matches!(err, CfdiError::MissingAttribute { attribute: "Sello", .. }));
}

#[test]
fn stamp_is_checked_with_sat_certificate() {
    let cfdi = Cfdi::from_xml(INVOICE).unwrap();
    let verifier = RecordingVerifier::default();
    assert!(cfdi.verify_stamp(&verifier, &SatCertificates).unwrap());
    let calls = verifier.calls.borrow();
    assert_eq!(calls[0].0, cfdi.fiscal_stamp().unwrap().original_chain().unwrap());
    assert_eq!(calls[0].1, "c2F0");
    assert_eq!(calls[0].2, "U0FUQ0VSVA==");
}

#[test]
fn stamp_over_another_seal_does_not_verify() {
    let mut cfdi = Cfdi::from_xml(INVOICE).unwrap();
    cfdi.comprobante_mut().sello = Some("b3Rybw==".into());
    let verifier = RecordingVerifier::default();
    assert!(!cfdi.verify_stamp(&verifier, &SatCertificates).unwrap());
    assert!(verifier.calls.borrow().is_empty());
}

#[test]
fn unknown_sat_certificate_is_a_service_error() {
    let xml = INVOICE.replace("00001000000504465028", "00001000000000000000");
    let cfdi = Cfdi::from_xml(&xml).unwrap();
    let err = cfdi
        .verify_stamp(&RecordingVerifier::default(), &SatCertificates)
        .unwrap_err();
    assert!(matches!(err, CfdiError::Service { service: "certificate store", .. }));
}

#[test]
fn status_is_queried_with_document_fields() {
    let cfdi = Cfdi::from_xml(INVOICE).unwrap();
    assert_eq!(cfdi.uuid(), Some(UUID));
    let service = FixedStatus(DocumentStatus::Valid, RefCell::new(None));
    assert_eq!(cfdi.check_status(&service).unwrap(), DocumentStatus::Valid);
    assert_eq!(
        service.1.borrow().as_deref(),
        Some("?re=AAA010101AAA&rr=XAXX010101000&tt=0000000174.000000&id=6F6B2A8C-3C3E-4C1B-9E43-1E1E6D2A9B11")
    );
}

#[test]
fn unstamped_document_has_no_status() {
    let mut cfdi = Cfdi::from_xml(INVOICE).unwrap();
    cfdi.comprobante_mut().complemento = None;
    assert_eq!(cfdi.uuid(), None);
    let service = FixedStatus(DocumentStatus::Valid, RefCell::new(None));
    assert!(matches!(cfdi.check_status(&service), Err(CfdiError::Validation(_))));
    assert!(service.1.borrow().is_none());
}
