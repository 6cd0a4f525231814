//! The top-level CFDI document.
//!
//! [`Cfdi`] owns a [`Comprobante`] tree plus, when it was read from XML, an
//! untouched copy of the source text. It ties the node engine to the tax
//! aggregator, the chain builder and the external collaborators.

use crate::chain;
use crate::core::{CfdiError, Element, Node, Warning};
use crate::nodes::{Comprobante, ImpuestosLocales, Pagos, TimbreFiscalDigital};
use crate::services::{
    CertificateStore, DocumentStatus, SignatureVerifier, StatusQuery, StatusService,
};
use crate::totals;

#[derive(Debug, Clone, PartialEq)]
pub struct Cfdi {
    comprobante: Comprobante,
    original_xml: Option<String>,
}

impl Cfdi {
    /// Wrap a programmatically assembled tree.
    pub fn new(comprobante: Comprobante) -> Self {
        Self {
            comprobante,
            original_xml: None,
        }
    }

    /// Build from an element tree. The root must be `cfdi:Comprobante` in
    /// the 3.3 or 4.0 namespace.
    pub fn from_element(root: &Element) -> Result<Self, CfdiError> {
        if !Comprobante::TAG.matches(root) {
            return Err(CfdiError::UnknownChild {
                node: "document",
                tag: root.name.clone(),
            });
        }
        Ok(Self::new(Comprobante::from_element(root)?))
    }

    /// Parse an XML string, keeping the text as [`Cfdi::original_xml`].
    #[cfg(feature = "xml")]
    pub fn from_xml(xml: &str) -> Result<Self, CfdiError> {
        let root = crate::xml::parse(xml)?;
        let mut cfdi = Self::from_element(&root)?;
        cfdi.original_xml = Some(xml.to_string());
        Ok(cfdi)
    }

    /// Run the schema validator on the raw text before building the tree.
    /// Any reported issue rejects the document.
    #[cfg(feature = "xml")]
    pub fn from_xml_validated(
        xml: &str,
        validator: &dyn crate::services::SchemaValidator,
    ) -> Result<Self, CfdiError> {
        let root = crate::xml::parse(xml)?;
        let version = root
            .attribute("Version")
            .and_then(crate::core::SchemaVersion::from_code)
            .ok_or_else(|| {
                CfdiError::Validation("document declares no supported Version".into())
            })?;
        let issues = validator.validate(xml, version)?;
        if !issues.is_empty() {
            let messages: Vec<String> = issues.iter().map(ToString::to_string).collect();
            return Err(CfdiError::Validation(format!(
                "schema validation failed: {}",
                messages.join("; ")
            )));
        }
        let mut cfdi = Self::from_element(&root)?;
        cfdi.original_xml = Some(xml.to_string());
        Ok(cfdi)
    }

    /// Source text this document was read from, if any.
    pub fn original_xml(&self) -> Option<&str> {
        self.original_xml.as_deref()
    }

    pub fn comprobante(&self) -> &Comprobante {
        &self.comprobante
    }

    /// Mutable access to the tree. A signed document's seal stops matching
    /// as soon as a chain field changes.
    pub fn comprobante_mut(&mut self) -> &mut Comprobante {
        &mut self.comprobante
    }

    pub fn into_comprobante(self) -> Comprobante {
        self.comprobante
    }

    /// Recompute invoice totals and, for payment documents, the payment
    /// complement's taxes and totals.
    pub fn calculate_totals(&mut self) -> Result<(), CfdiError> {
        if let Some(pagos) = self
            .comprobante
            .complemento
            .as_mut()
            .and_then(|c| c.pagos_mut())
        {
            totals::calculate_payment_totals(pagos)?;
        }
        totals::calculate_totals(&mut self.comprobante)
    }

    /// Natively generated original chain.
    pub fn original_chain(&self) -> Result<String, CfdiError> {
        chain::original_chain(&self.comprobante)
    }

    /// Original chain through an external transform, fed the source text or,
    /// for assembled documents, the serialized tree.
    #[cfg(feature = "xml")]
    pub fn original_chain_with(
        &self,
        transformer: &dyn crate::services::ChainTransformer,
    ) -> Result<String, CfdiError> {
        let version = self.comprobante.schema_version();
        match &self.original_xml {
            Some(xml) => transformer.transform(xml, version),
            None => transformer.transform(&self.to_xml()?, version),
        }
    }

    pub fn to_element(&self) -> Result<Element, CfdiError> {
        self.comprobante.to_element()
    }

    /// Compact XML with declaration.
    #[cfg(feature = "xml")]
    pub fn to_xml(&self) -> Result<String, CfdiError> {
        self.to_xml_with(&crate::xml::WriteOptions::default())
    }

    #[cfg(feature = "xml")]
    pub fn to_xml_with(&self, options: &crate::xml::WriteOptions) -> Result<String, CfdiError> {
        crate::xml::write(&self.to_element()?, options)
    }

    /// Check the issuer's `Sello` over the original chain with the embedded
    /// `Certificado`.
    pub fn verify_seal(&self, verifier: &dyn SignatureVerifier) -> Result<bool, CfdiError> {
        let node = Comprobante::TAG.name;
        let seal = self
            .comprobante
            .sello
            .as_deref()
            .ok_or(CfdiError::MissingAttribute {
                node,
                attribute: "Sello",
            })?;
        let certificate =
            self.comprobante
                .certificado
                .as_deref()
                .ok_or(CfdiError::MissingAttribute {
                    node,
                    attribute: "Certificado",
                })?;
        verifier.verify(&self.original_chain()?, seal, certificate)
    }

    /// Check the SAT's `SelloSAT` over the fiscal stamp chain, with the SAT
    /// certificate fetched from `store`. A stamp whose `SelloCFD` differs
    /// from the document's `Sello` does not verify.
    pub fn verify_stamp(
        &self,
        verifier: &dyn SignatureVerifier,
        store: &dyn CertificateStore,
    ) -> Result<bool, CfdiError> {
        let stamp = self
            .fiscal_stamp()
            .ok_or_else(|| CfdiError::Validation("document is not stamped".into()))?;
        if stamp.sello_cfd != self.comprobante.sello {
            return Ok(false);
        }
        let node = TimbreFiscalDigital::TAG.name;
        let serial = stamp
            .no_certificado_sat
            .as_deref()
            .ok_or(CfdiError::MissingAttribute {
                node,
                attribute: "NoCertificadoSAT",
            })?;
        let seal = stamp.sello_sat.as_deref().ok_or(CfdiError::MissingAttribute {
            node,
            attribute: "SelloSAT",
        })?;
        let certificate = store
            .certificate(serial)?
            .ok_or_else(|| CfdiError::Service {
                service: "certificate store",
                message: format!("certificate {serial} not found"),
            })?;
        verifier.verify(&stamp.original_chain()?, seal, &certificate)
    }

    pub fn fiscal_stamp(&self) -> Option<&TimbreFiscalDigital> {
        self.comprobante.fiscal_stamp()
    }

    /// Folio fiscal, once stamped.
    pub fn uuid(&self) -> Option<&str> {
        self.fiscal_stamp().and_then(|t| t.uuid.as_deref())
    }

    pub fn payments(&self) -> Option<&Pagos> {
        self.comprobante.pagos()
    }

    pub fn local_taxes(&self) -> Option<&ImpuestosLocales> {
        self.comprobante.impuestos_locales()
    }

    /// Unknown extension elements tolerated while reading, from the
    /// document complement and every item complement.
    pub fn warnings(&self) -> Vec<Warning> {
        let mut warnings: Vec<Warning> = self
            .comprobante
            .complemento
            .as_ref()
            .map(|c| c.warnings())
            .unwrap_or_default();
        for concepto in self.comprobante.concepts() {
            if let Some(cc) = &concepto.complemento_concepto {
                warnings.extend(cc.warnings());
            }
        }
        warnings
    }

    /// Inputs for the online status service.
    pub fn status_query(&self) -> Result<StatusQuery, CfdiError> {
        let c = &self.comprobante;
        let issuer_rfc = c
            .emisor
            .as_ref()
            .and_then(|e| e.rfc.as_ref())
            .ok_or(CfdiError::MissingAttribute {
                node: "cfdi:Emisor",
                attribute: "Rfc",
            })?;
        let recipient_rfc = c
            .receptor
            .as_ref()
            .and_then(|r| r.rfc.as_ref())
            .ok_or(CfdiError::MissingAttribute {
                node: "cfdi:Receptor",
                attribute: "Rfc",
            })?;
        let total = c.total.ok_or(CfdiError::MissingAttribute {
            node: Comprobante::TAG.name,
            attribute: "Total",
        })?;
        let uuid = self
            .uuid()
            .ok_or_else(|| CfdiError::Validation("document is not stamped".into()))?;
        Ok(StatusQuery {
            issuer_rfc: issuer_rfc.as_str().to_string(),
            recipient_rfc: recipient_rfc.as_str().to_string(),
            total,
            uuid: uuid.to_string(),
        })
    }

    pub fn check_status(&self, service: &dyn StatusService) -> Result<DocumentStatus, CfdiError> {
        service.query(&self.status_query()?)
    }
}

impl From<Comprobante> for Cfdi {
    fn from(comprobante: Comprobante) -> Self {
        Self::new(comprobante)
    }
}
