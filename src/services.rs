//! Interfaces to collaborators outside this crate: schema validation,
//! transform-based chain generation, signature checking, the SAT
//! certificate store and the online status service.
//!
//! Implementations live with the host application (or, for the status
//! service, behind the `sat` feature).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::decimal::round_half_up;
use crate::core::{CfdiError, SchemaVersion};

/// One finding reported by a schema validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    pub code: String,
    pub line: Option<u32>,
    pub message: String,
}

impl std::fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{}] line {}: {}", self.code, line, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// XSD validation of a raw document. An empty list means the document passed.
pub trait SchemaValidator {
    fn validate(&self, xml: &str, version: SchemaVersion) -> Result<Vec<SchemaIssue>, CfdiError>;
}

/// Transform-based chain generation (XSLT or similar) over the serialized
/// document.
pub trait ChainTransformer {
    fn transform(&self, xml: &str, version: SchemaVersion) -> Result<String, CfdiError>;
}

/// SHA-256/RSA verification of a base64 signature over a chain, with a
/// base64 DER certificate.
pub trait SignatureVerifier {
    fn verify(&self, chain: &str, signature: &str, certificate: &str) -> Result<bool, CfdiError>;
}

/// Lookup of SAT certificates by serial number.
pub trait CertificateStore {
    /// Base64 DER certificate, `None` when the serial is unknown.
    fn certificate(&self, serial: &str) -> Result<Option<String>, CfdiError>;
}

/// Status of a stamped document as reported by the SAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStatus {
    /// `Vigente`.
    Valid,
    /// `Cancelado` or `No Encontrado`.
    Invalid,
}

/// Online status lookup.
pub trait StatusService {
    fn query(&self, query: &StatusQuery) -> Result<DocumentStatus, CfdiError>;
}

/// The four fields identifying a stamped document to the status service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusQuery {
    pub issuer_rfc: String,
    pub recipient_rfc: String,
    pub total: Decimal,
    pub uuid: String,
}

impl StatusQuery {
    /// `?re=..&rr=..&tt=..&id=..`, with the total zero-padded to 17
    /// characters and 6 decimals.
    pub fn expression(&self) -> String {
        let total = round_half_up(self.total, 6).to_string();
        format!(
            "?re={}&rr={}&tt={:0>17}&id={}",
            self.issuer_rfc, self.recipient_rfc, total, self.uuid
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn expression_pads_total() {
        let q = StatusQuery {
            issuer_rfc: "AAA010101AAA".into(),
            recipient_rfc: "XAXX010101000".into(),
            total: dec!(116.00),
            uuid: "6F6B2A8C-3C3E-4C1B-9E43-1E1E6D2A9B11".into(),
        };
        assert_eq!(
            q.expression(),
            "?re=AAA010101AAA&rr=XAXX010101000&tt=0000000116.000000&id=6F6B2A8C-3C3E-4C1B-9E43-1E1E6D2A9B11"
        );
    }

    #[test]
    fn issue_display() {
        let issue = SchemaIssue {
            code: "cvc-attribute.3".into(),
            line: Some(4),
            message: "bad value".into(),
        };
        assert_eq!(issue.to_string(), "[cvc-attribute.3] line 4: bad value");
    }
}
