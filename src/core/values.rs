//! Typed scalar attribute values and their string forms.

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::decimal;

/// Fixed date-time pattern used by every CFDI date attribute.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A scalar that can be read from and written to an attribute string.
///
/// `parse_attr` is the setter-side validation: it rejects malformed input
/// with a short reason that the node engine wraps into
/// [`CfdiError::InvalidValue`](super::CfdiError::InvalidValue).
pub trait AttrValue: Sized {
    fn parse_attr(raw: &str) -> Result<Self, String>;
    fn format_attr(&self) -> String;
}

impl AttrValue for String {
    fn parse_attr(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }

    fn format_attr(&self) -> String {
        self.clone()
    }
}

impl AttrValue for Decimal {
    fn parse_attr(raw: &str) -> Result<Self, String> {
        decimal::parse(raw).map_err(|e| e.to_string())
    }

    fn format_attr(&self) -> String {
        self.to_string()
    }
}

impl AttrValue for NaiveDateTime {
    fn parse_attr(raw: &str) -> Result<Self, String> {
        NaiveDateTime::parse_from_str(raw.trim(), DATE_TIME_FORMAT)
            .map_err(|e| format!("expected YYYY-MM-DDTHH:mm:ss ({e})"))
    }

    fn format_attr(&self) -> String {
        self.format(DATE_TIME_FORMAT).to_string()
    }
}

impl AttrValue for u32 {
    fn parse_attr(raw: &str) -> Result<Self, String> {
        raw.trim()
            .parse()
            .map_err(|e| format!("expected a positive integer ({e})"))
    }

    fn format_attr(&self) -> String {
        self.to_string()
    }
}

impl AttrValue for u16 {
    fn parse_attr(raw: &str) -> Result<Self, String> {
        raw.trim()
            .parse()
            .map_err(|e| format!("expected a year ({e})"))
    }

    fn format_attr(&self) -> String {
        self.to_string()
    }
}

/// Mexican federal taxpayer identifier (RFC).
///
/// 12 characters for legal entities, 13 for individuals, drawn from
/// `A-Z`, `Ñ`, `&` and digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rfc(String);

impl Rfc {
    /// Generic RFC for domestic recipients without one (público en general).
    pub const GENERIC_DOMESTIC: &'static str = "XAXX010101000";
    /// Generic RFC for foreign recipients.
    pub const GENERIC_FOREIGN: &'static str = "XEXX010101000";

    pub fn new(value: impl Into<String>) -> Result<Self, String> {
        let value = value.into();
        let len = value.chars().count();
        if !(12..=13).contains(&len) {
            return Err(format!("RFC must be 12 or 13 characters, got {len}"));
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || *c == 'Ñ' || *c == '&'))
        {
            return Err(format!("RFC contains invalid character '{c}'"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the two generic RFCs used when the recipient has none.
    pub fn is_generic(&self) -> bool {
        self.0 == Self::GENERIC_DOMESTIC || self.0 == Self::GENERIC_FOREIGN
    }
}

impl fmt::Display for Rfc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Rfc {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rfc> for String {
    fn from(rfc: Rfc) -> Self {
        rfc.0
    }
}

impl AttrValue for Rfc {
    fn parse_attr(raw: &str) -> Result<Self, String> {
        Self::new(raw.trim())
    }

    fn format_attr(&self) -> String {
        self.0.clone()
    }
}

/// c_Impuesto: federal tax kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxKind {
    /// 001: Income tax.
    Isr,
    /// 002: Value added tax.
    Iva,
    /// 003: Special tax on production and services.
    Ieps,
}

impl TaxKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Isr => "001",
            Self::Iva => "002",
            Self::Ieps => "003",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "001" => Some(Self::Isr),
            "002" => Some(Self::Iva),
            "003" => Some(Self::Ieps),
            _ => None,
        }
    }
}

impl AttrValue for TaxKind {
    fn parse_attr(raw: &str) -> Result<Self, String> {
        Self::from_code(raw.trim()).ok_or_else(|| "expected 001, 002 or 003".to_string())
    }

    fn format_attr(&self) -> String {
        self.code().to_string()
    }
}

/// c_TipoFactor: how a tax is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactorType {
    /// Tasa: a rate applied to the base.
    Rate,
    /// Cuota: a fixed fee per unit.
    Fee,
    /// Exento: exempt, no rate and no amount.
    Exempt,
}

impl FactorType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Rate => "Tasa",
            Self::Fee => "Cuota",
            Self::Exempt => "Exento",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "Tasa" => Some(Self::Rate),
            "Cuota" => Some(Self::Fee),
            "Exento" => Some(Self::Exempt),
            _ => None,
        }
    }
}

impl AttrValue for FactorType {
    fn parse_attr(raw: &str) -> Result<Self, String> {
        Self::from_code(raw.trim()).ok_or_else(|| "expected Tasa, Cuota or Exento".to_string())
    }

    fn format_attr(&self) -> String {
        self.code().to_string()
    }
}

/// c_TipoDeComprobante.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// I: Ingreso.
    Income,
    /// E: Egreso.
    Expense,
    /// T: Traslado.
    Transfer,
    /// N: Nómina.
    Payroll,
    /// P: Pago.
    Payment,
}

impl DocumentType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Income => "I",
            Self::Expense => "E",
            Self::Transfer => "T",
            Self::Payroll => "N",
            Self::Payment => "P",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "I" => Some(Self::Income),
            "E" => Some(Self::Expense),
            "T" => Some(Self::Transfer),
            "N" => Some(Self::Payroll),
            "P" => Some(Self::Payment),
            _ => None,
        }
    }
}

impl AttrValue for DocumentType {
    fn parse_attr(raw: &str) -> Result<Self, String> {
        Self::from_code(raw.trim()).ok_or_else(|| "expected I, E, T, N or P".to_string())
    }

    fn format_attr(&self) -> String {
        self.code().to_string()
    }
}

/// CFDI schema version declared by the root `Version` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SchemaVersion {
    V33,
    #[default]
    V40,
}

impl SchemaVersion {
    pub fn code(&self) -> &'static str {
        match self {
            Self::V33 => "3.3",
            Self::V40 => "4.0",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "3.3" => Some(Self::V33),
            "4.0" => Some(Self::V40),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn rfc_accepts_legal_and_individual_forms() {
        assert!(Rfc::new("AAA010101AAA").is_ok());
        assert!(Rfc::new("XAXX010101000").unwrap().is_generic());
        assert!(Rfc::new("ÑAÑ010101AB1").is_ok());
        assert!(Rfc::new("AAA010101").is_err());
        assert!(Rfc::new("aaa010101aaa").is_err());
    }

    #[test]
    fn date_time_uses_fixed_pattern() {
        let dt = NaiveDateTime::parse_attr("2024-01-15T10:30:00").unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap()
        );
        assert_eq!(dt.format_attr(), "2024-01-15T10:30:00");
        assert!(NaiveDateTime::parse_attr("15/01/2024").is_err());
    }

    #[test]
    fn decimal_keeps_scale() {
        let d = Decimal::parse_attr("100.00").unwrap();
        assert_eq!(d.format_attr(), "100.00");
        let d = Decimal::parse_attr("0.160000").unwrap();
        assert_eq!(d.format_attr(), "0.160000");
    }

    #[test]
    fn catalog_enums_round_trip_codes() {
        for kind in [TaxKind::Isr, TaxKind::Iva, TaxKind::Ieps] {
            assert_eq!(TaxKind::from_code(kind.code()), Some(kind));
        }
        for ft in [FactorType::Rate, FactorType::Fee, FactorType::Exempt] {
            assert_eq!(FactorType::from_code(ft.code()), Some(ft));
        }
        assert!(DocumentType::parse_attr("X").is_err());
    }
}
