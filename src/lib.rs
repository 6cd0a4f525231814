//! # cfdi
//!
//! Typed object model for Mexican CFDI 3.3 and 4.0 electronic invoices:
//! reading and writing the XML tree, computing tax totals, and generating
//! the original chain ("cadena original") that gets signed.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Amounts keep the scale they were read with, so `"100.00"` is written back
//! as `"100.00"`.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use cfdi::*;
//! use rust_decimal_macros::dec;
//!
//! let fecha = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(10, 30, 0).unwrap();
//! let cfdi = ComprobanteBuilder::new(fecha, "06000")
//!     .payment_form("03")
//!     .payment_method("PUE")
//!     .certificate_number("30001000000400002434")
//!     .issuer("AAA010101AAA", "ACME SA DE CV", "601")
//!     .recipient("XAXX010101000", "PUBLICO EN GENERAL", "06000", "616", "S01")
//!     .add_concepto(ConceptoBuilder::new("84111506", dec!(1), "E48", "Consultoría", dec!(100))
//!         .transfer(TaxKind::Iva, dec!(0.16)).build().unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(cfdi.comprobante().total, Some(dec!(116.00)));
//! assert!(cfdi.original_chain().unwrap().starts_with("||4.0|"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Node tree, original chain, tax totals, builders, catalog validation |
//! | `xml` (default) | XML string reading and writing via `quick-xml` |
//! | `sat` | Blocking client for the SAT status service |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod nodes;

#[cfg(feature = "core")]
pub mod chain;

#[cfg(feature = "core")]
pub mod totals;

#[cfg(feature = "core")]
pub mod services;

#[cfg(feature = "core")]
mod builder;

#[cfg(feature = "core")]
mod document;

#[cfg(feature = "xml")]
pub mod xml;

#[cfg(feature = "sat")]
pub mod sat;

#[cfg(feature = "core")]
pub use builder::{ComprobanteBuilder, ConceptoBuilder, PagoBuilder};
#[cfg(feature = "core")]
pub use crate::core::decimal;
#[cfg(feature = "core")]
pub use crate::core::{
    CfdiError, DocumentType, Element, FactorType, Node, Rfc, SchemaVersion, TaxKind,
    ValidationError, Warning, XmlNode, validate_arithmetic, validate_catalogs,
};
#[cfg(feature = "core")]
pub use document::Cfdi;
#[cfg(feature = "core")]
pub use nodes::Comprobante;
