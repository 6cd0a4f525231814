//! Concrete CFDI node types.
//!
//! One Rust type per element of the CFDI 3.3/4.0 schema and of the
//! supported complements. Elements sharing a tag in different positions
//! (`cfdi:Traslado` under a line item and under the document) are distinct
//! types, so each keeps its own catalog.

mod complemento;
mod comprobante;
mod conceptos;
mod implocal;
mod impuestos;
mod pagos;
mod timbre;

pub use complemento::*;
pub use comprobante::*;
pub use conceptos::*;
pub use implocal::*;
pub use impuestos::*;
pub use pagos::*;
pub use timbre::*;
