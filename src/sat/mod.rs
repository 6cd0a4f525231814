//! Online verification against the SAT.
//!
//! # Example
//!
//! ```ignore
//! use cfdi::Cfdi;
//! use cfdi::sat::StatusClient;
//!
//! let cfdi = Cfdi::from_xml(&std::fs::read_to_string("stamped.xml")?)?;
//! let status = cfdi.check_status(&StatusClient::new()?)?;
//! ```

mod status;

pub use status::{SAT_STATUS_URL, StatusClient, StatusClientConfig, StatusResponse};
