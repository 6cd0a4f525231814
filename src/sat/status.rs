//! SAT `ConsultaCFDIService` SOAP client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{CfdiError, Element};
use crate::services::{DocumentStatus, StatusQuery, StatusService};

/// Production endpoint of the SAT status service.
pub const SAT_STATUS_URL: &str =
    "https://consultaqr.facturaelectronica.sat.gob.mx/ConsultaCFDIService.svc";

const SOAP_ACTION: &str = "http://tempuri.org/IConsultaCFDIService/Consulta";

const SERVICE: &str = "SAT status service";

/// Connection settings for [`StatusClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusClientConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for StatusClientConfig {
    fn default() -> Self {
        Self {
            endpoint: SAT_STATUS_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Fields of a `ConsultaResult`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// `CodigoEstatus`, e.g. "S - Comprobante obtenido satisfactoriamente.".
    pub code: Option<String>,
    /// `Estado`: "Vigente", "Cancelado" or "No Encontrado".
    pub state: Option<String>,
    /// `EsCancelable`.
    pub cancellable: Option<String>,
    /// `EstatusCancelacion`.
    pub cancellation_status: Option<String>,
}

impl StatusResponse {
    pub fn status(&self) -> Result<DocumentStatus, CfdiError> {
        match self.state.as_deref().map(str::trim) {
            Some("Vigente") => Ok(DocumentStatus::Valid),
            Some("Cancelado") | Some("No Encontrado") => Ok(DocumentStatus::Invalid),
            other => Err(CfdiError::Service {
                service: SERVICE,
                message: format!(
                    "unexpected state {:?} (code {:?})",
                    other.unwrap_or(""),
                    self.code.as_deref().unwrap_or("")
                ),
            }),
        }
    }
}

/// Blocking client for the SAT status service.
///
/// Requires network access. The service has no authentication.
pub struct StatusClient {
    config: StatusClientConfig,
    http: reqwest::blocking::Client,
}

impl StatusClient {
    pub fn new() -> Result<Self, CfdiError> {
        Self::with_config(StatusClientConfig::default())
    }

    pub fn with_config(config: StatusClientConfig) -> Result<Self, CfdiError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(network)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &StatusClientConfig {
        &self.config
    }

    /// Send a `Consulta` and return every field of the answer.
    ///
    /// # Errors
    ///
    /// `CfdiError::Service` on connection issues, non-success HTTP status or
    /// a response without `ConsultaResult`.
    pub fn consult(&self, query: &StatusQuery) -> Result<StatusResponse, CfdiError> {
        let expression = query.expression();
        debug!("querying {} for {}", self.config.endpoint, query.uuid);

        let resp = self
            .http
            .post(&self.config.endpoint)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", SOAP_ACTION)
            .body(envelope(&expression))
            .send()
            .map_err(network)?;

        let status = resp.status();
        let body = resp.text().map_err(network)?;
        if !status.is_success() {
            return Err(CfdiError::Service {
                service: SERVICE,
                message: format!("HTTP {status}: {body}"),
            });
        }
        parse_response(&body)
    }
}

impl StatusService for StatusClient {
    fn query(&self, query: &StatusQuery) -> Result<DocumentStatus, CfdiError> {
        self.consult(query)?.status()
    }
}

fn network(e: reqwest::Error) -> CfdiError {
    CfdiError::Service {
        service: SERVICE,
        message: e.to_string(),
    }
}

fn envelope(expression: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:tem="http://tempuri.org/">"#,
            "<soapenv:Header/><soapenv:Body><tem:Consulta>",
            "<tem:expresionImpresa>{}</tem:expresionImpresa>",
            "</tem:Consulta></soapenv:Body></soapenv:Envelope>"
        ),
        quick_xml::escape::escape(expression)
    )
}

fn parse_response(body: &str) -> Result<StatusResponse, CfdiError> {
    let root = crate::xml::parse(body)?;
    let result = find(&root, "ConsultaResult").ok_or_else(|| CfdiError::Service {
        service: SERVICE,
        message: "response has no ConsultaResult".into(),
    })?;
    let field = |name: &str| {
        result
            .child(name)
            .map(|e| e.text().trim().to_string())
            .filter(|t| !t.is_empty())
    };
    Ok(StatusResponse {
        code: field("CodigoEstatus"),
        state: field("Estado"),
        cancellable: field("EsCancelable"),
        cancellation_status: field("EstatusCancelacion"),
    })
}

fn find<'a>(el: &'a Element, local_name: &str) -> Option<&'a Element> {
    if el.local_name() == local_name {
        return Some(el);
    }
    el.child_elements().find_map(|c| find(c, local_name))
}
