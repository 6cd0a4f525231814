use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::chain::ChainBuilder;
use crate::core::catalog::attr;
use crate::core::registry::ns;
use crate::core::*;

/// `tfd:TimbreFiscalDigital` 1.1: the SAT's stamp over an issued CFDI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimbreFiscalDigital {
    pub version: Option<String>,
    /// Folio fiscal assigned at stamping.
    pub uuid: Option<String>,
    pub fecha_timbrado: Option<NaiveDateTime>,
    /// RFC of the certification provider (PAC).
    pub rfc_prov_certif: Option<Rfc>,
    pub leyenda: Option<String>,
    /// Copy of the issuer's `Sello`.
    pub sello_cfd: Option<String>,
    pub no_certificado_sat: Option<String>,
    pub sello_sat: Option<String>,
}

impl Node for TimbreFiscalDigital {
    const TAG: Tag = Tag::fixed("tfd:TimbreFiscalDigital", ns::TFD);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<TimbreFiscalDigital>] = &[
            attr!(TimbreFiscalDigital, version, ["Version", "version"], Required),
            attr!(TimbreFiscalDigital, uuid, ["UUID", "uuid"], Required),
            attr!(TimbreFiscalDigital, fecha_timbrado, ["FechaTimbrado", "stamp_date"], Required),
            attr!(TimbreFiscalDigital, rfc_prov_certif, ["RfcProvCertif", "provider_rfc"], Required),
            attr!(TimbreFiscalDigital, leyenda, ["Leyenda", "legend"], Optional),
            attr!(TimbreFiscalDigital, sello_cfd, ["SelloCFD", "cfd_seal"], Required),
            attr!(TimbreFiscalDigital, no_certificado_sat, ["NoCertificadoSAT", "sat_certificate_number"], Required),
            attr!(TimbreFiscalDigital, sello_sat, ["SelloSAT", "sat_seal"], Required),
        ];
        ATTRS
    }

    fn base_attributes(&self, _version: SchemaVersion) -> Vec<(String, String)> {
        vec![
            ("xmlns:tfd".into(), ns::TFD.into()),
            ("xmlns:xsi".into(), ns::XSI.into()),
            ("xsi:schemaLocation".into(), format!("{} {}", ns::TFD, ns::TFD_XSD)),
        ]
    }
}

impl TimbreFiscalDigital {
    /// Chain signed by the SAT in `SelloSAT`.
    pub fn original_chain(&self) -> Result<String, CfdiError> {
        let node = Self::TAG.name;
        let mut chain = ChainBuilder::new();
        chain
            .required(node, "Version", self.version.as_ref())?
            .required(node, "UUID", self.uuid.as_ref())?
            .required(node, "FechaTimbrado", self.fecha_timbrado.as_ref())?
            .required(node, "RfcProvCertif", self.rfc_prov_certif.as_ref())?
            .optional(self.leyenda.as_ref())
            .required(node, "SelloCFD", self.sello_cfd.as_ref())?
            .required(node, "NoCertificadoSAT", self.no_certificado_sat.as_ref())?;
        Ok(chain.build())
    }
}
