use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Addenda, Complemento, Conceptos, Impuestos};
use crate::core::catalog::{array_child, attr, unique_child};
use crate::core::registry::ns;
use crate::core::*;

/// `cfdi:Comprobante`: the invoice root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comprobante {
    pub version: Option<String>,
    pub serie: Option<String>,
    pub folio: Option<String>,
    pub fecha: Option<NaiveDateTime>,
    /// Issuer's digital seal over the original chain.
    pub sello: Option<String>,
    /// c_FormaPago (e.g. "01" cash, "03" transfer, "99" to be defined).
    pub forma_pago: Option<String>,
    pub no_certificado: Option<String>,
    pub certificado: Option<String>,
    pub condiciones_de_pago: Option<String>,
    pub sub_total: Option<Decimal>,
    pub descuento: Option<Decimal>,
    pub moneda: Option<String>,
    pub tipo_cambio: Option<Decimal>,
    pub total: Option<Decimal>,
    pub tipo_de_comprobante: Option<DocumentType>,
    /// c_Exportacion, mandatory from 4.0.
    pub exportacion: Option<String>,
    /// c_MetodoPago ("PUE" or "PPD").
    pub metodo_pago: Option<String>,
    /// Postal code of the place of issue.
    pub lugar_expedicion: Option<String>,
    pub confirmacion: Option<String>,

    pub informacion_global: Option<InformacionGlobal>,
    pub cfdi_relacionados: Vec<CfdiRelacionados>,
    pub emisor: Option<Emisor>,
    pub receptor: Option<Receptor>,
    pub conceptos: Option<Conceptos>,
    pub impuestos: Option<Impuestos>,
    pub complemento: Option<Complemento>,
    pub addenda: Option<Addenda>,
}

impl Node for Comprobante {
    const TAG: Tag = Tag::cfdi("cfdi:Comprobante");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<Comprobante>] = &[
            attr!(Comprobante, version, ["Version", "version"], Required),
            attr!(Comprobante, serie, ["Serie", "series"], Optional),
            attr!(Comprobante, folio, ["Folio", "folio"], Optional),
            attr!(Comprobante, fecha, ["Fecha", "date"], Required),
            attr!(Comprobante, sello, ["Sello", "seal"], Optional),
            attr!(Comprobante, forma_pago, ["FormaPago", "payment_form"], Optional),
            attr!(Comprobante, no_certificado, ["NoCertificado", "certificate_number"], Optional),
            attr!(Comprobante, certificado, ["Certificado", "certificate"], Optional),
            attr!(Comprobante, condiciones_de_pago, ["CondicionesDePago", "payment_conditions"], Optional),
            attr!(Comprobante, sub_total, ["SubTotal", "subtotal"], Required),
            attr!(Comprobante, descuento, ["Descuento", "discount"], Optional),
            attr!(Comprobante, moneda, ["Moneda", "currency"], Required),
            attr!(Comprobante, tipo_cambio, ["TipoCambio", "exchange_rate"], Optional),
            attr!(Comprobante, total, ["Total", "total"], Required),
            attr!(Comprobante, tipo_de_comprobante, ["TipoDeComprobante", "document_type"], Required),
            attr!(Comprobante, exportacion, ["Exportacion", "export"], RequiredSince40),
            attr!(Comprobante, metodo_pago, ["MetodoPago", "payment_method"], Optional),
            attr!(Comprobante, lugar_expedicion, ["LugarExpedicion", "postal_code"], Required),
            attr!(Comprobante, confirmacion, ["Confirmacion", "confirmation"], Optional),
        ];
        ATTRS
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<Comprobante>] = &[
            unique_child!(Comprobante, informacion_global: InformacionGlobal, ["InformacionGlobal", "global_information"]),
            array_child!(Comprobante, cfdi_relacionados: CfdiRelacionados, ["CfdiRelacionados", "related_cfdis"]),
            unique_child!(Comprobante, emisor: Emisor, ["Emisor", "issuer"]),
            unique_child!(Comprobante, receptor: Receptor, ["Receptor", "recipient"]),
            unique_child!(Comprobante, conceptos: Conceptos, ["Conceptos", "items"]),
            unique_child!(Comprobante, impuestos: Impuestos, ["Impuestos", "taxes"]),
            unique_child!(Comprobante, complemento: Complemento, ["Complemento", "complement"]),
            unique_child!(Comprobante, addenda: Addenda, ["Addenda", "addendum"]),
        ];
        CHILDREN
    }

    fn base_attributes(&self, version: SchemaVersion) -> Vec<(String, String)> {
        let (uri, xsd) = match version {
            SchemaVersion::V33 => (ns::CFDI_33, ns::CFDI_33_XSD),
            SchemaVersion::V40 => (ns::CFDI_40, ns::CFDI_40_XSD),
        };
        vec![
            ("xmlns:cfdi".into(), uri.into()),
            ("xmlns:xsi".into(), ns::XSI.into()),
            ("xsi:schemaLocation".into(), format!("{uri} {xsd}")),
        ]
    }

    fn own_version(&self) -> Option<SchemaVersion> {
        self.version.as_deref().and_then(SchemaVersion::from_code)
    }

    fn check(&self) -> Result<(), CfdiError> {
        match self.version.as_deref() {
            Some(v) if SchemaVersion::from_code(v).is_none() => Err(CfdiError::Validation(
                format!("cfdi:Comprobante: unsupported Version '{v}'"),
            )),
            _ => Ok(()),
        }
    }
}

impl Comprobante {
    /// Declared schema version, 4.0 when absent or unknown.
    pub fn schema_version(&self) -> SchemaVersion {
        self.own_version().unwrap_or_default()
    }

    /// Line items, empty when the `Conceptos` node is absent.
    pub fn concepts(&self) -> &[super::Concepto] {
        self.conceptos
            .as_ref()
            .map(|c| c.concepto.as_slice())
            .unwrap_or(&[])
    }

    pub fn fiscal_stamp(&self) -> Option<&super::TimbreFiscalDigital> {
        self.complemento.as_ref().and_then(Complemento::fiscal_stamp)
    }

    pub fn pagos(&self) -> Option<&super::Pagos> {
        self.complemento.as_ref().and_then(Complemento::pagos)
    }

    pub fn impuestos_locales(&self) -> Option<&super::ImpuestosLocales> {
        self.complemento.as_ref().and_then(Complemento::impuestos_locales)
    }

    /// Attach a unique child slot the same way population does.
    pub fn set_emisor(&mut self, emisor: Emisor) -> Result<(), CfdiError> {
        attach_unique(&mut self.emisor, emisor, Self::TAG.name, Emisor::TAG.name)
    }

    pub fn set_receptor(&mut self, receptor: Receptor) -> Result<(), CfdiError> {
        attach_unique(&mut self.receptor, receptor, Self::TAG.name, Receptor::TAG.name)
    }

    /// Append a line item, creating the `Conceptos` container on first use.
    pub fn add_concepto(&mut self, concepto: super::Concepto) {
        self.conceptos
            .get_or_insert_with(Conceptos::default)
            .concepto
            .push(concepto);
    }
}

/// `cfdi:InformacionGlobal`: period covered by a global invoice to the public.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InformacionGlobal {
    pub periodicidad: Option<String>,
    pub meses: Option<String>,
    pub anio: Option<u16>,
}

impl Node for InformacionGlobal {
    const TAG: Tag = Tag::cfdi("cfdi:InformacionGlobal");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<InformacionGlobal>] = &[
            attr!(InformacionGlobal, periodicidad, ["Periodicidad", "periodicity"], Required),
            attr!(InformacionGlobal, meses, ["Meses", "months"], Required),
            attr!(InformacionGlobal, anio, ["Año", "year"], Required),
        ];
        ATTRS
    }
}

/// `cfdi:CfdiRelacionados`: one relation type and the documents it links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CfdiRelacionados {
    pub tipo_relacion: Option<String>,
    pub cfdi_relacionado: Vec<CfdiRelacionado>,
}

impl Node for CfdiRelacionados {
    const TAG: Tag = Tag::cfdi("cfdi:CfdiRelacionados");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<CfdiRelacionados>] = &[attr!(
            CfdiRelacionados,
            tipo_relacion,
            ["TipoRelacion", "relation_type"],
            Required
        )];
        ATTRS
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<CfdiRelacionados>] = &[array_child!(
            CfdiRelacionados,
            cfdi_relacionado: CfdiRelacionado,
            ["CfdiRelacionado", "related_cfdi"]
        )];
        CHILDREN
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CfdiRelacionado {
    pub uuid: Option<String>,
}

impl Node for CfdiRelacionado {
    const TAG: Tag = Tag::cfdi("cfdi:CfdiRelacionado");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<CfdiRelacionado>] =
            &[attr!(CfdiRelacionado, uuid, ["UUID", "uuid"], Required)];
        ATTRS
    }
}

/// `cfdi:Emisor`: the issuer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Emisor {
    pub rfc: Option<Rfc>,
    pub nombre: Option<String>,
    /// c_RegimenFiscal.
    pub regimen_fiscal: Option<String>,
    pub fac_atr_adquirente: Option<String>,
}

impl Node for Emisor {
    const TAG: Tag = Tag::cfdi("cfdi:Emisor");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<Emisor>] = &[
            attr!(Emisor, rfc, ["Rfc", "rfc"], Required),
            attr!(Emisor, nombre, ["Nombre", "name"], RequiredSince40),
            attr!(Emisor, regimen_fiscal, ["RegimenFiscal", "tax_regime"], Required),
            attr!(Emisor, fac_atr_adquirente, ["FacAtrAdquirente", "acquirer_attribute"], Optional),
        ];
        ATTRS
    }
}

/// `cfdi:Receptor`: the recipient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Receptor {
    pub rfc: Option<Rfc>,
    pub nombre: Option<String>,
    /// Recipient's fiscal postal code.
    pub domicilio_fiscal_receptor: Option<String>,
    /// Country of tax residence for foreign recipients (c_Pais).
    pub residencia_fiscal: Option<String>,
    pub num_reg_id_trib: Option<String>,
    pub regimen_fiscal_receptor: Option<String>,
    /// c_UsoCFDI.
    pub uso_cfdi: Option<String>,
}

impl Node for Receptor {
    const TAG: Tag = Tag::cfdi("cfdi:Receptor");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<Receptor>] = &[
            attr!(Receptor, rfc, ["Rfc", "rfc"], Required),
            attr!(Receptor, nombre, ["Nombre", "name"], RequiredSince40),
            attr!(Receptor, domicilio_fiscal_receptor, ["DomicilioFiscalReceptor", "tax_postal_code"], RequiredSince40),
            attr!(Receptor, residencia_fiscal, ["ResidenciaFiscal", "tax_residence"], Optional),
            attr!(Receptor, num_reg_id_trib, ["NumRegIdTrib", "foreign_tax_id"], Optional),
            attr!(Receptor, regimen_fiscal_receptor, ["RegimenFiscalReceptor", "tax_regime"], RequiredSince40),
            attr!(Receptor, uso_cfdi, ["UsoCFDI", "cfdi_use"], Required),
        ];
        ATTRS
    }
}
