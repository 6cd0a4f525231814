//! `pago20:Pagos`: the payment complement, version 2.0.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::conceptos::check_factor;
use crate::core::catalog::{array_child, attr, unique_child};
use crate::core::registry::ns;
use crate::core::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagos {
    pub version: Option<String>,
    pub totales: Option<Totales>,
    pub pago: Vec<Pago>,
}

impl Node for Pagos {
    const TAG: Tag = Tag::fixed("pago20:Pagos", ns::PAGOS_20);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<Pagos>] = &[attr!(Pagos, version, ["Version", "version"], Required)];
        ATTRS
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<Pagos>] = &[
            unique_child!(Pagos, totales: Totales, ["Totales", "totals"]),
            array_child!(Pagos, pago: Pago, ["Pago", "payment"]),
        ];
        CHILDREN
    }

    fn base_attributes(&self, _version: SchemaVersion) -> Vec<(String, String)> {
        vec![
            ("xmlns:pago20".into(), ns::PAGOS_20.into()),
            ("xmlns:xsi".into(), ns::XSI.into()),
            ("xsi:schemaLocation".into(), format!("{} {}", ns::PAGOS_20, ns::PAGOS_20_XSD)),
        ]
    }
}

/// Document-level payment totals in MXN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totales {
    pub total_retenciones_iva: Option<Decimal>,
    pub total_retenciones_isr: Option<Decimal>,
    pub total_retenciones_ieps: Option<Decimal>,
    pub total_traslados_base_iva16: Option<Decimal>,
    pub total_traslados_impuesto_iva16: Option<Decimal>,
    pub total_traslados_base_iva8: Option<Decimal>,
    pub total_traslados_impuesto_iva8: Option<Decimal>,
    pub total_traslados_base_iva0: Option<Decimal>,
    pub total_traslados_impuesto_iva0: Option<Decimal>,
    pub total_traslados_base_iva_exento: Option<Decimal>,
    pub monto_total_pagos: Option<Decimal>,
}

impl Node for Totales {
    const TAG: Tag = Tag::fixed("pago20:Totales", ns::PAGOS_20);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<Totales>] = &[
            attr!(Totales, total_retenciones_iva, ["TotalRetencionesIVA", "total_retained_iva"], Optional),
            attr!(Totales, total_retenciones_isr, ["TotalRetencionesISR", "total_retained_isr"], Optional),
            attr!(Totales, total_retenciones_ieps, ["TotalRetencionesIEPS", "total_retained_ieps"], Optional),
            attr!(Totales, total_traslados_base_iva16, ["TotalTrasladosBaseIVA16", "total_base_iva16"], Optional),
            attr!(Totales, total_traslados_impuesto_iva16, ["TotalTrasladosImpuestoIVA16", "total_tax_iva16"], Optional),
            attr!(Totales, total_traslados_base_iva8, ["TotalTrasladosBaseIVA8", "total_base_iva8"], Optional),
            attr!(Totales, total_traslados_impuesto_iva8, ["TotalTrasladosImpuestoIVA8", "total_tax_iva8"], Optional),
            attr!(Totales, total_traslados_base_iva0, ["TotalTrasladosBaseIVA0", "total_base_iva0"], Optional),
            attr!(Totales, total_traslados_impuesto_iva0, ["TotalTrasladosImpuestoIVA0", "total_tax_iva0"], Optional),
            attr!(Totales, total_traslados_base_iva_exento, ["TotalTrasladosBaseIVAExento", "total_base_iva_exempt"], Optional),
            attr!(Totales, monto_total_pagos, ["MontoTotalPagos", "total_payments"], Required),
        ];
        ATTRS
    }
}

/// One payment received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pago {
    pub fecha_pago: Option<NaiveDateTime>,
    pub forma_de_pago_p: Option<String>,
    pub moneda_p: Option<String>,
    /// MXN per unit of `MonedaP`; 1 when absent.
    pub tipo_cambio_p: Option<Decimal>,
    pub monto: Option<Decimal>,
    pub num_operacion: Option<String>,
    pub rfc_emisor_cta_ord: Option<String>,
    pub nom_banco_ord_ext: Option<String>,
    pub cta_ordenante: Option<String>,
    pub rfc_emisor_cta_ben: Option<String>,
    pub cta_beneficiario: Option<String>,
    pub tipo_cad_pago: Option<String>,
    pub cert_pago: Option<String>,
    pub cad_pago: Option<String>,
    pub sello_pago: Option<String>,

    pub docto_relacionado: Vec<DoctoRelacionado>,
    pub impuestos_p: Option<ImpuestosP>,
}

impl Node for Pago {
    const TAG: Tag = Tag::fixed("pago20:Pago", ns::PAGOS_20);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<Pago>] = &[
            attr!(Pago, fecha_pago, ["FechaPago", "payment_date"], Required),
            attr!(Pago, forma_de_pago_p, ["FormaDePagoP", "payment_form"], Required),
            attr!(Pago, moneda_p, ["MonedaP", "currency"], Required),
            attr!(Pago, tipo_cambio_p, ["TipoCambioP", "exchange_rate"], Optional),
            attr!(Pago, monto, ["Monto", "amount"], Required),
            attr!(Pago, num_operacion, ["NumOperacion", "operation_number"], Optional),
            attr!(Pago, rfc_emisor_cta_ord, ["RfcEmisorCtaOrd", "payer_bank_rfc"], Optional),
            attr!(Pago, nom_banco_ord_ext, ["NomBancoOrdExt", "payer_foreign_bank"], Optional),
            attr!(Pago, cta_ordenante, ["CtaOrdenante", "payer_account"], Optional),
            attr!(Pago, rfc_emisor_cta_ben, ["RfcEmisorCtaBen", "payee_bank_rfc"], Optional),
            attr!(Pago, cta_beneficiario, ["CtaBeneficiario", "payee_account"], Optional),
            attr!(Pago, tipo_cad_pago, ["TipoCadPago", "payment_chain_type"], Optional),
            attr!(Pago, cert_pago, ["CertPago", "payment_certificate"], Optional),
            attr!(Pago, cad_pago, ["CadPago", "payment_chain"], Optional),
            attr!(Pago, sello_pago, ["SelloPago", "payment_seal"], Optional),
        ];
        ATTRS
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<Pago>] = &[
            array_child!(Pago, docto_relacionado: DoctoRelacionado, ["DoctoRelacionado", "related_document"]),
            unique_child!(Pago, impuestos_p: ImpuestosP, ["ImpuestosP", "taxes"]),
        ];
        CHILDREN
    }
}

impl Pago {
    /// Exchange rate to MXN, 1 when not declared.
    pub fn exchange_rate(&self) -> Decimal {
        self.tipo_cambio_p.unwrap_or(Decimal::ONE)
    }
}

/// Invoice settled (fully or partially) by a payment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctoRelacionado {
    pub id_documento: Option<String>,
    pub serie: Option<String>,
    pub folio: Option<String>,
    pub moneda_dr: Option<String>,
    /// Units of `MonedaDR` per unit of `MonedaP`; 1 when absent.
    pub equivalencia_dr: Option<Decimal>,
    pub num_parcialidad: Option<u32>,
    pub imp_saldo_ant: Option<Decimal>,
    pub imp_pagado: Option<Decimal>,
    pub imp_saldo_insoluto: Option<Decimal>,
    pub objeto_imp_dr: Option<String>,

    pub impuestos_dr: Option<ImpuestosDR>,
}

impl Node for DoctoRelacionado {
    const TAG: Tag = Tag::fixed("pago20:DoctoRelacionado", ns::PAGOS_20);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<DoctoRelacionado>] = &[
            attr!(DoctoRelacionado, id_documento, ["IdDocumento", "document_id"], Required),
            attr!(DoctoRelacionado, serie, ["Serie", "series"], Optional),
            attr!(DoctoRelacionado, folio, ["Folio", "folio"], Optional),
            attr!(DoctoRelacionado, moneda_dr, ["MonedaDR", "currency"], Required),
            attr!(DoctoRelacionado, equivalencia_dr, ["EquivalenciaDR", "equivalence"], Optional),
            attr!(DoctoRelacionado, num_parcialidad, ["NumParcialidad", "installment"], Required),
            attr!(DoctoRelacionado, imp_saldo_ant, ["ImpSaldoAnt", "previous_balance"], Required),
            attr!(DoctoRelacionado, imp_pagado, ["ImpPagado", "amount_paid"], Required),
            attr!(DoctoRelacionado, imp_saldo_insoluto, ["ImpSaldoInsoluto", "outstanding_balance"], Required),
            attr!(DoctoRelacionado, objeto_imp_dr, ["ObjetoImpDR", "tax_object"], Required),
        ];
        ATTRS
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<DoctoRelacionado>] =
            &[unique_child!(DoctoRelacionado, impuestos_dr: ImpuestosDR, ["ImpuestosDR", "taxes"])];
        CHILDREN
    }
}

impl DoctoRelacionado {
    pub fn equivalence(&self) -> Decimal {
        self.equivalencia_dr.unwrap_or(Decimal::ONE)
    }

    pub fn traslados(&self) -> &[TrasladoDR] {
        self.impuestos_dr
            .as_ref()
            .and_then(|i| i.traslados_dr.as_ref())
            .map(|t| t.traslado_dr.as_slice())
            .unwrap_or(&[])
    }

    pub fn retenciones(&self) -> &[RetencionDR] {
        self.impuestos_dr
            .as_ref()
            .and_then(|i| i.retenciones_dr.as_ref())
            .map(|r| r.retencion_dr.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpuestosDR {
    pub retenciones_dr: Option<RetencionesDR>,
    pub traslados_dr: Option<TrasladosDR>,
}

impl Node for ImpuestosDR {
    const TAG: Tag = Tag::fixed("pago20:ImpuestosDR", ns::PAGOS_20);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<ImpuestosDR>] = &[
            unique_child!(ImpuestosDR, retenciones_dr: RetencionesDR, ["RetencionesDR", "retentions"]),
            unique_child!(ImpuestosDR, traslados_dr: TrasladosDR, ["TrasladosDR", "transfers"]),
        ];
        CHILDREN
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetencionesDR {
    pub retencion_dr: Vec<RetencionDR>,
}

impl Node for RetencionesDR {
    const TAG: Tag = Tag::fixed("pago20:RetencionesDR", ns::PAGOS_20);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<RetencionesDR>] =
            &[array_child!(RetencionesDR, retencion_dr: RetencionDR, ["RetencionDR", "retention"])];
        CHILDREN
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetencionDR {
    pub base_dr: Option<Decimal>,
    pub impuesto_dr: Option<TaxKind>,
    pub tipo_factor_dr: Option<FactorType>,
    pub tasa_o_cuota_dr: Option<Decimal>,
    pub importe_dr: Option<Decimal>,
}

impl Node for RetencionDR {
    const TAG: Tag = Tag::fixed("pago20:RetencionDR", ns::PAGOS_20);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<RetencionDR>] = &[
            attr!(RetencionDR, base_dr, ["BaseDR", "base"], Required),
            attr!(RetencionDR, impuesto_dr, ["ImpuestoDR", "tax"], Required),
            attr!(RetencionDR, tipo_factor_dr, ["TipoFactorDR", "factor_type"], Required),
            attr!(RetencionDR, tasa_o_cuota_dr, ["TasaOCuotaDR", "rate"], Required),
            attr!(RetencionDR, importe_dr, ["ImporteDR", "amount"], Required),
        ];
        ATTRS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrasladosDR {
    pub traslado_dr: Vec<TrasladoDR>,
}

impl Node for TrasladosDR {
    const TAG: Tag = Tag::fixed("pago20:TrasladosDR", ns::PAGOS_20);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<TrasladosDR>] =
            &[array_child!(TrasladosDR, traslado_dr: TrasladoDR, ["TrasladoDR", "transfer"])];
        CHILDREN
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrasladoDR {
    pub base_dr: Option<Decimal>,
    pub impuesto_dr: Option<TaxKind>,
    pub tipo_factor_dr: Option<FactorType>,
    pub tasa_o_cuota_dr: Option<Decimal>,
    pub importe_dr: Option<Decimal>,
}

impl Node for TrasladoDR {
    const TAG: Tag = Tag::fixed("pago20:TrasladoDR", ns::PAGOS_20);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<TrasladoDR>] = &[
            attr!(TrasladoDR, base_dr, ["BaseDR", "base"], Required),
            attr!(TrasladoDR, impuesto_dr, ["ImpuestoDR", "tax"], Required),
            attr!(TrasladoDR, tipo_factor_dr, ["TipoFactorDR", "factor_type"], Required),
            attr!(TrasladoDR, tasa_o_cuota_dr, ["TasaOCuotaDR", "rate"], Optional),
            attr!(TrasladoDR, importe_dr, ["ImporteDR", "amount"], Optional),
        ];
        ATTRS
    }

    fn check(&self) -> Result<(), CfdiError> {
        check_factor(
            Self::TAG.name,
            self.tipo_factor_dr,
            self.tasa_o_cuota_dr.is_some(),
            self.importe_dr.is_some(),
            ("TasaOCuotaDR", "ImporteDR"),
        )
    }
}

/// Taxes of a payment, derived from its related documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpuestosP {
    pub retenciones_p: Option<RetencionesP>,
    pub traslados_p: Option<TrasladosP>,
}

impl Node for ImpuestosP {
    const TAG: Tag = Tag::fixed("pago20:ImpuestosP", ns::PAGOS_20);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<ImpuestosP>] = &[
            unique_child!(ImpuestosP, retenciones_p: RetencionesP, ["RetencionesP", "retentions"]),
            unique_child!(ImpuestosP, traslados_p: TrasladosP, ["TrasladosP", "transfers"]),
        ];
        CHILDREN
    }
}

impl ImpuestosP {
    pub fn traslados(&self) -> &[TrasladoP] {
        self.traslados_p
            .as_ref()
            .map(|t| t.traslado_p.as_slice())
            .unwrap_or(&[])
    }

    pub fn retenciones(&self) -> &[RetencionP] {
        self.retenciones_p
            .as_ref()
            .map(|r| r.retencion_p.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetencionesP {
    pub retencion_p: Vec<RetencionP>,
}

impl Node for RetencionesP {
    const TAG: Tag = Tag::fixed("pago20:RetencionesP", ns::PAGOS_20);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<RetencionesP>] =
            &[array_child!(RetencionesP, retencion_p: RetencionP, ["RetencionP", "retention"])];
        CHILDREN
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetencionP {
    pub impuesto_p: Option<TaxKind>,
    pub importe_p: Option<Decimal>,
}

impl Node for RetencionP {
    const TAG: Tag = Tag::fixed("pago20:RetencionP", ns::PAGOS_20);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<RetencionP>] = &[
            attr!(RetencionP, impuesto_p, ["ImpuestoP", "tax"], Required),
            attr!(RetencionP, importe_p, ["ImporteP", "amount"], Required),
        ];
        ATTRS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrasladosP {
    pub traslado_p: Vec<TrasladoP>,
}

impl Node for TrasladosP {
    const TAG: Tag = Tag::fixed("pago20:TrasladosP", ns::PAGOS_20);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<TrasladosP>] =
            &[array_child!(TrasladosP, traslado_p: TrasladoP, ["TrasladoP", "transfer"])];
        CHILDREN
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrasladoP {
    pub base_p: Option<Decimal>,
    pub impuesto_p: Option<TaxKind>,
    pub tipo_factor_p: Option<FactorType>,
    pub tasa_o_cuota_p: Option<Decimal>,
    pub importe_p: Option<Decimal>,
}

impl Node for TrasladoP {
    const TAG: Tag = Tag::fixed("pago20:TrasladoP", ns::PAGOS_20);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<TrasladoP>] = &[
            attr!(TrasladoP, base_p, ["BaseP", "base"], Required),
            attr!(TrasladoP, impuesto_p, ["ImpuestoP", "tax"], Required),
            attr!(TrasladoP, tipo_factor_p, ["TipoFactorP", "factor_type"], Required),
            attr!(TrasladoP, tasa_o_cuota_p, ["TasaOCuotaP", "rate"], Optional),
            attr!(TrasladoP, importe_p, ["ImporteP", "amount"], Optional),
        ];
        ATTRS
    }

    fn check(&self) -> Result<(), CfdiError> {
        check_factor(
            Self::TAG.name,
            self.tipo_factor_p,
            self.tasa_o_cuota_p.is_some(),
            self.importe_p.is_some(),
            ("TasaOCuotaP", "ImporteP"),
        )
    }
}
