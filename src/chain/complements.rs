//! Chain contributions of the supported complements.

use super::ChainBuilder;
use crate::core::{CfdiError, Node};
use crate::nodes::*;

/// Append every complement's fields in document order. The fiscal stamp is
/// added after signing and contributes nothing.
pub(super) fn append(chain: &mut ChainBuilder, complemento: &Complemento) -> Result<(), CfdiError> {
    for node in &complemento.nodes {
        match node {
            ComplementNode::FiscalStamp(_) => {}
            ComplementNode::Payments(pagos) => payments(chain, pagos)?,
            ComplementNode::LocalTaxes(local) => local_taxes(chain, local)?,
            ComplementNode::Unknown(el) => {
                return Err(CfdiError::Chain(format!(
                    "{}: no chain rules for complement {}",
                    Complemento::TAG.name,
                    el.name
                )));
            }
        }
    }
    Ok(())
}

fn payments(chain: &mut ChainBuilder, pagos: &Pagos) -> Result<(), CfdiError> {
    chain.required(Pagos::TAG.name, "Version", pagos.version.as_ref())?;
    if let Some(t) = &pagos.totales {
        chain
            .optional(t.total_retenciones_iva.as_ref())
            .optional(t.total_retenciones_isr.as_ref())
            .optional(t.total_retenciones_ieps.as_ref())
            .optional(t.total_traslados_base_iva16.as_ref())
            .optional(t.total_traslados_impuesto_iva16.as_ref())
            .optional(t.total_traslados_base_iva8.as_ref())
            .optional(t.total_traslados_impuesto_iva8.as_ref())
            .optional(t.total_traslados_base_iva0.as_ref())
            .optional(t.total_traslados_impuesto_iva0.as_ref())
            .optional(t.total_traslados_base_iva_exento.as_ref())
            .required(Totales::TAG.name, "MontoTotalPagos", t.monto_total_pagos.as_ref())?;
    }
    for pago in &pagos.pago {
        payment(chain, pago)?;
    }
    Ok(())
}

fn payment(chain: &mut ChainBuilder, p: &Pago) -> Result<(), CfdiError> {
    let node = Pago::TAG.name;
    chain
        .required(node, "FechaPago", p.fecha_pago.as_ref())?
        .required(node, "FormaDePagoP", p.forma_de_pago_p.as_ref())?
        .required(node, "MonedaP", p.moneda_p.as_ref())?
        .optional(p.tipo_cambio_p.as_ref())
        .required(node, "Monto", p.monto.as_ref())?
        .optional(p.num_operacion.as_ref())
        .optional(p.rfc_emisor_cta_ord.as_ref())
        .optional(p.nom_banco_ord_ext.as_ref())
        .optional(p.cta_ordenante.as_ref())
        .optional(p.rfc_emisor_cta_ben.as_ref())
        .optional(p.cta_beneficiario.as_ref())
        .optional(p.tipo_cad_pago.as_ref())
        .optional(p.cert_pago.as_ref())
        .optional(p.cad_pago.as_ref())
        .optional(p.sello_pago.as_ref());

    for dr in &p.docto_relacionado {
        let node = DoctoRelacionado::TAG.name;
        chain
            .required(node, "IdDocumento", dr.id_documento.as_ref())?
            .optional(dr.serie.as_ref())
            .optional(dr.folio.as_ref())
            .required(node, "MonedaDR", dr.moneda_dr.as_ref())?
            .optional(dr.equivalencia_dr.as_ref())
            .required(node, "NumParcialidad", dr.num_parcialidad.as_ref())?
            .required(node, "ImpSaldoAnt", dr.imp_saldo_ant.as_ref())?
            .required(node, "ImpPagado", dr.imp_pagado.as_ref())?
            .required(node, "ImpSaldoInsoluto", dr.imp_saldo_insoluto.as_ref())?
            .required(node, "ObjetoImpDR", dr.objeto_imp_dr.as_ref())?;

        for r in dr.retenciones() {
            let node = RetencionDR::TAG.name;
            chain
                .required(node, "BaseDR", r.base_dr.as_ref())?
                .required(node, "ImpuestoDR", r.impuesto_dr.as_ref())?
                .required(node, "TipoFactorDR", r.tipo_factor_dr.as_ref())?
                .required(node, "TasaOCuotaDR", r.tasa_o_cuota_dr.as_ref())?
                .required(node, "ImporteDR", r.importe_dr.as_ref())?;
        }
        for t in dr.traslados() {
            let node = TrasladoDR::TAG.name;
            chain
                .required(node, "BaseDR", t.base_dr.as_ref())?
                .required(node, "ImpuestoDR", t.impuesto_dr.as_ref())?
                .required(node, "TipoFactorDR", t.tipo_factor_dr.as_ref())?
                .optional(t.tasa_o_cuota_dr.as_ref())
                .optional(t.importe_dr.as_ref());
        }
    }

    if let Some(imp) = &p.impuestos_p {
        for r in imp.retenciones() {
            let node = RetencionP::TAG.name;
            chain
                .required(node, "ImpuestoP", r.impuesto_p.as_ref())?
                .required(node, "ImporteP", r.importe_p.as_ref())?;
        }
        for t in imp.traslados() {
            let node = TrasladoP::TAG.name;
            chain
                .required(node, "BaseP", t.base_p.as_ref())?
                .required(node, "ImpuestoP", t.impuesto_p.as_ref())?
                .required(node, "TipoFactorP", t.tipo_factor_p.as_ref())?
                .optional(t.tasa_o_cuota_p.as_ref())
                .optional(t.importe_p.as_ref());
        }
    }
    Ok(())
}

fn local_taxes(chain: &mut ChainBuilder, local: &ImpuestosLocales) -> Result<(), CfdiError> {
    let node = ImpuestosLocales::TAG.name;
    chain
        .required(node, "version", local.version.as_ref())?
        .required(node, "TotaldeRetenciones", local.totalde_retenciones.as_ref())?
        .required(node, "TotaldeTraslados", local.totalde_traslados.as_ref())?;
    for r in &local.retenciones_locales {
        let node = RetencionesLocales::TAG.name;
        chain
            .required(node, "ImpLocRetenido", r.imp_loc_retenido.as_ref())?
            .required(node, "TasadeRetencion", r.tasade_retencion.as_ref())?
            .required(node, "Importe", r.importe.as_ref())?;
    }
    for t in &local.traslados_locales {
        let node = TrasladosLocales::TAG.name;
        chain
            .required(node, "ImpLocTrasladado", t.imp_loc_trasladado.as_ref())?
            .required(node, "TasadeTraslado", t.tasade_traslado.as_ref())?
            .required(node, "Importe", t.importe.as_ref())?;
    }
    Ok(())
}
