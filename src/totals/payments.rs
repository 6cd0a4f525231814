use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::{TaxGroups, TransferKey, key_part};
use crate::core::decimal::{
    MONEY_SCALE, RATE_SCALE, checked_add, checked_div, checked_mul, round_half_up,
};
use crate::core::{CfdiError, FactorType, Node, TaxKind};
use crate::nodes::{
    DoctoRelacionado, ImpuestosP, Pago, Pagos, RetencionDR, RetencionP, RetencionesP, Totales,
    TrasladoDR, TrasladoP, TrasladosP,
};

/// Recompute every `pago20:ImpuestosP` from its related documents, then
/// `pago20:Totales` from the payments.
///
/// Related-document taxes are expressed in the document currency and are
/// converted to the payment currency by dividing by `EquivalenciaDR`.
/// Totals are in MXN: each payment's figures are multiplied by its own
/// `TipoCambioP` and rounded before being summed across payments.
pub fn calculate_payment_totals(pagos: &mut Pagos) -> Result<(), CfdiError> {
    for pago in &mut pagos.pago {
        let groups = payment_groups(&pago.docto_relacionado)?;
        pago.impuestos_p = build_impuestos_p(&groups);
    }
    pagos.totales = Some(build_totales(&pagos.pago)?);
    debug!("aggregated totals of {} payments", pagos.pago.len());
    Ok(())
}

fn payment_groups(documents: &[DoctoRelacionado]) -> Result<TaxGroups, CfdiError> {
    let mut groups = TaxGroups::default();
    for dr in documents {
        let equivalence = dr.equivalence();
        for t in dr.traslados() {
            let node = TrasladoDR::TAG.name;
            let factor = key_part(t.tipo_factor_dr, node, "TipoFactorDR")?;
            let key = TransferKey {
                tax: key_part(t.impuesto_dr, node, "ImpuestoDR")?,
                factor,
                rate: if factor == FactorType::Exempt {
                    None
                } else {
                    t.tasa_o_cuota_dr
                },
            };
            groups.add_transfer(
                key,
                checked_div(t.base_dr.unwrap_or_default(), equivalence)?,
                checked_div(t.importe_dr.unwrap_or_default(), equivalence)?,
            )?;
        }
        for r in dr.retenciones() {
            let tax = key_part(r.impuesto_dr, RetencionDR::TAG.name, "ImpuestoDR")?;
            groups.add_retention(tax, checked_div(r.importe_dr.unwrap_or_default(), equivalence)?)?;
        }
    }
    Ok(groups)
}

fn build_impuestos_p(groups: &TaxGroups) -> Option<ImpuestosP> {
    if groups.is_empty() {
        return None;
    }
    let traslados: Vec<TrasladoP> = groups
        .transfers
        .iter()
        .map(|(key, sum)| TrasladoP {
            base_p: Some(round_half_up(sum.base, MONEY_SCALE)),
            impuesto_p: Some(key.tax),
            tipo_factor_p: Some(key.factor),
            tasa_o_cuota_p: key.rate.map(|r| round_half_up(r, RATE_SCALE)),
            importe_p: (key.factor != FactorType::Exempt)
                .then(|| round_half_up(sum.amount, MONEY_SCALE)),
        })
        .collect();
    let retenciones: Vec<RetencionP> = groups
        .retentions
        .iter()
        .map(|(tax, amount)| RetencionP {
            impuesto_p: Some(*tax),
            importe_p: Some(round_half_up(*amount, MONEY_SCALE)),
        })
        .collect();
    Some(ImpuestosP {
        retenciones_p: (!retenciones.is_empty()).then_some(RetencionesP {
            retencion_p: retenciones,
        }),
        traslados_p: (!traslados.is_empty()).then_some(TrasladosP {
            traslado_p: traslados,
        }),
    })
}

/// IVA bucket of a payment transfer, if it falls in one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IvaBucket {
    Rate16,
    Rate8,
    Rate0,
    Exempt,
}

fn iva_bucket(t: &TrasladoP) -> Option<IvaBucket> {
    if t.impuesto_p != Some(TaxKind::Iva) {
        return None;
    }
    match (t.tipo_factor_p?, t.tasa_o_cuota_p) {
        (FactorType::Exempt, _) => Some(IvaBucket::Exempt),
        (FactorType::Rate, Some(rate)) if rate == dec!(0.16) => Some(IvaBucket::Rate16),
        (FactorType::Rate, Some(rate)) if rate == dec!(0.08) => Some(IvaBucket::Rate8),
        (FactorType::Rate, Some(rate)) if rate.is_zero() => Some(IvaBucket::Rate0),
        _ => None,
    }
}

/// Adds `value × rate`, rounded to cents, into an optional total.
fn accumulate(total: &mut Option<Decimal>, value: Decimal, rate: Decimal) -> Result<(), CfdiError> {
    let converted = round_half_up(checked_mul(value, rate)?, MONEY_SCALE);
    *total = Some(checked_add(total.unwrap_or(Decimal::ZERO), converted)?);
    Ok(())
}

fn build_totales(payments: &[Pago]) -> Result<Totales, CfdiError> {
    let mut totales = Totales::default();
    let mut monto_total = Decimal::ZERO;

    for pago in payments {
        let rate = pago.exchange_rate();
        monto_total = checked_add(
            monto_total,
            round_half_up(checked_mul(pago.monto.unwrap_or_default(), rate)?, MONEY_SCALE),
        )?;
        let Some(imp) = &pago.impuestos_p else {
            continue;
        };

        for r in imp.retenciones() {
            let amount = r.importe_p.unwrap_or_default();
            match r.impuesto_p {
                Some(TaxKind::Isr) => accumulate(&mut totales.total_retenciones_isr, amount, rate)?,
                Some(TaxKind::Iva) => accumulate(&mut totales.total_retenciones_iva, amount, rate)?,
                Some(TaxKind::Ieps) => accumulate(&mut totales.total_retenciones_ieps, amount, rate)?,
                None => {}
            }
        }
        for t in imp.traslados() {
            let base = t.base_p.unwrap_or_default();
            let amount = t.importe_p.unwrap_or_default();
            match iva_bucket(t) {
                Some(IvaBucket::Rate16) => {
                    accumulate(&mut totales.total_traslados_base_iva16, base, rate)?;
                    accumulate(&mut totales.total_traslados_impuesto_iva16, amount, rate)?;
                }
                Some(IvaBucket::Rate8) => {
                    accumulate(&mut totales.total_traslados_base_iva8, base, rate)?;
                    accumulate(&mut totales.total_traslados_impuesto_iva8, amount, rate)?;
                }
                Some(IvaBucket::Rate0) => {
                    accumulate(&mut totales.total_traslados_base_iva0, base, rate)?;
                    accumulate(&mut totales.total_traslados_impuesto_iva0, amount, rate)?;
                }
                Some(IvaBucket::Exempt) => {
                    accumulate(&mut totales.total_traslados_base_iva_exento, base, rate)?;
                }
                None => {}
            }
        }
    }

    totales.monto_total_pagos = Some(round_half_up(monto_total, MONEY_SCALE));
    Ok(totales)
}
