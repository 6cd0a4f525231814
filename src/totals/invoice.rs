use rust_decimal::Decimal;
use tracing::debug;

use super::{TaxGroups, TransferKey, key_part};
use crate::core::decimal::{MONEY_SCALE, RATE_SCALE, checked_add, checked_sub, round_half_up};
use crate::core::{CfdiError, DocumentType, FactorType, Node};
use crate::nodes::{
    Comprobante, ConceptoRetencion, ConceptoTraslado, Impuestos, Retencion, Retenciones, Traslado,
    Traslados,
};

/// Recompute `SubTotal`, `Descuento`, `Total` and the document-level
/// `cfdi:Impuestos` from the line items (and local taxes, if any).
///
/// Idempotent: the result depends only on the line items and the local
/// taxes complement, never on previously computed totals.
///
/// Payment documents (`TipoDeComprobante="P"`) always carry `SubTotal` and
/// `Total` of zero and no document taxes; their amounts live in the
/// payment complement.
pub fn calculate_totals(doc: &mut Comprobante) -> Result<(), CfdiError> {
    if doc.tipo_de_comprobante == Some(DocumentType::Payment) {
        let zero = Decimal::new(0, MONEY_SCALE);
        doc.sub_total = Some(zero);
        doc.descuento = None;
        doc.total = Some(zero);
        doc.impuestos = None;
        debug!("payment document, totals set to zero");
        return Ok(());
    }

    let mut subtotal = Decimal::ZERO;
    let mut discount = Decimal::ZERO;
    let mut has_discount = false;
    let mut groups = TaxGroups::default();

    for concepto in doc.concepts() {
        subtotal = checked_add(subtotal, concepto.importe.unwrap_or_default())?;
        if let Some(d) = concepto.descuento {
            discount = checked_add(discount, d)?;
            has_discount = true;
        }
        for t in concepto.traslados() {
            groups.add_transfer(transfer_key(t)?, t.base.unwrap_or_default(), t.importe.unwrap_or_default())?;
        }
        for r in concepto.retenciones() {
            let tax = key_part(r.impuesto, ConceptoRetencion::TAG.name, "Impuesto")?;
            groups.add_retention(tax, r.importe.unwrap_or_default())?;
        }
    }

    let transferred = groups.transferred_total()?;
    let retained = groups.retained_total()?;
    let (local_transferred, local_retained) = match doc.impuestos_locales() {
        Some(l) => (l.transferred_sum()?, l.retained_sum()?),
        None => (Decimal::ZERO, Decimal::ZERO),
    };

    let mut total = checked_sub(subtotal, discount)?;
    total = checked_add(total, transferred)?;
    total = checked_sub(total, retained)?;
    total = checked_add(total, local_transferred)?;
    total = checked_sub(total, local_retained)?;

    debug!(
        "aggregated {} transfer and {} retention groups, total {}",
        groups.transfers.len(),
        groups.retentions.len(),
        total
    );

    doc.sub_total = Some(round_half_up(subtotal, MONEY_SCALE));
    doc.descuento = has_discount.then(|| round_half_up(discount, MONEY_SCALE));
    doc.total = Some(round_half_up(total, MONEY_SCALE));
    doc.impuestos = build_impuestos(&groups, transferred, retained);
    Ok(())
}

fn transfer_key(t: &ConceptoTraslado) -> Result<TransferKey, CfdiError> {
    let node = ConceptoTraslado::TAG.name;
    let factor = key_part(t.tipo_factor, node, "TipoFactor")?;
    Ok(TransferKey {
        tax: key_part(t.impuesto, node, "Impuesto")?,
        factor,
        rate: if factor == FactorType::Exempt {
            None
        } else {
            t.tasa_o_cuota
        },
    })
}

/// Document taxes from the grouped entries, `None` when there are none.
fn build_impuestos(groups: &TaxGroups, transferred: Decimal, retained: Decimal) -> Option<Impuestos> {
    if groups.is_empty() {
        return None;
    }
    let traslados: Vec<Traslado> = groups
        .transfers
        .iter()
        .map(|(key, sum)| {
            let exempt = key.factor == FactorType::Exempt;
            Traslado {
                base: Some(round_half_up(sum.base, MONEY_SCALE)),
                impuesto: Some(key.tax),
                tipo_factor: Some(key.factor),
                tasa_o_cuota: key.rate.map(|r| round_half_up(r, RATE_SCALE)),
                importe: (!exempt).then(|| round_half_up(sum.amount, MONEY_SCALE)),
            }
        })
        .collect();
    let retenciones: Vec<Retencion> = groups
        .retentions
        .iter()
        .map(|(tax, amount)| Retencion {
            impuesto: Some(*tax),
            importe: Some(round_half_up(*amount, MONEY_SCALE)),
        })
        .collect();

    Some(Impuestos {
        total_impuestos_retenidos: (!retenciones.is_empty())
            .then(|| round_half_up(retained, MONEY_SCALE)),
        total_impuestos_trasladados: groups
            .has_taxable_transfers()
            .then(|| round_half_up(transferred, MONEY_SCALE)),
        retenciones: (!retenciones.is_empty()).then_some(Retenciones {
            retencion: retenciones,
        }),
        traslados: (!traslados.is_empty()).then_some(Traslados { traslado: traslados }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TaxKind;
    use crate::nodes::Concepto;
    use rust_decimal_macros::dec;

    fn item(importe: Decimal, iva: Option<Decimal>) -> Concepto {
        let mut c = Concepto {
            importe: Some(importe),
            ..Default::default()
        };
        if let Some(amount) = iva {
            c.add_traslado(ConceptoTraslado {
                base: Some(importe),
                impuesto: Some(TaxKind::Iva),
                tipo_factor: Some(FactorType::Rate),
                tasa_o_cuota: Some(dec!(0.160000)),
                importe: Some(amount),
            });
        }
        c
    }

    #[test]
    fn no_taxes_removes_document_taxes() {
        let mut doc = Comprobante::default();
        doc.add_concepto(item(dec!(100), None));
        doc.impuestos = Some(Impuestos::default());
        calculate_totals(&mut doc).unwrap();
        assert!(doc.impuestos.is_none());
        assert_eq!(doc.total, Some(dec!(100.00)));
        assert_eq!(doc.descuento, None);
    }

    #[test]
    fn exempt_only_omits_transferred_total() {
        let mut doc = Comprobante::default();
        let mut c = item(dec!(50.00), None);
        c.add_traslado(ConceptoTraslado {
            base: Some(dec!(50.00)),
            impuesto: Some(TaxKind::Iva),
            tipo_factor: Some(FactorType::Exempt),
            ..Default::default()
        });
        doc.add_concepto(c);
        calculate_totals(&mut doc).unwrap();

        let imp = doc.impuestos.unwrap();
        assert_eq!(imp.total_impuestos_trasladados, None);
        assert_eq!(imp.traslados().len(), 1);
        assert_eq!(imp.traslados()[0].importe, None);
        assert_eq!(imp.traslados()[0].tasa_o_cuota, None);
    }

    #[test]
    fn missing_tax_kind_is_reported() {
        let mut doc = Comprobante::default();
        let mut c = item(dec!(10), None);
        c.add_retencion(ConceptoRetencion {
            importe: Some(dec!(1)),
            ..Default::default()
        });
        doc.add_concepto(c);
        assert!(matches!(
            calculate_totals(&mut doc),
            Err(CfdiError::MissingAttribute { attribute: "Impuesto", .. })
        ));
    }

    #[test]
    fn payment_document_is_zeroed() {
        let mut doc = Comprobante {
            tipo_de_comprobante: Some(DocumentType::Payment),
            ..Default::default()
        };
        doc.add_concepto(item(dec!(100.00), Some(dec!(16.00))));
        calculate_totals(&mut doc).unwrap();
        assert_eq!(doc.sub_total.unwrap().to_string(), "0.00");
        assert_eq!(doc.total.unwrap().to_string(), "0.00");
        assert!(doc.impuestos.is_none());
    }

    #[test]
    fn discount_written_only_when_present() {
        let mut doc = Comprobante::default();
        let mut c = item(dec!(100.00), Some(dec!(16.00)));
        c.descuento = Some(dec!(0));
        doc.add_concepto(c);
        calculate_totals(&mut doc).unwrap();
        assert_eq!(doc.descuento, Some(dec!(0.00)));
        assert_eq!(doc.total, Some(dec!(116.00)));
    }
}
