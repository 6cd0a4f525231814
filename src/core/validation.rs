use rust_decimal::Decimal;

use super::codes;
use super::decimal::round_half_up;
use super::error::ValidationError;
use super::values::{DocumentType, FactorType};
use crate::nodes::Comprobante;

/// Check catalog-backed attributes (currency, payment form and method,
/// export, CFDI use, tax regimes, tax object) against the SAT catalogs.
/// Returns all validation errors found (not just the first).
pub fn validate_catalogs(doc: &Comprobante) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match doc.moneda.as_deref() {
        Some(code) if !codes::is_known_currency_code(code) => errors.push(ValidationError::with_rule(
            "moneda",
            format!("currency '{code}' is not in the catalog"),
            "c_Moneda",
        )),
        Some(code) if doc.tipo_de_comprobante == Some(DocumentType::Payment) && code != "XXX" => {
            errors.push(ValidationError::with_rule(
                "moneda",
                "payment documents must use currency XXX",
                "c_Moneda",
            ));
        }
        _ => {}
    }

    if let Some(code) = doc.forma_pago.as_deref().filter(|c| !codes::is_known_payment_form(c)) {
        errors.push(ValidationError::with_rule(
            "forma_pago",
            format!("payment form '{code}' is not in the catalog"),
            "c_FormaPago",
        ));
    }

    if let Some(code) = doc.metodo_pago.as_deref() {
        if !codes::is_known_payment_method(code) {
            errors.push(ValidationError::with_rule(
                "metodo_pago",
                format!("payment method '{code}' is not in the catalog"),
                "c_MetodoPago",
            ));
        } else if code == "PPD" && doc.forma_pago.as_deref().is_some_and(|f| f != "99") {
            errors.push(ValidationError::with_rule(
                "forma_pago",
                "payment method PPD requires payment form 99",
                "c_FormaPago",
            ));
        }
    }

    if let Some(code) = doc.exportacion.as_deref().filter(|c| !codes::is_known_export_code(c)) {
        errors.push(ValidationError::with_rule(
            "exportacion",
            format!("export code '{code}' is not in the catalog"),
            "c_Exportacion",
        ));
    }

    if let Some(emisor) = &doc.emisor {
        check_regime(emisor.regimen_fiscal.as_deref(), "emisor.regimen_fiscal", &mut errors);
    }
    if let Some(receptor) = &doc.receptor {
        check_regime(
            receptor.regimen_fiscal_receptor.as_deref(),
            "receptor.regimen_fiscal_receptor",
            &mut errors,
        );
        if let Some(code) = receptor.uso_cfdi.as_deref().filter(|c| !codes::is_known_cfdi_use(c)) {
            errors.push(ValidationError::with_rule(
                "receptor.uso_cfdi",
                format!("CFDI use '{code}' is not in the catalog"),
                "c_UsoCFDI",
            ));
        }
    }

    for (i, concepto) in doc.concepts().iter().enumerate() {
        if let Some(code) = concepto.objeto_imp.as_deref().filter(|c| !codes::is_known_tax_object(c)) {
            errors.push(ValidationError::with_rule(
                format!("conceptos[{i}].objeto_imp"),
                format!("tax object '{code}' is not in the catalog"),
                "c_ObjetoImp",
            ));
        }
        for (j, r) in concepto.retenciones().iter().enumerate() {
            if r.tipo_factor == Some(FactorType::Exempt) {
                errors.push(ValidationError::with_rule(
                    format!("conceptos[{i}].retenciones[{j}].tipo_factor"),
                    "retentions cannot be exempt",
                    "c_TipoFactor",
                ));
            }
        }
    }

    errors
}

/// Re-derive amounts and totals and report every mismatch with what the
/// document declares.
pub fn validate_arithmetic(doc: &Comprobante) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (i, c) in doc.concepts().iter().enumerate() {
        if let (Some(qty), Some(price), Some(amount)) = (c.cantidad, c.valor_unitario, c.importe) {
            let Some(product) = qty.checked_mul(price) else {
                errors.push(ValidationError::new(format!("conceptos[{i}].importe"), "overflow"));
                continue;
            };
            let expected = round_half_up(product, amount.scale());
            if expected != amount {
                errors.push(ValidationError::new(
                    format!("conceptos[{i}].importe"),
                    format!("amount {amount} does not match quantity {qty} x unit value {price} = {expected}"),
                ));
            }
        }
    }

    let mut expected = doc.clone();
    if let Err(e) = crate::totals::calculate_totals(&mut expected) {
        errors.push(ValidationError::new("impuestos", e.to_string()));
        return errors;
    }

    compare(&mut errors, "sub_total", doc.sub_total, expected.sub_total);
    compare(
        &mut errors,
        "descuento",
        doc.descuento.or(Some(Decimal::ZERO)),
        expected.descuento.or(Some(Decimal::ZERO)),
    );
    compare(&mut errors, "total", doc.total, expected.total);

    let declared = doc.impuestos.as_ref();
    let derived = expected.impuestos.as_ref();
    compare(
        &mut errors,
        "impuestos.total_impuestos_trasladados",
        declared.and_then(|i| i.total_impuestos_trasladados),
        derived.and_then(|i| i.total_impuestos_trasladados),
    );
    compare(
        &mut errors,
        "impuestos.total_impuestos_retenidos",
        declared.and_then(|i| i.total_impuestos_retenidos),
        derived.and_then(|i| i.total_impuestos_retenidos),
    );

    errors
}

fn check_regime(code: Option<&str>, field: &str, errors: &mut Vec<ValidationError>) {
    if let Some(code) = code.filter(|c| !codes::is_known_tax_regime(c)) {
        errors.push(ValidationError::with_rule(
            field,
            format!("tax regime '{code}' is not in the catalog"),
            "c_RegimenFiscal",
        ));
    }
}

fn compare(
    errors: &mut Vec<ValidationError>,
    field: &str,
    declared: Option<Decimal>,
    expected: Option<Decimal>,
) {
    if declared != expected {
        let show = |v: Option<Decimal>| v.map_or_else(|| "absent".to_string(), |d| d.to_string());
        errors.push(ValidationError::new(
            field,
            format!("declared {} but line items give {}", show(declared), show(expected)),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Concepto, Receptor};
    use rust_decimal_macros::dec;

    #[test]
    fn unknown_codes_are_all_reported() {
        let doc = Comprobante {
            moneda: Some("ZZZ".into()),
            forma_pago: Some("07".into()),
            metodo_pago: Some("PUE".into()),
            receptor: Some(Receptor {
                uso_cfdi: Some("X01".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let errors = validate_catalogs(&doc);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["moneda", "forma_pago", "receptor.uso_cfdi"]);
    }

    #[test]
    fn export_and_tax_object_are_checked() {
        let mut doc = Comprobante {
            moneda: Some("MXN".into()),
            exportacion: Some("09".into()),
            ..Default::default()
        };
        doc.add_concepto(Concepto {
            objeto_imp: Some("02".into()),
            ..Default::default()
        });
        doc.add_concepto(Concepto {
            objeto_imp: Some("99".into()),
            ..Default::default()
        });
        let rules: Vec<_> = validate_catalogs(&doc)
            .into_iter()
            .map(|e| (e.field, e.rule))
            .collect();
        assert_eq!(
            rules,
            [
                ("exportacion".to_string(), Some("c_Exportacion".to_string())),
                ("conceptos[1].objeto_imp".to_string(), Some("c_ObjetoImp".to_string())),
            ]
        );
    }

    #[test]
    fn ppd_requires_form_99() {
        let doc = Comprobante {
            moneda: Some("MXN".into()),
            forma_pago: Some("03".into()),
            metodo_pago: Some("PPD".into()),
            ..Default::default()
        };
        let errors = validate_catalogs(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "forma_pago");
    }

    #[test]
    fn arithmetic_mismatches() {
        let mut doc = Comprobante {
            sub_total: Some(dec!(100.00)),
            total: Some(dec!(100.00)),
            ..Default::default()
        };
        doc.add_concepto(Concepto {
            cantidad: Some(dec!(2)),
            valor_unitario: Some(dec!(50.00)),
            importe: Some(dec!(99.00)),
            ..Default::default()
        });
        let fields: Vec<_> = validate_arithmetic(&doc)
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, ["conceptos[0].importe", "sub_total", "total"]);
    }
}
