//! Document-level tax aggregation.

use chrono::{NaiveDate, NaiveDateTime};
use cfdi::nodes::*;
use cfdi::totals::calculate_totals;
use cfdi::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn fecha() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn build(items: Vec<Concepto>) -> Comprobante {
    let mut builder = ComprobanteBuilder::new(fecha(), "06000")
        .issuer("AAA010101AAA", "ACME SA DE CV", "601")
        .recipient("BBB010101BBB", "CLIENTE SA DE CV", "64000", "601", "G03");
    for item in items {
        builder = builder.add_concepto(item);
    }
    builder.build_unchecked().unwrap().into_comprobante()
}

fn service(amount: Decimal) -> ConceptoBuilder {
    ConceptoBuilder::new("84111506", dec!(1), "E48", "Servicio", amount)
}

#[test]
fn same_rate_lines_share_one_group() {
    let doc = build(vec![
        service(dec!(100)).transfer(TaxKind::Iva, dec!(0.16)).build().unwrap(),
        service(dec!(50)).transfer(TaxKind::Iva, dec!(0.16)).build().unwrap(),
    ]);
    let imp = doc.impuestos.as_ref().unwrap();
    assert_eq!(imp.traslados().len(), 1);
    let t = &imp.traslados()[0];
    assert_eq!(t.base, Some(dec!(150.00)));
    assert_eq!(t.tasa_o_cuota.unwrap().to_string(), "0.160000");
    assert_eq!(t.importe, Some(dec!(24.00)));
    assert_eq!(imp.total_impuestos_trasladados, Some(dec!(24.00)));
    assert_eq!(doc.sub_total, Some(dec!(150.00)));
    assert_eq!(doc.total, Some(dec!(174.00)));
}

#[test]
fn different_rates_keep_first_seen_order() {
    let doc = build(vec![
        service(dec!(200)).transfer(TaxKind::Iva, dec!(0.08)).build().unwrap(),
        service(dec!(100)).transfer(TaxKind::Iva, dec!(0.16)).build().unwrap(),
        service(dec!(100)).transfer(TaxKind::Iva, dec!(0.08)).build().unwrap(),
    ]);
    let traslados = doc.impuestos.as_ref().unwrap().traslados();
    let groups: Vec<_> = traslados.iter().map(|t| (t.tasa_o_cuota, t.base, t.importe)).collect();
    assert_eq!(
        groups,
        vec![
            (Some(dec!(0.08)), Some(dec!(300.00)), Some(dec!(24.00))),
            (Some(dec!(0.16)), Some(dec!(100.00)), Some(dec!(16.00))),
        ]
    );
    assert_eq!(doc.total, Some(dec!(440.00)));
}

#[test]
fn retentions_reduce_the_total() {
    let doc = build(vec![
        service(dec!(100))
            .transfer(TaxKind::Iva, dec!(0.16))
            .retention(TaxKind::Isr, dec!(0.10))
            .retention(TaxKind::Iva, dec!(0.106667))
            .build()
            .unwrap(),
    ]);
    let imp = doc.impuestos.as_ref().unwrap();
    let retenciones: Vec<_> = imp.retenciones().iter().map(|r| (r.impuesto, r.importe)).collect();
    assert_eq!(
        retenciones,
        vec![
            (Some(TaxKind::Isr), Some(dec!(10.00))),
            (Some(TaxKind::Iva), Some(dec!(10.67))),
        ]
    );
    assert_eq!(imp.total_impuestos_retenidos, Some(dec!(20.67)));
    assert_eq!(doc.total, Some(dec!(95.33)));
}

#[test]
fn exempt_group_has_no_amount() {
    let doc = build(vec![
        service(dec!(100)).transfer(TaxKind::Iva, dec!(0.16)).build().unwrap(),
        service(dec!(40)).exempt(TaxKind::Iva).build().unwrap(),
    ]);
    let imp = doc.impuestos.as_ref().unwrap();
    assert_eq!(imp.traslados().len(), 2);
    let exempt = &imp.traslados()[1];
    assert_eq!(exempt.tipo_factor, Some(FactorType::Exempt));
    assert_eq!(exempt.base, Some(dec!(40.00)));
    assert_eq!(exempt.tasa_o_cuota, None);
    assert_eq!(exempt.importe, None);
    assert_eq!(imp.total_impuestos_trasladados, Some(dec!(16.00)));
    assert_eq!(doc.total, Some(dec!(156.00)));
}

#[test]
fn zero_rate_group_is_kept() {
    let doc = build(vec![service(dec!(80)).transfer(TaxKind::Iva, dec!(0)).build().unwrap()]);
    let imp = doc.impuestos.as_ref().unwrap();
    assert_eq!(imp.traslados()[0].importe, Some(dec!(0.00)));
    assert_eq!(imp.total_impuestos_trasladados, Some(dec!(0.00)));
    assert_eq!(doc.total, Some(dec!(80.00)));
}

#[test]
fn discounts_lower_base_and_total() {
    let doc = build(vec![
        service(dec!(100))
            .discount(dec!(10))
            .transfer(TaxKind::Iva, dec!(0.16))
            .build()
            .unwrap(),
    ]);
    assert_eq!(doc.sub_total, Some(dec!(100.00)));
    assert_eq!(doc.descuento, Some(dec!(10.00)));
    assert_eq!(doc.impuestos.as_ref().unwrap().traslados()[0].base, Some(dec!(90.00)));
    assert_eq!(doc.total, Some(dec!(104.40)));
}

#[test]
fn sums_are_rounded_once() {
    // Three lines of 0.335 IVA each: rounding the sum gives 1.01, rounding
    // each line first would give 1.02.
    let mut doc = Comprobante::default();
    for _ in 0..3 {
        let mut c = Concepto {
            importe: Some(dec!(2.09)),
            ..Default::default()
        };
        c.add_traslado(ConceptoTraslado {
            base: Some(dec!(2.09)),
            impuesto: Some(TaxKind::Iva),
            tipo_factor: Some(FactorType::Rate),
            tasa_o_cuota: Some(dec!(0.160287)),
            importe: Some(dec!(0.335)),
        });
        doc.add_concepto(c);
    }
    calculate_totals(&mut doc).unwrap();
    let imp = doc.impuestos.unwrap();
    assert_eq!(imp.traslados()[0].importe, Some(dec!(1.01)));
    assert_eq!(imp.total_impuestos_trasladados, Some(dec!(1.01)));
    assert_eq!(doc.sub_total, Some(dec!(6.27)));
}

#[test]
fn recalculation_is_idempotent() {
    let mut doc = build(vec![
        service(dec!(33.33)).transfer(TaxKind::Iva, dec!(0.16)).build().unwrap(),
        service(dec!(66.67)).transfer(TaxKind::Ieps, dec!(0.08)).build().unwrap(),
    ]);
    let first = doc.clone();
    calculate_totals(&mut doc).unwrap();
    calculate_totals(&mut doc).unwrap();
    assert_eq!(doc, first);
}

#[test]
fn stale_totals_are_replaced() {
    let mut doc = build(vec![service(dec!(10)).transfer(TaxKind::Iva, dec!(0.16)).build().unwrap()]);
    doc.total = Some(dec!(999));
    doc.impuestos.as_mut().unwrap().total_impuestos_trasladados = Some(dec!(1));
    calculate_totals(&mut doc).unwrap();
    assert_eq!(doc.total, Some(dec!(11.60)));
    assert_eq!(doc.impuestos.unwrap().total_impuestos_trasladados, Some(dec!(1.60)));
}

#[test]
fn local_taxes_enter_the_total() {
    let mut doc = build(vec![service(dec!(100)).transfer(TaxKind::Iva, dec!(0.16)).build().unwrap()]);
    let mut complemento = Complemento::default();
    complemento
        .add(ComplementNode::LocalTaxes(ImpuestosLocales {
            version: Some("1.0".into()),
            totalde_retenciones: Some(dec!(1.00)),
            totalde_traslados: Some(dec!(3.00)),
            retenciones_locales: vec![RetencionesLocales {
                imp_loc_retenido: Some("Cedular".into()),
                tasade_retencion: Some(dec!(1.00)),
                importe: Some(dec!(1.00)),
            }],
            traslados_locales: vec![TrasladosLocales {
                imp_loc_trasladado: Some("ISH".into()),
                tasade_traslado: Some(dec!(3.00)),
                importe: Some(dec!(3.00)),
            }],
        }))
        .unwrap();
    doc.complemento = Some(complemento);
    calculate_totals(&mut doc).unwrap();
    assert_eq!(doc.total, Some(dec!(118.00)));
    // Local taxes stay out of the federal tax node.
    assert_eq!(doc.impuestos.unwrap().total_impuestos_trasladados, Some(dec!(16.00)));
}

#[test]
fn untaxed_document_has_no_tax_node() {
    let doc = build(vec![service(dec!(100)).tax_object("01").build().unwrap()]);
    assert!(doc.impuestos.is_none());
    assert_eq!(doc.total, Some(dec!(100.00)));
}

#[cfg(feature = "xml")]
#[test]
fn parsed_invoice_recalculates_to_itself() {
    let cfdi = Cfdi::from_xml(include_str!("fixtures/invoice_40.xml")).unwrap();
    let mut again = cfdi.clone();
    again.calculate_totals().unwrap();
    assert_eq!(again.comprobante(), cfdi.comprobante());
}
