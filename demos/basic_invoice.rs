use chrono::NaiveDate;
use cfdi::xml::WriteOptions;
use cfdi::*;
use rust_decimal_macros::dec;

fn main() {
    let fecha = NaiveDate::from_ymd_opt(2024, 6, 15)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap();

    // Income invoice to a company, paid in one transfer
    let cfdi = ComprobanteBuilder::new(fecha, "06000")
        .serie("A")
        .folio("1024")
        .payment_form("03")
        .payment_method("PUE")
        .certificate_number("30001000000400002434")
        .issuer("AAA010101AAA", "ACME SA DE CV", "601")
        .recipient("BBB010101BBB", "CLIENTE SA DE CV", "64000", "601", "G03")
        .add_concepto(
            ConceptoBuilder::new("81111500", dec!(80), "E48", "Desarrollo de software", dec!(850))
                .identification("DEV-01")
                .unit("Hora")
                .transfer(TaxKind::Iva, dec!(0.16))
                .retention(TaxKind::Isr, dec!(0.10))
                .retention(TaxKind::Iva, dec!(0.106667))
                .build()
                .expect("line item should be valid"),
        )
        .add_concepto(
            ConceptoBuilder::new("81112100", dec!(1), "E48", "Hospedaje (mensual)", dec!(1200))
                .discount(dec!(200))
                .transfer(TaxKind::Iva, dec!(0.16))
                .build()
                .expect("line item should be valid"),
        )
        .build()
        .expect("invoice should be valid");

    let c = cfdi.comprobante();
    println!("SubTotal:  {}", c.sub_total.unwrap_or_default());
    println!("Descuento: {}", c.descuento.unwrap_or_default());
    if let Some(imp) = &c.impuestos {
        for t in imp.traslados() {
            println!(
                "  Traslado {:?} {:?}: base {} importe {}",
                t.impuesto,
                t.tasa_o_cuota,
                t.base.unwrap_or_default(),
                t.importe.unwrap_or_default()
            );
        }
        for r in imp.retenciones() {
            println!("  Retención {:?}: {}", r.impuesto, r.importe.unwrap_or_default());
        }
    }
    println!("Total:     {}", c.total.unwrap_or_default());

    let chain = cfdi.original_chain().expect("chain should build");
    println!("\nCadena original:\n{chain}");

    let xml = cfdi
        .to_xml_with(&WriteOptions::pretty())
        .expect("invoice should serialize");
    println!("\n{xml}");

    // Reading it back gives the same chain
    let parsed = Cfdi::from_xml(&xml).expect("invoice should parse");
    assert_eq!(parsed.original_chain().unwrap(), chain);
}
