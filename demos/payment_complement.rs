use chrono::NaiveDate;
use cfdi::nodes::{DoctoRelacionado, ImpuestosDR, TrasladoDR, TrasladosDR};
use cfdi::*;
use rust_decimal_macros::dec;

fn main() {
    let fecha = NaiveDate::from_ymd_opt(2024, 7, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();

    // Second installment of a PPD invoice, taxed at 16%
    let taxed = DoctoRelacionado {
        id_documento: Some("6F6B2A8C-3C3E-4C1B-9E43-1E1E6D2A9B11".into()),
        serie: Some("A".into()),
        folio: Some("1024".into()),
        moneda_dr: Some("MXN".into()),
        equivalencia_dr: Some(dec!(1)),
        num_parcialidad: Some(2),
        imp_saldo_ant: Some(dec!(58000.00)),
        imp_pagado: Some(dec!(29000.00)),
        objeto_imp_dr: Some("02".into()),
        impuestos_dr: Some(ImpuestosDR {
            retenciones_dr: None,
            traslados_dr: Some(TrasladosDR {
                traslado_dr: vec![TrasladoDR {
                    base_dr: Some(dec!(25000.00)),
                    impuesto_dr: Some(TaxKind::Iva),
                    tipo_factor_dr: Some(FactorType::Rate),
                    tasa_o_cuota_dr: Some(dec!(0.160000)),
                    importe_dr: Some(dec!(4000.00)),
                }],
            }),
        }),
        ..Default::default()
    };

    let pago = PagoBuilder::new(fecha, "03", "MXN", dec!(29500.00))
        .operation_number("SPEI-000123")
        .add_document(taxed)
        .paid_document("0B6C9E1A-5F0D-4E2B-8C7A-3D2E1F0A9B8C", 1, dec!(500.00), dec!(500.00))
        .build()
        .expect("payment should be valid");

    let cfdi = ComprobanteBuilder::payment(fecha, "06000")
        .certificate_number("30001000000400002434")
        .issuer("AAA010101AAA", "ACME SA DE CV", "601")
        .recipient("BBB010101BBB", "CLIENTE SA DE CV", "64000", "601", "CP01")
        .add_pago(pago)
        .build()
        .expect("payment document should be valid");

    let pagos = cfdi.payments().expect("payment complement");
    for (i, p) in pagos.pago.iter().enumerate() {
        println!("Pago {}: {} {}", i + 1, p.monto.unwrap_or_default(), p.moneda_p.as_deref().unwrap_or(""));
        for dr in &p.docto_relacionado {
            println!(
                "  {} parcialidad {}: pagado {} saldo {}",
                dr.id_documento.as_deref().unwrap_or(""),
                dr.num_parcialidad.unwrap_or_default(),
                dr.imp_pagado.unwrap_or_default(),
                dr.imp_saldo_insoluto.unwrap_or_default()
            );
        }
    }
    if let Some(t) = &pagos.totales {
        println!("Base IVA 16%:     {}", t.total_traslados_base_iva16.unwrap_or_default());
        println!("IVA 16%:          {}", t.total_traslados_impuesto_iva16.unwrap_or_default());
        println!("Monto total:      {}", t.monto_total_pagos.unwrap_or_default());
    }

    println!("\n{}", cfdi.original_chain().expect("chain should build"));
    println!("\n{}", cfdi.to_xml().expect("document should serialize"));
}
