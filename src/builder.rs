use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::core::decimal::{MONEY_SCALE, RATE_SCALE, checked_add, checked_div, checked_mul, checked_sub, round_half_up};
use crate::core::{CfdiError, DocumentType, FactorType, Rfc, SchemaVersion, TaxKind, validate_catalogs};
use crate::document::Cfdi;
use crate::nodes::{
    CfdiRelacionado, CfdiRelacionados, Complemento, ComplementNode, Comprobante, Concepto,
    ConceptoRetencion, ConceptoTraslado, DoctoRelacionado, Emisor, InformacionGlobal, Pago, Pagos,
    Receptor,
};

/// Product/service key the SAT mandates for the single item of a payment
/// document.
const PAYMENT_ITEM_KEY: &str = "84111506";

/// Builder for issuing a CFDI.
///
/// ```
/// use cfdi::{ComprobanteBuilder, ConceptoBuilder, TaxKind};
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let fecha = NaiveDate::from_ymd_opt(2024, 1, 15)
///     .unwrap()
///     .and_hms_opt(10, 30, 0)
///     .unwrap();
/// let cfdi = ComprobanteBuilder::new(fecha, "06000")
///     .payment_form("03")
///     .payment_method("PUE")
///     .issuer("AAA010101AAA", "ACME SA DE CV", "601")
///     .recipient("XAXX010101000", "PUBLICO EN GENERAL", "06000", "616", "S01")
///     .add_concepto(
///         ConceptoBuilder::new("84111506", dec!(1), "E48", "Consultoría", dec!(100.00))
///             .transfer(TaxKind::Iva, dec!(0.16))
///             .build()
///             .unwrap(),
///     )
///     .build()
///     .unwrap();
/// assert_eq!(cfdi.comprobante().total, Some(dec!(116.00)));
/// ```
pub struct ComprobanteBuilder {
    version: SchemaVersion,
    fecha: NaiveDateTime,
    lugar_expedicion: String,
    document_type: DocumentType,
    currency: String,
    exchange_rate: Option<Decimal>,
    export: String,
    serie: Option<String>,
    folio: Option<String>,
    payment_form: Option<String>,
    payment_method: Option<String>,
    payment_conditions: Option<String>,
    certificate_number: Option<String>,
    global_information: Option<InformacionGlobal>,
    related: Vec<CfdiRelacionados>,
    issuer: Option<(String, String, String)>,
    recipient: Option<(String, String, String, String, String)>,
    conceptos: Vec<Concepto>,
    pagos: Vec<Pago>,
    complements: Vec<ComplementNode>,
}

impl ComprobanteBuilder {
    /// Income (`I`) document in MXN, version 4.0, not an export.
    pub fn new(fecha: NaiveDateTime, lugar_expedicion: impl Into<String>) -> Self {
        Self {
            version: SchemaVersion::V40,
            fecha,
            lugar_expedicion: lugar_expedicion.into(),
            document_type: DocumentType::Income,
            currency: "MXN".to_string(),
            exchange_rate: None,
            export: "01".to_string(),
            serie: None,
            folio: None,
            payment_form: None,
            payment_method: None,
            payment_conditions: None,
            certificate_number: None,
            global_information: None,
            related: Vec::new(),
            issuer: None,
            recipient: None,
            conceptos: Vec::new(),
            pagos: Vec::new(),
            complements: Vec::new(),
        }
    }

    /// Payment (`P`) document: currency `XXX` and the one zero-value item
    /// the SAT requires. Add payments with [`ComprobanteBuilder::add_pago`].
    pub fn payment(fecha: NaiveDateTime, lugar_expedicion: impl Into<String>) -> Self {
        let item = Concepto {
            clave_prod_serv: Some(PAYMENT_ITEM_KEY.to_string()),
            cantidad: Some(Decimal::ONE),
            clave_unidad: Some("ACT".to_string()),
            descripcion: Some("Pago".to_string()),
            valor_unitario: Some(Decimal::ZERO),
            importe: Some(Decimal::ZERO),
            objeto_imp: Some("01".to_string()),
            ..Default::default()
        };
        Self::new(fecha, lugar_expedicion)
            .document_type(DocumentType::Payment)
            .currency("XXX")
            .add_concepto(item)
    }

    pub fn version(mut self, version: SchemaVersion) -> Self {
        self.version = version;
        self
    }

    pub fn document_type(mut self, document_type: DocumentType) -> Self {
        self.document_type = document_type;
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency = code.into();
        self
    }

    pub fn exchange_rate(mut self, rate: Decimal) -> Self {
        self.exchange_rate = Some(rate);
        self
    }

    /// c_Exportacion; written for 4.0 documents only.
    pub fn export(mut self, code: impl Into<String>) -> Self {
        self.export = code.into();
        self
    }

    pub fn serie(mut self, serie: impl Into<String>) -> Self {
        self.serie = Some(serie.into());
        self
    }

    pub fn folio(mut self, folio: impl Into<String>) -> Self {
        self.folio = Some(folio.into());
        self
    }

    pub fn payment_form(mut self, code: impl Into<String>) -> Self {
        self.payment_form = Some(code.into());
        self
    }

    pub fn payment_method(mut self, code: impl Into<String>) -> Self {
        self.payment_method = Some(code.into());
        self
    }

    pub fn payment_conditions(mut self, conditions: impl Into<String>) -> Self {
        self.payment_conditions = Some(conditions.into());
        self
    }

    /// Serial of the issuer's signing certificate (`NoCertificado`), part
    /// of the original chain.
    pub fn certificate_number(mut self, serial: impl Into<String>) -> Self {
        self.certificate_number = Some(serial.into());
        self
    }

    /// Period covered by a global invoice to the general public.
    pub fn global_information(
        mut self,
        periodicity: impl Into<String>,
        months: impl Into<String>,
        year: u16,
    ) -> Self {
        self.global_information = Some(InformacionGlobal {
            periodicidad: Some(periodicity.into()),
            meses: Some(months.into()),
            anio: Some(year),
        });
        self
    }

    /// Link previously issued documents under one relation type.
    pub fn related<I, S>(mut self, relation_type: impl Into<String>, uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related.push(CfdiRelacionados {
            tipo_relacion: Some(relation_type.into()),
            cfdi_relacionado: uuids
                .into_iter()
                .map(|u| CfdiRelacionado {
                    uuid: Some(u.into()),
                })
                .collect(),
        });
        self
    }

    pub fn issuer(
        mut self,
        rfc: impl Into<String>,
        name: impl Into<String>,
        tax_regime: impl Into<String>,
    ) -> Self {
        self.issuer = Some((rfc.into(), name.into(), tax_regime.into()));
        self
    }

    pub fn recipient(
        mut self,
        rfc: impl Into<String>,
        name: impl Into<String>,
        tax_postal_code: impl Into<String>,
        tax_regime: impl Into<String>,
        cfdi_use: impl Into<String>,
    ) -> Self {
        self.recipient = Some((
            rfc.into(),
            name.into(),
            tax_postal_code.into(),
            tax_regime.into(),
            cfdi_use.into(),
        ));
        self
    }

    pub fn add_concepto(mut self, concepto: Concepto) -> Self {
        self.conceptos.push(concepto);
        self
    }

    /// Append a payment to the `pago20:Pagos` complement, created on build.
    pub fn add_pago(mut self, pago: Pago) -> Self {
        self.pagos.push(pago);
        self
    }

    /// Attach another complement (local taxes, or an extension kept as read).
    pub fn add_complement(mut self, node: ComplementNode) -> Self {
        self.complements.push(node);
        self
    }

    /// Assemble the document, compute its totals and check it against the
    /// SAT catalogs. Returns all catalog errors (not just the first).
    pub fn build(self) -> Result<Cfdi, CfdiError> {
        let cfdi = self.build_unchecked()?;
        // Presence of every required attribute across the tree.
        cfdi.to_element()?;

        let errors = validate_catalogs(cfdi.comprobante());
        if !errors.is_empty() {
            let msg = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CfdiError::Validation(msg));
        }
        Ok(cfdi)
    }

    /// Assemble and compute totals without presence or catalog checks.
    pub fn build_unchecked(self) -> Result<Cfdi, CfdiError> {
        let (rfc, nombre, regimen) = self
            .issuer
            .ok_or_else(|| CfdiError::Builder("issuer is required".into()))?;
        let (r_rfc, r_nombre, r_cp, r_regimen, r_uso) = self
            .recipient
            .ok_or_else(|| CfdiError::Builder("recipient is required".into()))?;

        if self.conceptos.is_empty() {
            return Err(CfdiError::Builder(
                "at least one line item is required".into(),
            ));
        }
        if self.conceptos.len() > 10_000 {
            return Err(CfdiError::Builder(
                "document cannot have more than 10,000 line items".into(),
            ));
        }
        if self.document_type == DocumentType::Payment && self.pagos.is_empty() {
            return Err(CfdiError::Builder(
                "payment documents require at least one payment".into(),
            ));
        }

        let v40 = self.version == SchemaVersion::V40;
        let mut comprobante = Comprobante {
            version: Some(self.version.code().to_string()),
            serie: self.serie,
            folio: self.folio,
            fecha: Some(self.fecha),
            forma_pago: self.payment_form,
            no_certificado: self.certificate_number,
            condiciones_de_pago: self.payment_conditions,
            moneda: Some(self.currency),
            tipo_cambio: self.exchange_rate,
            tipo_de_comprobante: Some(self.document_type),
            exportacion: v40.then_some(self.export),
            metodo_pago: self.payment_method,
            lugar_expedicion: Some(self.lugar_expedicion),
            informacion_global: self.global_information.filter(|_| v40),
            cfdi_relacionados: self.related,
            ..Default::default()
        };

        comprobante.set_emisor(Emisor {
            rfc: Some(parse_rfc("issuer", rfc)?),
            nombre: Some(nombre),
            regimen_fiscal: Some(regimen),
            fac_atr_adquirente: None,
        })?;
        comprobante.set_receptor(Receptor {
            rfc: Some(parse_rfc("recipient", r_rfc)?),
            nombre: Some(r_nombre),
            domicilio_fiscal_receptor: v40.then_some(r_cp),
            residencia_fiscal: None,
            num_reg_id_trib: None,
            regimen_fiscal_receptor: v40.then_some(r_regimen),
            uso_cfdi: Some(r_uso),
        })?;
        for concepto in self.conceptos {
            comprobante.add_concepto(concepto);
        }

        let mut complemento = Complemento::default();
        if !self.pagos.is_empty() {
            complemento.add(ComplementNode::Payments(Pagos {
                version: Some("2.0".to_string()),
                totales: None,
                pago: self.pagos,
            }))?;
        }
        for node in self.complements {
            complemento.add(node)?;
        }
        if !complemento.nodes.is_empty() {
            comprobante.complemento = Some(complemento);
        }

        let mut cfdi = Cfdi::new(comprobante);
        cfdi.calculate_totals()?;
        Ok(cfdi)
    }
}

fn parse_rfc(party: &str, rfc: String) -> Result<Rfc, CfdiError> {
    Rfc::new(rfc).map_err(|reason| CfdiError::Builder(format!("{party} RFC: {reason}")))
}

enum PendingTax {
    Transfer {
        tax: TaxKind,
        factor: FactorType,
        rate: Option<Decimal>,
    },
    Retention {
        tax: TaxKind,
        rate: Decimal,
    },
}

/// Builder for a line item.
///
/// `Importe` is `Cantidad × ValorUnitario` rounded to cents. Taxes added
/// with [`ConceptoBuilder::transfer`] and friends use the amount net of
/// discount as their base and `base × rate` as their amount.
pub struct ConceptoBuilder {
    clave_prod_serv: String,
    quantity: Decimal,
    unit_key: String,
    description: String,
    unit_value: Decimal,
    identification: Option<String>,
    unit: Option<String>,
    discount: Option<Decimal>,
    tax_object: String,
    taxes: Vec<PendingTax>,
    traslados: Vec<ConceptoTraslado>,
    retenciones: Vec<ConceptoRetencion>,
}

impl ConceptoBuilder {
    pub fn new(
        clave_prod_serv: impl Into<String>,
        quantity: Decimal,
        unit_key: impl Into<String>,
        description: impl Into<String>,
        unit_value: Decimal,
    ) -> Self {
        Self {
            clave_prod_serv: clave_prod_serv.into(),
            quantity,
            unit_key: unit_key.into(),
            description: description.into(),
            unit_value,
            identification: None,
            unit: None,
            discount: None,
            tax_object: "02".to_string(),
            taxes: Vec::new(),
            traslados: Vec::new(),
            retenciones: Vec::new(),
        }
    }

    pub fn identification(mut self, id: impl Into<String>) -> Self {
        self.identification = Some(id.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn discount(mut self, amount: Decimal) -> Self {
        self.discount = Some(amount);
        self
    }

    /// c_ObjetoImp, `02` (subject to tax) unless set.
    pub fn tax_object(mut self, code: impl Into<String>) -> Self {
        self.tax_object = code.into();
        self
    }

    /// Transferred tax at a percentage rate (`Tasa`), e.g. `0.16`.
    pub fn transfer(mut self, tax: TaxKind, rate: Decimal) -> Self {
        self.taxes.push(PendingTax::Transfer {
            tax,
            factor: FactorType::Rate,
            rate: Some(rate),
        });
        self
    }

    /// Transferred tax as a fixed fee (`Cuota`).
    pub fn transfer_fee(mut self, tax: TaxKind, fee: Decimal) -> Self {
        self.taxes.push(PendingTax::Transfer {
            tax,
            factor: FactorType::Fee,
            rate: Some(fee),
        });
        self
    }

    /// Exempt transfer: base only, no rate and no amount.
    pub fn exempt(mut self, tax: TaxKind) -> Self {
        self.taxes.push(PendingTax::Transfer {
            tax,
            factor: FactorType::Exempt,
            rate: None,
        });
        self
    }

    /// Retained tax at a percentage rate.
    pub fn retention(mut self, tax: TaxKind, rate: Decimal) -> Self {
        self.taxes.push(PendingTax::Retention { tax, rate });
        self
    }

    /// Add a fully specified transfer, taken as given.
    pub fn add_traslado(mut self, traslado: ConceptoTraslado) -> Self {
        self.traslados.push(traslado);
        self
    }

    /// Add a fully specified retention, taken as given.
    pub fn add_retencion(mut self, retencion: ConceptoRetencion) -> Self {
        self.retenciones.push(retencion);
        self
    }

    pub fn build(self) -> Result<Concepto, CfdiError> {
        if self.description.trim().is_empty() {
            return Err(CfdiError::Builder("line item description is required".into()));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(CfdiError::Builder(format!(
                "line item quantity must be positive, got {}",
                self.quantity
            )));
        }

        let importe = round_half_up(checked_mul(self.quantity, self.unit_value)?, MONEY_SCALE);
        let discount = self.discount.map(|d| round_half_up(d, MONEY_SCALE));
        let base = checked_sub(importe, discount.unwrap_or_default())?;
        if base < Decimal::ZERO {
            return Err(CfdiError::Builder(format!(
                "discount {} exceeds line amount {importe}",
                discount.unwrap_or_default()
            )));
        }

        let mut concepto = Concepto {
            clave_prod_serv: Some(self.clave_prod_serv),
            no_identificacion: self.identification,
            cantidad: Some(self.quantity),
            clave_unidad: Some(self.unit_key),
            unidad: self.unit,
            descripcion: Some(self.description),
            valor_unitario: Some(self.unit_value),
            importe: Some(importe),
            descuento: discount,
            objeto_imp: Some(self.tax_object),
            ..Default::default()
        };

        for tax in self.taxes {
            match tax {
                PendingTax::Transfer { tax, factor, rate } => {
                    let rate = rate.map(|r| round_half_up(r, RATE_SCALE));
                    let amount = match rate {
                        Some(r) => Some(round_half_up(checked_mul(base, r)?, MONEY_SCALE)),
                        None => None,
                    };
                    concepto.add_traslado(ConceptoTraslado {
                        base: Some(base),
                        impuesto: Some(tax),
                        tipo_factor: Some(factor),
                        tasa_o_cuota: rate,
                        importe: amount,
                    });
                }
                PendingTax::Retention { tax, rate } => {
                    let rate = round_half_up(rate, RATE_SCALE);
                    concepto.add_retencion(ConceptoRetencion {
                        base: Some(base),
                        impuesto: Some(tax),
                        tipo_factor: Some(FactorType::Rate),
                        tasa_o_cuota: Some(rate),
                        importe: Some(round_half_up(checked_mul(base, rate)?, MONEY_SCALE)),
                    });
                }
            }
        }
        for t in self.traslados {
            concepto.add_traslado(t);
        }
        for r in self.retenciones {
            concepto.add_retencion(r);
        }
        Ok(concepto)
    }
}

/// Builder for one `pago20:Pago`.
pub struct PagoBuilder {
    date: NaiveDateTime,
    payment_form: String,
    currency: String,
    amount: Decimal,
    exchange_rate: Option<Decimal>,
    operation_number: Option<String>,
    documents: Vec<DoctoRelacionado>,
}

impl PagoBuilder {
    pub fn new(
        date: NaiveDateTime,
        payment_form: impl Into<String>,
        currency: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            date,
            payment_form: payment_form.into(),
            currency: currency.into(),
            amount,
            exchange_rate: None,
            operation_number: None,
            documents: Vec::new(),
        }
    }

    /// `TipoCambioP`, pesos per unit of the payment currency.
    pub fn exchange_rate(mut self, rate: Decimal) -> Self {
        self.exchange_rate = Some(rate);
        self
    }

    pub fn operation_number(mut self, number: impl Into<String>) -> Self {
        self.operation_number = Some(number.into());
        self
    }

    /// Settle an installment of a document issued in the payment currency,
    /// not subject to tax.
    pub fn paid_document(
        mut self,
        id: impl Into<String>,
        installment: u32,
        previous_balance: Decimal,
        amount_paid: Decimal,
    ) -> Self {
        self.documents.push(DoctoRelacionado {
            id_documento: Some(id.into()),
            moneda_dr: Some(self.currency.clone()),
            equivalencia_dr: Some(Decimal::ONE),
            num_parcialidad: Some(installment),
            imp_saldo_ant: Some(previous_balance),
            imp_pagado: Some(amount_paid),
            objeto_imp_dr: Some("01".to_string()),
            ..Default::default()
        });
        self
    }

    /// Add a fully specified related document. A missing
    /// `ImpSaldoInsoluto` is derived from the previous balance and the
    /// amount paid.
    pub fn add_document(mut self, document: DoctoRelacionado) -> Self {
        self.documents.push(document);
        self
    }

    pub fn build(self) -> Result<Pago, CfdiError> {
        if self.documents.is_empty() {
            return Err(CfdiError::Builder(
                "a payment must settle at least one document".into(),
            ));
        }

        let mut settled = Decimal::ZERO;
        let mut documents = self.documents;
        for dr in &mut documents {
            let id = dr.id_documento.clone().unwrap_or_default();
            let paid = dr.imp_pagado.unwrap_or_default();
            if dr.imp_saldo_insoluto.is_none() {
                if let Some(previous) = dr.imp_saldo_ant {
                    dr.imp_saldo_insoluto = Some(checked_sub(previous, paid)?);
                }
            }
            if dr.imp_saldo_insoluto.is_some_and(|b| b < Decimal::ZERO) {
                return Err(CfdiError::Builder(format!(
                    "document {id}: amount paid exceeds the previous balance"
                )));
            }
            settled = checked_add(settled, checked_div(paid, dr.equivalence())?)?;
        }
        if round_half_up(settled, MONEY_SCALE) > self.amount {
            return Err(CfdiError::Builder(format!(
                "documents settle {} but the payment amount is {}",
                round_half_up(settled, MONEY_SCALE),
                self.amount
            )));
        }

        Ok(Pago {
            fecha_pago: Some(self.date),
            forma_de_pago_p: Some(self.payment_form),
            moneda_p: Some(self.currency),
            tipo_cambio_p: self.exchange_rate,
            monto: Some(self.amount),
            num_operacion: self.operation_number,
            docto_relacionado: documents,
            ..Default::default()
        })
    }
}
