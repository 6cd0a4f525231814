use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ComplementoConcepto;
use crate::core::catalog::{array_child, attr, unique_child};
use crate::core::*;

/// `cfdi:Conceptos`: container of line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conceptos {
    pub concepto: Vec<Concepto>,
}

impl Node for Conceptos {
    const TAG: Tag = Tag::cfdi("cfdi:Conceptos");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<Conceptos>] =
            &[array_child!(Conceptos, concepto: Concepto, ["Concepto", "item"])];
        CHILDREN
    }
}

/// `cfdi:Concepto`: one line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Concepto {
    /// c_ClaveProdServ.
    pub clave_prod_serv: Option<String>,
    pub no_identificacion: Option<String>,
    pub cantidad: Option<Decimal>,
    /// c_ClaveUnidad.
    pub clave_unidad: Option<String>,
    pub unidad: Option<String>,
    pub descripcion: Option<String>,
    pub valor_unitario: Option<Decimal>,
    pub importe: Option<Decimal>,
    pub descuento: Option<Decimal>,
    /// c_ObjetoImp, mandatory from 4.0.
    pub objeto_imp: Option<String>,

    pub impuestos: Option<ConceptoImpuestos>,
    pub a_cuenta_terceros: Option<ACuentaTerceros>,
    pub informacion_aduanera: Vec<InformacionAduanera>,
    pub cuenta_predial: Vec<CuentaPredial>,
    pub complemento_concepto: Option<ComplementoConcepto>,
    pub parte: Vec<Parte>,
}

impl Node for Concepto {
    const TAG: Tag = Tag::cfdi("cfdi:Concepto");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<Concepto>] = &[
            attr!(Concepto, clave_prod_serv, ["ClaveProdServ", "product_code"], Required),
            attr!(Concepto, no_identificacion, ["NoIdentificacion", "identification_number"], Optional),
            attr!(Concepto, cantidad, ["Cantidad", "quantity"], Required),
            attr!(Concepto, clave_unidad, ["ClaveUnidad", "unit_code"], Required),
            attr!(Concepto, unidad, ["Unidad", "unit"], Optional),
            attr!(Concepto, descripcion, ["Descripcion", "description"], Required),
            attr!(Concepto, valor_unitario, ["ValorUnitario", "unit_value"], Required),
            attr!(Concepto, importe, ["Importe", "amount"], Required),
            attr!(Concepto, descuento, ["Descuento", "discount"], Optional),
            attr!(Concepto, objeto_imp, ["ObjetoImp", "tax_object"], RequiredSince40),
        ];
        ATTRS
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<Concepto>] = &[
            unique_child!(Concepto, impuestos: ConceptoImpuestos, ["Impuestos", "taxes"]),
            unique_child!(Concepto, a_cuenta_terceros: ACuentaTerceros, ["ACuentaTerceros", "third_party"]),
            array_child!(Concepto, informacion_aduanera: InformacionAduanera, ["InformacionAduanera", "customs_information"]),
            array_child!(Concepto, cuenta_predial: CuentaPredial, ["CuentaPredial", "property_tax_account"]),
            unique_child!(Concepto, complemento_concepto: ComplementoConcepto, ["ComplementoConcepto", "item_complement"]),
            array_child!(Concepto, parte: Parte, ["Parte", "part"]),
        ];
        CHILDREN
    }
}

impl Concepto {
    /// Transferred taxes of this item, empty when absent.
    pub fn traslados(&self) -> &[ConceptoTraslado] {
        self.impuestos
            .as_ref()
            .and_then(|i| i.traslados.as_ref())
            .map(|t| t.traslado.as_slice())
            .unwrap_or(&[])
    }

    /// Retained taxes of this item, empty when absent.
    pub fn retenciones(&self) -> &[ConceptoRetencion] {
        self.impuestos
            .as_ref()
            .and_then(|i| i.retenciones.as_ref())
            .map(|r| r.retencion.as_slice())
            .unwrap_or(&[])
    }

    pub fn add_traslado(&mut self, traslado: ConceptoTraslado) {
        self.impuestos
            .get_or_insert_with(Default::default)
            .traslados
            .get_or_insert_with(Default::default)
            .traslado
            .push(traslado);
    }

    pub fn add_retencion(&mut self, retencion: ConceptoRetencion) {
        self.impuestos
            .get_or_insert_with(Default::default)
            .retenciones
            .get_or_insert_with(Default::default)
            .retencion
            .push(retencion);
    }
}

/// `cfdi:Impuestos` inside a line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptoImpuestos {
    pub traslados: Option<ConceptoTraslados>,
    pub retenciones: Option<ConceptoRetenciones>,
}

impl Node for ConceptoImpuestos {
    const TAG: Tag = Tag::cfdi("cfdi:Impuestos");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<ConceptoImpuestos>] = &[
            unique_child!(ConceptoImpuestos, traslados: ConceptoTraslados, ["Traslados", "transfers"]),
            unique_child!(ConceptoImpuestos, retenciones: ConceptoRetenciones, ["Retenciones", "retentions"]),
        ];
        CHILDREN
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptoTraslados {
    pub traslado: Vec<ConceptoTraslado>,
}

impl Node for ConceptoTraslados {
    const TAG: Tag = Tag::cfdi("cfdi:Traslados");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<ConceptoTraslados>] = &[array_child!(
            ConceptoTraslados,
            traslado: ConceptoTraslado,
            ["Traslado", "transfer"]
        )];
        CHILDREN
    }
}

/// Transferred tax on a line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptoTraslado {
    pub base: Option<Decimal>,
    pub impuesto: Option<TaxKind>,
    pub tipo_factor: Option<FactorType>,
    pub tasa_o_cuota: Option<Decimal>,
    pub importe: Option<Decimal>,
}

impl Node for ConceptoTraslado {
    const TAG: Tag = Tag::cfdi("cfdi:Traslado");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<ConceptoTraslado>] = &[
            attr!(ConceptoTraslado, base, ["Base", "base"], Required),
            attr!(ConceptoTraslado, impuesto, ["Impuesto", "tax"], Required),
            attr!(ConceptoTraslado, tipo_factor, ["TipoFactor", "factor_type"], Required),
            attr!(ConceptoTraslado, tasa_o_cuota, ["TasaOCuota", "rate"], Optional),
            attr!(ConceptoTraslado, importe, ["Importe", "amount"], Optional),
        ];
        ATTRS
    }

    fn check(&self) -> Result<(), CfdiError> {
        check_factor(
            Self::TAG.name,
            self.tipo_factor,
            self.tasa_o_cuota.is_some(),
            self.importe.is_some(),
            ("TasaOCuota", "Importe"),
        )
    }
}

/// Rate and amount must be present unless the factor is exempt, and absent
/// when it is.
pub(crate) fn check_factor(
    node: &'static str,
    factor: Option<FactorType>,
    has_rate: bool,
    has_amount: bool,
    names: (&'static str, &'static str),
) -> Result<(), CfdiError> {
    match factor {
        Some(FactorType::Exempt) if has_rate || has_amount => Err(CfdiError::Validation(format!(
            "{node}: {} and {} must be absent when TipoFactor is Exento",
            names.0, names.1
        ))),
        Some(FactorType::Rate | FactorType::Fee) if !has_rate => {
            Err(CfdiError::MissingAttribute {
                node,
                attribute: names.0,
            })
        }
        Some(FactorType::Rate | FactorType::Fee) if !has_amount => {
            Err(CfdiError::MissingAttribute {
                node,
                attribute: names.1,
            })
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptoRetenciones {
    pub retencion: Vec<ConceptoRetencion>,
}

impl Node for ConceptoRetenciones {
    const TAG: Tag = Tag::cfdi("cfdi:Retenciones");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<ConceptoRetenciones>] = &[array_child!(
            ConceptoRetenciones,
            retencion: ConceptoRetencion,
            ["Retencion", "retention"]
        )];
        CHILDREN
    }
}

/// Retained tax on a line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptoRetencion {
    pub base: Option<Decimal>,
    pub impuesto: Option<TaxKind>,
    pub tipo_factor: Option<FactorType>,
    pub tasa_o_cuota: Option<Decimal>,
    pub importe: Option<Decimal>,
}

impl Node for ConceptoRetencion {
    const TAG: Tag = Tag::cfdi("cfdi:Retencion");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<ConceptoRetencion>] = &[
            attr!(ConceptoRetencion, base, ["Base", "base"], Required),
            attr!(ConceptoRetencion, impuesto, ["Impuesto", "tax"], Required),
            attr!(ConceptoRetencion, tipo_factor, ["TipoFactor", "factor_type"], Required),
            attr!(ConceptoRetencion, tasa_o_cuota, ["TasaOCuota", "rate"], Required),
            attr!(ConceptoRetencion, importe, ["Importe", "amount"], Required),
        ];
        ATTRS
    }
}

/// `cfdi:ACuentaTerceros`: item billed on behalf of a third party.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ACuentaTerceros {
    pub rfc_a_cuenta_terceros: Option<Rfc>,
    pub nombre_a_cuenta_terceros: Option<String>,
    pub regimen_fiscal_a_cuenta_terceros: Option<String>,
    pub domicilio_fiscal_a_cuenta_terceros: Option<String>,
}

impl Node for ACuentaTerceros {
    const TAG: Tag = Tag::cfdi("cfdi:ACuentaTerceros");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<ACuentaTerceros>] = &[
            attr!(ACuentaTerceros, rfc_a_cuenta_terceros, ["RfcACuentaTerceros", "rfc"], Required),
            attr!(ACuentaTerceros, nombre_a_cuenta_terceros, ["NombreACuentaTerceros", "name"], Required),
            attr!(ACuentaTerceros, regimen_fiscal_a_cuenta_terceros, ["RegimenFiscalACuentaTerceros", "tax_regime"], Required),
            attr!(ACuentaTerceros, domicilio_fiscal_a_cuenta_terceros, ["DomicilioFiscalACuentaTerceros", "tax_postal_code"], Required),
        ];
        ATTRS
    }
}

/// `cfdi:InformacionAduanera`: customs entry number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InformacionAduanera {
    pub numero_pedimento: Option<String>,
}

impl Node for InformacionAduanera {
    const TAG: Tag = Tag::cfdi("cfdi:InformacionAduanera");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<InformacionAduanera>] = &[attr!(
            InformacionAduanera,
            numero_pedimento,
            ["NumeroPedimento", "customs_entry"],
            Required
        )];
        ATTRS
    }
}

/// `cfdi:CuentaPredial`: property-tax account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CuentaPredial {
    pub numero: Option<String>,
}

impl Node for CuentaPredial {
    const TAG: Tag = Tag::cfdi("cfdi:CuentaPredial");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<CuentaPredial>] =
            &[attr!(CuentaPredial, numero, ["Numero", "number"], Required)];
        ATTRS
    }
}

/// `cfdi:Parte`: component of a line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parte {
    pub clave_prod_serv: Option<String>,
    pub no_identificacion: Option<String>,
    pub cantidad: Option<Decimal>,
    pub unidad: Option<String>,
    pub descripcion: Option<String>,
    pub valor_unitario: Option<Decimal>,
    pub importe: Option<Decimal>,
    pub informacion_aduanera: Vec<InformacionAduanera>,
}

impl Node for Parte {
    const TAG: Tag = Tag::cfdi("cfdi:Parte");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<Parte>] = &[
            attr!(Parte, clave_prod_serv, ["ClaveProdServ", "product_code"], Required),
            attr!(Parte, no_identificacion, ["NoIdentificacion", "identification_number"], Optional),
            attr!(Parte, cantidad, ["Cantidad", "quantity"], Required),
            attr!(Parte, unidad, ["Unidad", "unit"], Optional),
            attr!(Parte, descripcion, ["Descripcion", "description"], Required),
            attr!(Parte, valor_unitario, ["ValorUnitario", "unit_value"], Optional),
            attr!(Parte, importe, ["Importe", "amount"], Optional),
        ];
        ATTRS
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<Parte>] = &[array_child!(
            Parte,
            informacion_aduanera: InformacionAduanera,
            ["InformacionAduanera", "customs_information"]
        )];
        CHILDREN
    }
}
