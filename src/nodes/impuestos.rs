use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::conceptos::check_factor;
use crate::core::catalog::{array_child, attr, unique_child};
use crate::core::*;

/// Document-level `cfdi:Impuestos`, rebuilt by the tax aggregator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Impuestos {
    pub total_impuestos_retenidos: Option<Decimal>,
    pub total_impuestos_trasladados: Option<Decimal>,
    pub retenciones: Option<Retenciones>,
    pub traslados: Option<Traslados>,
}

impl Node for Impuestos {
    const TAG: Tag = Tag::cfdi("cfdi:Impuestos");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<Impuestos>] = &[
            attr!(Impuestos, total_impuestos_retenidos, ["TotalImpuestosRetenidos", "total_retained"], Optional),
            attr!(Impuestos, total_impuestos_trasladados, ["TotalImpuestosTrasladados", "total_transferred"], Optional),
        ];
        ATTRS
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<Impuestos>] = &[
            unique_child!(Impuestos, retenciones: Retenciones, ["Retenciones", "retentions"]),
            unique_child!(Impuestos, traslados: Traslados, ["Traslados", "transfers"]),
        ];
        CHILDREN
    }
}

impl Impuestos {
    pub fn traslados(&self) -> &[Traslado] {
        self.traslados
            .as_ref()
            .map(|t| t.traslado.as_slice())
            .unwrap_or(&[])
    }

    pub fn retenciones(&self) -> &[Retencion] {
        self.retenciones
            .as_ref()
            .map(|r| r.retencion.as_slice())
            .unwrap_or(&[])
    }

    /// True when the node carries neither totals nor entries.
    pub fn is_empty(&self) -> bool {
        self.total_impuestos_retenidos.is_none()
            && self.total_impuestos_trasladados.is_none()
            && self.traslados().is_empty()
            && self.retenciones().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Retenciones {
    pub retencion: Vec<Retencion>,
}

impl Node for Retenciones {
    const TAG: Tag = Tag::cfdi("cfdi:Retenciones");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<Retenciones>] =
            &[array_child!(Retenciones, retencion: Retencion, ["Retencion", "retention"])];
        CHILDREN
    }
}

/// Retention group, keyed by tax kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Retencion {
    pub impuesto: Option<TaxKind>,
    pub importe: Option<Decimal>,
}

impl Node for Retencion {
    const TAG: Tag = Tag::cfdi("cfdi:Retencion");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<Retencion>] = &[
            attr!(Retencion, impuesto, ["Impuesto", "tax"], Required),
            attr!(Retencion, importe, ["Importe", "amount"], Required),
        ];
        ATTRS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Traslados {
    pub traslado: Vec<Traslado>,
}

impl Node for Traslados {
    const TAG: Tag = Tag::cfdi("cfdi:Traslados");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        &[]
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<Traslados>] =
            &[array_child!(Traslados, traslado: Traslado, ["Traslado", "transfer"])];
        CHILDREN
    }
}

/// Transfer group, keyed by tax kind, factor type and rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Traslado {
    pub base: Option<Decimal>,
    pub impuesto: Option<TaxKind>,
    pub tipo_factor: Option<FactorType>,
    pub tasa_o_cuota: Option<Decimal>,
    pub importe: Option<Decimal>,
}

impl Node for Traslado {
    const TAG: Tag = Tag::cfdi("cfdi:Traslado");

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<Traslado>] = &[
            attr!(Traslado, base, ["Base", "base"], RequiredSince40),
            attr!(Traslado, impuesto, ["Impuesto", "tax"], Required),
            attr!(Traslado, tipo_factor, ["TipoFactor", "factor_type"], Required),
            attr!(Traslado, tasa_o_cuota, ["TasaOCuota", "rate"], Optional),
            attr!(Traslado, importe, ["Importe", "amount"], Optional),
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

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn base_is_required_only_in_40() {
        let t = Traslado {
            impuesto: Some(TaxKind::Iva),
            tipo_factor: Some(FactorType::Rate),
            tasa_o_cuota: Some(dec!(0.160000)),
            importe: Some(dec!(16.00)),
            ..Default::default()
        };
        assert!(t.attributes_in(SchemaVersion::V33).is_ok());
        assert!(matches!(
            t.attributes_in(SchemaVersion::V40),
            Err(CfdiError::MissingAttribute { attribute: "Base", .. })
        ));
    }

    #[test]
    fn emptiness() {
        let mut imp = Impuestos::default();
        assert!(imp.is_empty());
        imp.total_impuestos_trasladados = Some(dec!(0.00));
        assert!(!imp.is_empty());
    }
}
