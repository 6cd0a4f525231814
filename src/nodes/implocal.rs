//! `implocal:ImpuestosLocales`: state and municipal taxes, version 1.0.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::catalog::{array_child, attr};
use crate::core::decimal::checked_add;
use crate::core::registry::ns;
use crate::core::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpuestosLocales {
    pub version: Option<String>,
    pub totalde_retenciones: Option<Decimal>,
    pub totalde_traslados: Option<Decimal>,
    pub retenciones_locales: Vec<RetencionesLocales>,
    pub traslados_locales: Vec<TrasladosLocales>,
}

impl Node for ImpuestosLocales {
    const TAG: Tag = Tag::fixed("implocal:ImpuestosLocales", ns::IMPLOCAL);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<ImpuestosLocales>] = &[
            attr!(ImpuestosLocales, version, ["version"], Required),
            attr!(ImpuestosLocales, totalde_retenciones, ["TotaldeRetenciones", "total_retained"], Required),
            attr!(ImpuestosLocales, totalde_traslados, ["TotaldeTraslados", "total_transferred"], Required),
        ];
        ATTRS
    }

    fn child_defs() -> &'static [ChildDef<Self>] {
        const CHILDREN: &[ChildDef<ImpuestosLocales>] = &[
            array_child!(ImpuestosLocales, retenciones_locales: RetencionesLocales, ["RetencionesLocales", "retentions"]),
            array_child!(ImpuestosLocales, traslados_locales: TrasladosLocales, ["TrasladosLocales", "transfers"]),
        ];
        CHILDREN
    }

    fn base_attributes(&self, _version: SchemaVersion) -> Vec<(String, String)> {
        vec![
            ("xmlns:implocal".into(), ns::IMPLOCAL.into()),
            ("xmlns:xsi".into(), ns::XSI.into()),
            ("xsi:schemaLocation".into(), format!("{} {}", ns::IMPLOCAL, ns::IMPLOCAL_XSD)),
        ]
    }
}

impl ImpuestosLocales {
    /// Sum of the local retention amounts (missing amounts count as zero).
    pub fn retained_sum(&self) -> Result<Decimal, CfdiError> {
        self.retenciones_locales
            .iter()
            .filter_map(|r| r.importe)
            .try_fold(Decimal::ZERO, checked_add)
    }

    pub fn transferred_sum(&self) -> Result<Decimal, CfdiError> {
        self.traslados_locales
            .iter()
            .filter_map(|t| t.importe)
            .try_fold(Decimal::ZERO, checked_add)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetencionesLocales {
    pub imp_loc_retenido: Option<String>,
    pub tasade_retencion: Option<Decimal>,
    pub importe: Option<Decimal>,
}

impl Node for RetencionesLocales {
    const TAG: Tag = Tag::fixed("implocal:RetencionesLocales", ns::IMPLOCAL);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<RetencionesLocales>] = &[
            attr!(RetencionesLocales, imp_loc_retenido, ["ImpLocRetenido", "tax_name"], Required),
            attr!(RetencionesLocales, tasade_retencion, ["TasadeRetencion", "rate"], Required),
            attr!(RetencionesLocales, importe, ["Importe", "amount"], Required),
        ];
        ATTRS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrasladosLocales {
    pub imp_loc_trasladado: Option<String>,
    pub tasade_traslado: Option<Decimal>,
    pub importe: Option<Decimal>,
}

impl Node for TrasladosLocales {
    const TAG: Tag = Tag::fixed("implocal:TrasladosLocales", ns::IMPLOCAL);

    fn attribute_defs() -> &'static [AttrDef<Self>] {
        const ATTRS: &[AttrDef<TrasladosLocales>] = &[
            attr!(TrasladosLocales, imp_loc_trasladado, ["ImpLocTrasladado", "tax_name"], Required),
            attr!(TrasladosLocales, tasade_traslado, ["TasadeTraslado", "rate"], Required),
            attr!(TrasladosLocales, importe, ["Importe", "amount"], Required),
        ];
        ATTRS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn sums_local_taxes() {
        let data = json!({
            "version": "1.0",
            "TotaldeRetenciones": "0.00",
            "TotaldeTraslados": "3.00",
            "TrasladosLocales": [
                { "ImpLocTrasladado": "ISH", "TasadeTraslado": "2.00", "Importe": "2.00" },
                { "ImpLocTrasladado": "ISH", "TasadeTraslado": "1.00", "Importe": "1.00" }
            ]
        });
        let loc = ImpuestosLocales::from_map(data.as_object().unwrap()).unwrap();
        assert_eq!(loc.transferred_sum().unwrap(), dec!(3.00));
        assert_eq!(loc.retained_sum().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn overflowing_sum_is_an_error() {
        let ish = || TrasladosLocales {
            imp_loc_trasladado: Some("ISH".into()),
            tasade_traslado: Some(Decimal::ONE),
            importe: Some(Decimal::MAX),
        };
        let loc = ImpuestosLocales {
            traslados_locales: vec![ish(), ish()],
            ..Default::default()
        };
        assert!(matches!(loc.transferred_sum(), Err(CfdiError::Decimal(_))));
    }
}
