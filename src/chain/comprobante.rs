use tracing::debug;

use super::ChainBuilder;
use super::complements;
use crate::core::{CfdiError, Node, SchemaVersion};
use crate::nodes::*;

/// Original chain of a CFDI 3.3 or 4.0 document, in the field order of the
/// SAT `cadenaoriginal` transforms.
///
/// Fails when the document lacks a component the chain needs (issuer,
/// recipient, line items, a required field) or carries a complement whose
/// chain contribution is not known.
pub fn original_chain(doc: &Comprobante) -> Result<String, CfdiError> {
    let version = doc.own_version().ok_or_else(|| {
        CfdiError::Chain(format!(
            "{}: missing or unsupported Version",
            Comprobante::TAG.name
        ))
    })?;
    let emisor = doc
        .emisor
        .as_ref()
        .ok_or_else(|| CfdiError::Chain("document has no cfdi:Emisor".into()))?;
    let receptor = doc
        .receptor
        .as_ref()
        .ok_or_else(|| CfdiError::Chain("document has no cfdi:Receptor".into()))?;
    if doc.concepts().is_empty() {
        return Err(CfdiError::Chain("document has no cfdi:Concepto".into()));
    }

    let mut chain = ChainBuilder::new();
    root(&mut chain, doc, version)?;
    if let Some(info) = doc.informacion_global.as_ref().filter(|_| version == SchemaVersion::V40) {
        informacion_global(&mut chain, info)?;
    }
    for rel in &doc.cfdi_relacionados {
        relacionados(&mut chain, rel)?;
    }
    issuer(&mut chain, emisor, version)?;
    recipient(&mut chain, receptor, version)?;
    for concepto in doc.concepts() {
        item(&mut chain, concepto, version)?;
    }
    if let Some(impuestos) = &doc.impuestos {
        taxes(&mut chain, impuestos, version)?;
    }
    if let Some(complemento) = &doc.complemento {
        complements::append(&mut chain, complemento)?;
    }

    debug!("original chain built with {} fields", chain.len());
    Ok(chain.build())
}

fn root(chain: &mut ChainBuilder, c: &Comprobante, version: SchemaVersion) -> Result<(), CfdiError> {
    let node = Comprobante::TAG.name;
    chain
        .required(node, "Version", c.version.as_ref())?
        .optional(c.serie.as_ref())
        .optional(c.folio.as_ref())
        .required(node, "Fecha", c.fecha.as_ref())?
        .optional(c.forma_pago.as_ref())
        .required(node, "NoCertificado", c.no_certificado.as_ref())?
        .optional(c.condiciones_de_pago.as_ref())
        .required(node, "SubTotal", c.sub_total.as_ref())?
        .optional(c.descuento.as_ref())
        .required(node, "Moneda", c.moneda.as_ref())?
        .optional(c.tipo_cambio.as_ref())
        .required(node, "Total", c.total.as_ref())?
        .required(node, "TipoDeComprobante", c.tipo_de_comprobante.as_ref())?;
    if version == SchemaVersion::V40 {
        chain.required(node, "Exportacion", c.exportacion.as_ref())?;
    }
    chain
        .optional(c.metodo_pago.as_ref())
        .required(node, "LugarExpedicion", c.lugar_expedicion.as_ref())?
        .optional(c.confirmacion.as_ref());
    Ok(())
}

fn informacion_global(chain: &mut ChainBuilder, info: &InformacionGlobal) -> Result<(), CfdiError> {
    let node = InformacionGlobal::TAG.name;
    chain
        .required(node, "Periodicidad", info.periodicidad.as_ref())?
        .required(node, "Meses", info.meses.as_ref())?
        .required(node, "Año", info.anio.as_ref())?;
    Ok(())
}

fn relacionados(chain: &mut ChainBuilder, rel: &CfdiRelacionados) -> Result<(), CfdiError> {
    chain.required(CfdiRelacionados::TAG.name, "TipoRelacion", rel.tipo_relacion.as_ref())?;
    for r in &rel.cfdi_relacionado {
        chain.required(CfdiRelacionado::TAG.name, "UUID", r.uuid.as_ref())?;
    }
    Ok(())
}

fn issuer(chain: &mut ChainBuilder, e: &Emisor, version: SchemaVersion) -> Result<(), CfdiError> {
    let node = Emisor::TAG.name;
    chain
        .required(node, "Rfc", e.rfc.as_ref())?
        .required_since_40(version, node, "Nombre", e.nombre.as_ref())?
        .required(node, "RegimenFiscal", e.regimen_fiscal.as_ref())?;
    if version == SchemaVersion::V40 {
        chain.optional(e.fac_atr_adquirente.as_ref());
    }
    Ok(())
}

fn recipient(chain: &mut ChainBuilder, r: &Receptor, version: SchemaVersion) -> Result<(), CfdiError> {
    let node = Receptor::TAG.name;
    chain
        .required(node, "Rfc", r.rfc.as_ref())?
        .required_since_40(version, node, "Nombre", r.nombre.as_ref())?;
    if version == SchemaVersion::V40 {
        chain.required(node, "DomicilioFiscalReceptor", r.domicilio_fiscal_receptor.as_ref())?;
    }
    chain
        .optional(r.residencia_fiscal.as_ref())
        .optional(r.num_reg_id_trib.as_ref());
    if version == SchemaVersion::V40 {
        chain.required(node, "RegimenFiscalReceptor", r.regimen_fiscal_receptor.as_ref())?;
    }
    chain.required(node, "UsoCFDI", r.uso_cfdi.as_ref())?;
    Ok(())
}

fn item(chain: &mut ChainBuilder, c: &Concepto, version: SchemaVersion) -> Result<(), CfdiError> {
    let node = Concepto::TAG.name;
    chain
        .required(node, "ClaveProdServ", c.clave_prod_serv.as_ref())?
        .optional(c.no_identificacion.as_ref())
        .required(node, "Cantidad", c.cantidad.as_ref())?
        .required(node, "ClaveUnidad", c.clave_unidad.as_ref())?
        .optional(c.unidad.as_ref())
        .required(node, "Descripcion", c.descripcion.as_ref())?
        .required(node, "ValorUnitario", c.valor_unitario.as_ref())?
        .required(node, "Importe", c.importe.as_ref())?
        .optional(c.descuento.as_ref());
    if version == SchemaVersion::V40 {
        chain.required(node, "ObjetoImp", c.objeto_imp.as_ref())?;
    }

    for t in c.traslados() {
        let node = ConceptoTraslado::TAG.name;
        chain
            .required(node, "Base", t.base.as_ref())?
            .required(node, "Impuesto", t.impuesto.as_ref())?
            .required(node, "TipoFactor", t.tipo_factor.as_ref())?
            .optional(t.tasa_o_cuota.as_ref())
            .optional(t.importe.as_ref());
    }
    for r in c.retenciones() {
        let node = ConceptoRetencion::TAG.name;
        chain
            .required(node, "Base", r.base.as_ref())?
            .required(node, "Impuesto", r.impuesto.as_ref())?
            .required(node, "TipoFactor", r.tipo_factor.as_ref())?
            .required(node, "TasaOCuota", r.tasa_o_cuota.as_ref())?
            .required(node, "Importe", r.importe.as_ref())?;
    }
    if let Some(t) = &c.a_cuenta_terceros {
        let node = ACuentaTerceros::TAG.name;
        chain
            .required(node, "RfcACuentaTerceros", t.rfc_a_cuenta_terceros.as_ref())?
            .required(node, "NombreACuentaTerceros", t.nombre_a_cuenta_terceros.as_ref())?
            .required(node, "RegimenFiscalACuentaTerceros", t.regimen_fiscal_a_cuenta_terceros.as_ref())?
            .required(node, "DomicilioFiscalACuentaTerceros", t.domicilio_fiscal_a_cuenta_terceros.as_ref())?;
    }
    customs(chain, &c.informacion_aduanera)?;
    for cp in &c.cuenta_predial {
        chain.required(CuentaPredial::TAG.name, "Numero", cp.numero.as_ref())?;
    }
    if let Some(el) = c.complemento_concepto.as_ref().and_then(|cc| cc.nodes.first()) {
        return Err(CfdiError::Chain(format!(
            "{}: no chain rules for item complement {}",
            ComplementoConcepto::TAG.name,
            el.name
        )));
    }
    for p in &c.parte {
        let node = Parte::TAG.name;
        chain
            .required(node, "ClaveProdServ", p.clave_prod_serv.as_ref())?
            .optional(p.no_identificacion.as_ref())
            .required(node, "Cantidad", p.cantidad.as_ref())?
            .optional(p.unidad.as_ref())
            .required(node, "Descripcion", p.descripcion.as_ref())?
            .optional(p.valor_unitario.as_ref())
            .optional(p.importe.as_ref());
        customs(chain, &p.informacion_aduanera)?;
    }
    Ok(())
}

fn customs(chain: &mut ChainBuilder, entries: &[InformacionAduanera]) -> Result<(), CfdiError> {
    for ia in entries {
        chain.required(InformacionAduanera::TAG.name, "NumeroPedimento", ia.numero_pedimento.as_ref())?;
    }
    Ok(())
}

fn taxes(chain: &mut ChainBuilder, imp: &Impuestos, version: SchemaVersion) -> Result<(), CfdiError> {
    for r in imp.retenciones() {
        let node = Retencion::TAG.name;
        chain
            .required(node, "Impuesto", r.impuesto.as_ref())?
            .required(node, "Importe", r.importe.as_ref())?;
    }
    chain.optional(imp.total_impuestos_retenidos.as_ref());
    for t in imp.traslados() {
        let node = Traslado::TAG.name;
        chain
            .required_since_40(version, node, "Base", t.base.as_ref())?
            .required(node, "Impuesto", t.impuesto.as_ref())?
            .required(node, "TipoFactor", t.tipo_factor.as_ref())?
            .optional(t.tasa_o_cuota.as_ref())
            .optional(t.importe.as_ref());
    }
    chain.optional(imp.total_impuestos_trasladados.as_ref());
    Ok(())
}
