//! Cadena original
//!
//! A static rule tree following the order of SAT's `cadenaoriginal_4_0.xslt`
//! and its Pagos 2.0 include. Each rule lists attributes to emit and child
//! paths to descend into, in the exact order the XSLT visits them. Missing
//! optional attributes are skipped, values are whitespace-normalized, and the
//! result is framed as `||v1|v2|...||`.
//!
//! `TimbreFiscalDigital` has no rule, so the cadena of a stamped document
//! equals the cadena of the sealed one.

use shared::xml::{XmlError, XmlNode};

enum Step {
    /// Emit an attribute of the current element
    Attr(&'static str),
    /// For every element at this local-name path below the current one, apply the rule
    Each(&'static [&'static str], &'static [Step]),
}

use Step::{Attr, Each};

// ========== cfdi:Comprobante ==========

const COMPROBANTE: &[Step] = &[
    Attr("Version"),
    Attr("Serie"),
    Attr("Folio"),
    Attr("Fecha"),
    Attr("FormaPago"),
    Attr("NoCertificado"),
    Attr("CondicionesDePago"),
    Attr("SubTotal"),
    Attr("Descuento"),
    Attr("Moneda"),
    Attr("TipoCambio"),
    Attr("Total"),
    Attr("TipoDeComprobante"),
    Attr("Exportacion"),
    Attr("MetodoPago"),
    Attr("LugarExpedicion"),
    Attr("Confirmacion"),
    Each(&["InformacionGlobal"], INFORMACION_GLOBAL),
    Each(&["CfdiRelacionados"], CFDI_RELACIONADOS),
    Each(&["Emisor"], EMISOR),
    Each(&["Receptor"], RECEPTOR),
    Each(&["Conceptos", "Concepto"], CONCEPTO),
    Each(&["Impuestos"], IMPUESTOS),
    Each(&["Complemento", "Pagos"], PAGOS),
];

const INFORMACION_GLOBAL: &[Step] = &[Attr("Periodicidad"), Attr("Meses"), Attr("Año")];

const CFDI_RELACIONADOS: &[Step] = &[
    Attr("TipoRelacion"),
    Each(&["CfdiRelacionado"], &[Attr("UUID")]),
];

const EMISOR: &[Step] = &[
    Attr("Rfc"),
    Attr("Nombre"),
    Attr("RegimenFiscal"),
    Attr("FacAtrAdquirente"),
];

const RECEPTOR: &[Step] = &[
    Attr("Rfc"),
    Attr("Nombre"),
    Attr("DomicilioFiscalReceptor"),
    Attr("ResidenciaFiscal"),
    Attr("NumRegIdTrib"),
    Attr("RegimenFiscalReceptor"),
    Attr("UsoCFDI"),
];

const CONCEPTO: &[Step] = &[
    Attr("ClaveProdServ"),
    Attr("NoIdentificacion"),
    Attr("Cantidad"),
    Attr("ClaveUnidad"),
    Attr("Unidad"),
    Attr("Descripcion"),
    Attr("ValorUnitario"),
    Attr("Importe"),
    Attr("Descuento"),
    Attr("ObjetoImp"),
    Each(&["Impuestos", "Traslados", "Traslado"], IMPUESTO_CONCEPTO),
    Each(&["Impuestos", "Retenciones", "Retencion"], IMPUESTO_CONCEPTO),
    Each(&["ACuentaTerceros"], A_CUENTA_TERCEROS),
    Each(&["InformacionAduanera"], &[Attr("NumeroPedimento")]),
    Each(&["CuentaPredial"], &[Attr("Numero")]),
];

const IMPUESTO_CONCEPTO: &[Step] = &[
    Attr("Base"),
    Attr("Impuesto"),
    Attr("TipoFactor"),
    Attr("TasaOCuota"),
    Attr("Importe"),
];

const A_CUENTA_TERCEROS: &[Step] = &[
    Attr("RfcACuentaTerceros"),
    Attr("NombreACuentaTerceros"),
    Attr("RegimenFiscalACuentaTerceros"),
    Attr("DomicilioFiscalACuentaTerceros"),
];

const IMPUESTOS: &[Step] = &[
    Each(&["Retenciones", "Retencion"], &[Attr("Impuesto"), Attr("Importe")]),
    Attr("TotalImpuestosRetenidos"),
    Each(&["Traslados", "Traslado"], IMPUESTO_CONCEPTO),
    Attr("TotalImpuestosTrasladados"),
];

// ========== pago20:Pagos ==========

const PAGOS: &[Step] = &[
    Attr("Version"),
    Each(&["Totales"], TOTALES),
    Each(&["Pago"], PAGO),
];

const TOTALES: &[Step] = &[
    Attr("TotalRetencionesIVA"),
    Attr("TotalRetencionesISR"),
    Attr("TotalRetencionesIEPS"),
    Attr("TotalTrasladosBaseIVA16"),
    Attr("TotalTrasladosImpuestoIVA16"),
    Attr("TotalTrasladosBaseIVA8"),
    Attr("TotalTrasladosImpuestoIVA8"),
    Attr("TotalTrasladosBaseIVA0"),
    Attr("TotalTrasladosImpuestoIVA0"),
    Attr("TotalTrasladosBaseIVAExento"),
    Attr("MontoTotalPagos"),
];

const PAGO: &[Step] = &[
    Attr("FechaPago"),
    Attr("FormaDePagoP"),
    Attr("MonedaP"),
    Attr("TipoCambioP"),
    Attr("Monto"),
    Attr("NumOperacion"),
    Attr("RfcEmisorCtaOrd"),
    Attr("NomBancoOrdExt"),
    Attr("CtaOrdenante"),
    Attr("RfcEmisorCtaBen"),
    Attr("CtaBeneficiario"),
    Attr("TipoCadPago"),
    Attr("CertPago"),
    Attr("CadPago"),
    Attr("SelloPago"),
    Each(&["DoctoRelacionado"], DOCTO_RELACIONADO),
    Each(&["ImpuestosP"], IMPUESTOS_P),
];

const DOCTO_RELACIONADO: &[Step] = &[
    Attr("IdDocumento"),
    Attr("Serie"),
    Attr("Folio"),
    Attr("MonedaDR"),
    Attr("EquivalenciaDR"),
    Attr("NumParcialidad"),
    Attr("ImpSaldoAnt"),
    Attr("ImpPagado"),
    Attr("ImpSaldoInsoluto"),
    Attr("ObjetoImpDR"),
    Each(&["ImpuestosDR", "RetencionesDR", "RetencionDR"], IMPUESTO_DR),
    Each(&["ImpuestosDR", "TrasladosDR", "TrasladoDR"], IMPUESTO_DR),
];

const IMPUESTO_DR: &[Step] = &[
    Attr("BaseDR"),
    Attr("ImpuestoDR"),
    Attr("TipoFactorDR"),
    Attr("TasaOCuotaDR"),
    Attr("ImporteDR"),
];

const IMPUESTOS_P: &[Step] = &[
    Each(&["RetencionesP", "RetencionP"], &[Attr("ImpuestoP"), Attr("ImporteP")]),
    Each(&["TrasladosP", "TrasladoP"], IMPUESTO_P),
];

const IMPUESTO_P: &[Step] = &[
    Attr("BaseP"),
    Attr("ImpuestoP"),
    Attr("TipoFactorP"),
    Attr("TasaOCuotaP"),
    Attr("ImporteP"),
];

/// Cadena original of a CFDI document
pub fn cadena_original(xml: &str) -> Result<String, XmlError> {
    let root = XmlNode::parse(xml)?;
    Ok(cadena_original_of(&root))
}

/// Cadena original of an already parsed (or freshly built) `cfdi:Comprobante`
pub fn cadena_original_of(root: &XmlNode) -> String {
    let mut values = Vec::new();
    apply(root, COMPROBANTE, &mut values);
    format!("||{}||", values.join("|"))
}

fn apply(node: &XmlNode, rule: &[Step], values: &mut Vec<String>) {
    for step in rule {
        match step {
            Attr(name) => {
                if let Some(value) = node.attr(name) {
                    values.push(normalize_space(value));
                }
            }
            Each(path, child_rule) => {
                for child in descend(node, path) {
                    apply(child, child_rule, values);
                }
            }
        }
    }
}

/// Elements reached by following `path` by local name, in document order
fn descend<'a>(node: &'a XmlNode, path: &[&'a str]) -> Vec<&'a XmlNode> {
    match path.split_first() {
        None => vec![node],
        Some((head, rest)) => node
            .children_named(head)
            .flat_map(|child| descend(child, rest))
            .collect(),
    }
}

/// XPath `normalize-space`: trim and collapse whitespace runs
fn normalize_space(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfdi::build_invoice;
    use crate::fixtures::draft;
    use crate::validation::Validator;
    use rust_decimal_macros::dec;

    fn built_xml(draft: crate::validation::InvoiceDraft) -> String {
        let validated = Validator::default().validate(draft).expect("valid");
        build_invoice(&validated).render().expect("render")
    }

    #[test]
    fn test_simple_invoice_cadena() {
        let cadena = cadena_original(&built_xml(draft())).unwrap();
        assert_eq!(
            cadena,
            "||4.0|A|1001|2025-03-14T10:30:00|03|1000.00|MXN|1160.00|I|01|PUE|42501\
             |EKU9003173C9|ESCUELA KEMPER URGATE|601\
             |URE180429TM6|UNIVERSIDAD ROBOTICA ESPAÑOLA|86991|601|G03\
             |01010101|SKU-001|1|H87|Pieza|Servicio de consultoría|1000.00|1000.00|02\
             |1000.000000|002|Tasa|0.160000|160.000000\
             |1000.00|002|Tasa|0.160000|160.00|160.00||"
        );
    }

    #[test]
    fn test_cadena_is_deterministic() {
        let xml = built_xml(draft());
        assert_eq!(cadena_original(&xml).unwrap(), cadena_original(&xml).unwrap());
    }

    #[test]
    fn test_cadena_changes_with_totals() {
        let base = cadena_original(&built_xml(draft())).unwrap();

        let mut changed = draft();
        changed.items[0].unit_price = dec!(1000.01);
        changed.invoice.subtotal = dec!(1000.01);
        changed.invoice.total = dec!(1160.01);

        assert_ne!(base, cadena_original(&built_xml(changed)).unwrap());
    }

    #[test]
    fn test_cadena_ignores_insignificant_whitespace() {
        let compact = built_xml(draft());
        let spaced = compact
            .replace("><", ">\n    <")
            .replace("\" ", "\"\n        ");

        assert_ne!(compact, spaced);
        assert_eq!(
            cadena_original(&compact).unwrap(),
            cadena_original(&spaced).unwrap()
        );
    }

    #[test]
    fn test_attribute_values_are_normalized() {
        let xml = concat!(
            "<cfdi:Comprobante xmlns:cfdi=\"http://www.sat.gob.mx/cfd/4\" Version=\"4.0\" Folio=\"  12 \">",
            "<cfdi:Emisor Rfc=\"EKU9003173C9\" Nombre=\"ESCUELA   KEMPER\tURGATE\"/>",
            "<cfdi:Complemento><tfd:TimbreFiscalDigital xmlns:tfd=\"x\" UUID=\"abc\"/></cfdi:Complemento>",
            "</cfdi:Comprobante>"
        );
        assert_eq!(
            cadena_original(xml).unwrap(),
            "||4.0|12|EKU9003173C9|ESCUELA KEMPER URGATE||"
        );
    }

    #[test]
    fn test_global_taxes_list_retentions_first() {
        let xml = concat!(
            "<cfdi:Comprobante Version=\"4.0\">",
            "<cfdi:Impuestos TotalImpuestosRetenidos=\"10.00\" TotalImpuestosTrasladados=\"16.00\">",
            "<cfdi:Traslados><cfdi:Traslado Base=\"100.00\" Impuesto=\"002\" TipoFactor=\"Tasa\" TasaOCuota=\"0.160000\" Importe=\"16.00\"/></cfdi:Traslados>",
            "<cfdi:Retenciones><cfdi:Retencion Impuesto=\"001\" Importe=\"10.00\"/></cfdi:Retenciones>",
            "</cfdi:Impuestos>",
            "</cfdi:Comprobante>"
        );
        assert_eq!(
            cadena_original(xml).unwrap(),
            "||4.0|001|10.00|10.00|100.00|002|Tasa|0.160000|16.00|16.00||"
        );
    }
}
