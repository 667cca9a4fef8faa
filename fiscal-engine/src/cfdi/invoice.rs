//! Income CFDI (TipoDeComprobante `I`)
//!
//! Amounts come from the recomputed [`Totals`](crate::validation::Totals),
//! never from the declared invoice fields. The document is built without
//! `NoCertificado`, `Sello` and `Certificado`; [`seal_document`](super::seal_document)
//! adds them.

use chrono::Datelike;
use rust_decimal::Decimal;
use shared::models::LineItem;
use shared::money::{IVA_RATE, fmt2, fmt6, fmt_quantity, fmt_unit_price};
use shared::xml::XmlNode;

use super::{
    CFDI_NAMESPACE, CFDI_SCHEMA_LOCATION, CFDI_VERSION, DATE_FORMAT, FACTOR_RATE, NOT_EXPORT,
    TAX_IVA, TAXABLE, XSI_NAMESPACE,
};
use crate::validation::{DOMESTIC_CURRENCY, ValidatedInvoice, is_generic_public, line_tax};

/// `InformacionGlobal` periodicity: daily
const PERIODICITY_DAILY: &str = "01";

/// Build the unsigned income CFDI
pub fn build_invoice(validated: &ValidatedInvoice) -> XmlNode {
    let invoice = validated.invoice();
    let emitter = validated.emitter();
    let receiver = validated.receiver();
    let totals = validated.totals();

    let mut root = XmlNode::new("cfdi:Comprobante")
        .attr_with("xmlns:cfdi", CFDI_NAMESPACE)
        .attr_with("xmlns:xsi", XSI_NAMESPACE)
        .attr_with("xsi:schemaLocation", CFDI_SCHEMA_LOCATION)
        .attr_with("Version", CFDI_VERSION)
        .attr_opt("Serie", invoice.series.as_deref().filter(|s| !s.is_empty()))
        .attr_with("Folio", invoice.folio.as_str())
        .attr_with("Fecha", invoice.issued_at.format(DATE_FORMAT).to_string())
        .attr_with("FormaPago", invoice.payment_form.as_str())
        .attr_opt("CondicionesDePago", invoice.payment_terms.as_deref())
        .attr_with("SubTotal", fmt2(totals.subtotal))
        .attr_opt(
            "Descuento",
            (totals.discount > Decimal::ZERO).then(|| fmt2(totals.discount)),
        )
        .attr_with("Moneda", invoice.currency.as_str())
        .attr_opt(
            "TipoCambio",
            invoice
                .exchange_rate
                .filter(|_| invoice.currency != DOMESTIC_CURRENCY)
                .map(|rate| rate.normalize().to_string()),
        )
        .attr_with("Total", fmt2(totals.total))
        .attr_with("TipoDeComprobante", "I")
        .attr_with("Exportacion", NOT_EXPORT)
        .attr_with("MetodoPago", invoice.payment_method.as_str())
        .attr_opt("LugarExpedicion", emitter.postal_code.as_deref());

    if is_generic_public(&receiver.rfc) {
        root.push(
            XmlNode::new("cfdi:InformacionGlobal")
                .attr_with("Periodicidad", PERIODICITY_DAILY)
                .attr_with("Meses", format!("{:02}", invoice.issued_at.month()))
                .attr_with("Año", invoice.issued_at.year().to_string()),
        );
    }

    if let Some(related) = &invoice.related {
        let mut node =
            XmlNode::new("cfdi:CfdiRelacionados").attr_with("TipoRelacion", related.relation_type.as_str());
        for uuid in &related.uuids {
            node.push(XmlNode::new("cfdi:CfdiRelacionado").attr_with("UUID", uuid.trim().to_uppercase()));
        }
        root.push(node);
    }

    root.push(
        XmlNode::new("cfdi:Emisor")
            .attr_with("Rfc", emitter.normalized_rfc())
            .attr_with("Nombre", emitter.name.trim())
            .attr_with("RegimenFiscal", emitter.tax_regime.as_str()),
    );
    root.push(
        XmlNode::new("cfdi:Receptor")
            .attr_with("Rfc", receiver.normalized_rfc())
            .attr_with("Nombre", receiver.name.trim())
            .attr_opt("DomicilioFiscalReceptor", receiver.postal_code.as_deref())
            .attr_with("RegimenFiscalReceptor", receiver.tax_regime.as_str())
            .attr_opt("UsoCFDI", receiver.cfdi_use.as_deref()),
    );

    let mut conceptos = XmlNode::new("cfdi:Conceptos");
    for item in validated.items() {
        conceptos.push(concept(item));
    }
    root.push(conceptos);

    root.push(
        XmlNode::new("cfdi:Impuestos")
            .attr_with("TotalImpuestosTrasladados", fmt2(totals.tax))
            .child_with(
                XmlNode::new("cfdi:Traslados").child_with(
                    XmlNode::new("cfdi:Traslado")
                        .attr_with("Base", fmt2(totals.tax_base))
                        .attr_with("Impuesto", TAX_IVA)
                        .attr_with("TipoFactor", FACTOR_RATE)
                        .attr_with("TasaOCuota", fmt6(IVA_RATE))
                        .attr_with("Importe", fmt2(totals.tax)),
                ),
            ),
    );

    root
}

fn concept(item: &LineItem) -> XmlNode {
    let discount = item.discount_amount();
    XmlNode::new("cfdi:Concepto")
        .attr_with("ClaveProdServ", item.sat_product_code.as_str())
        .attr_opt("NoIdentificacion", item.product_id.as_deref())
        .attr_with("Cantidad", fmt_quantity(item.quantity))
        .attr_with("ClaveUnidad", item.sat_unit_code.as_str())
        .attr_opt("Unidad", item.unit_name.as_deref())
        .attr_with("Descripcion", item.description.trim())
        .attr_with("ValorUnitario", fmt_unit_price(item.unit_price))
        .attr_with("Importe", fmt2(item.gross_amount()))
        .attr_opt("Descuento", (discount > Decimal::ZERO).then(|| fmt2(discount)))
        .attr_with("ObjetoImp", TAXABLE)
        .child_with(
            XmlNode::new("cfdi:Impuestos").child_with(
                XmlNode::new("cfdi:Traslados").child_with(
                    XmlNode::new("cfdi:Traslado")
                        .attr_with("Base", fmt6(item.subtotal()))
                        .attr_with("Impuesto", TAX_IVA)
                        .attr_with("TipoFactor", FACTOR_RATE)
                        .attr_with("TasaOCuota", fmt6(IVA_RATE))
                        .attr_with("Importe", fmt6(line_tax(item))),
                ),
            ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{draft, line};
    use crate::validation::Validator;
    use rust_decimal_macros::dec;

    fn build(draft: crate::validation::InvoiceDraft) -> String {
        let validated = Validator::default().validate(draft).expect("valid");
        build_invoice(&validated).render().expect("render")
    }

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(build(draft()), build(draft()));
    }

    #[test]
    fn test_amount_formatting() {
        let xml = build(draft());
        let root = XmlNode::parse(&xml).unwrap();

        assert_eq!(root.attr("SubTotal"), Some("1000.00"));
        assert_eq!(root.attr("Total"), Some("1160.00"));
        assert_eq!(root.attr("Descuento"), None);
        assert_eq!(root.attr("Sello"), None);
        assert_eq!(root.attr("LugarExpedicion"), Some("42501"));

        let concepto = root.find("Concepto").unwrap();
        assert_eq!(concepto.attr("Cantidad"), Some("1"));
        assert_eq!(concepto.attr("ValorUnitario"), Some("1000.00"));
        assert_eq!(concepto.attr("Importe"), Some("1000.00"));

        let traslado = concepto.find("Traslado").unwrap();
        assert_eq!(traslado.attr("Base"), Some("1000.000000"));
        assert_eq!(traslado.attr("TasaOCuota"), Some("0.160000"));
        assert_eq!(traslado.attr("Importe"), Some("160.000000"));

        let impuestos = root.child("Impuestos").unwrap();
        assert_eq!(impuestos.attr("TotalImpuestosTrasladados"), Some("160.00"));
    }

    #[test]
    fn test_discount_and_exchange_rate() {
        let mut draft = draft();
        draft.items = vec![line(dec!(2), dec!(250))];
        draft.items[0].discount_percent = dec!(10);
        draft.invoice.subtotal = dec!(500);
        draft.invoice.discount = dec!(50);
        draft.invoice.tax = dec!(72);
        draft.invoice.total = dec!(522);
        draft.invoice.currency = "USD".into();
        draft.invoice.exchange_rate = Some(dec!(17.0500));

        let root = XmlNode::parse(&build(draft)).unwrap();
        assert_eq!(root.attr("Descuento"), Some("50.00"));
        assert_eq!(root.attr("TipoCambio"), Some("17.05"));
        assert_eq!(root.attr("Total"), Some("522.00"));
        let concepto = root.find("Concepto").unwrap();
        assert_eq!(concepto.attr("Descuento"), Some("50.00"));
        assert_eq!(concepto.find("Traslado").unwrap().attr("Base"), Some("450.000000"));
    }

    #[test]
    fn test_public_receiver_gets_global_information() {
        let mut draft = draft();
        draft.receiver.rfc = "XAXX010101000".into();
        draft.receiver.name = "PUBLICO EN GENERAL".into();
        draft.receiver.tax_regime = "616".into();
        draft.receiver.cfdi_use = Some("S01".into());
        draft.receiver.postal_code = Some("42501".into());

        let root = XmlNode::parse(&build(draft)).unwrap();
        let global = root.child("InformacionGlobal").unwrap();
        assert_eq!(global.attr("Meses"), Some("03"));
        assert_eq!(global.attr("Año"), Some("2025"));
    }
}
