//! Payment CFDI (TipoDeComprobante `P`) with the Pagos 2.0 complement

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use shared::models::{ComplementFigures, FiscalParty, InvoiceRecord, Payment};
use shared::money::{IVA_RATE, fmt2, fmt6, round6};
use shared::xml::XmlNode;

use super::{
    CFDI_NAMESPACE, CFDI_VERSION, DATE_FORMAT, FACTOR_RATE, NOT_EXPORT, NOT_TAXABLE, TAX_IVA,
    TAXABLE, XSI_NAMESPACE,
};
use crate::validation::DOMESTIC_CURRENCY;

pub const PAGOS_NAMESPACE: &str = "http://www.sat.gob.mx/Pagos20";
pub const PAGOS_SCHEMA_LOCATION: &str = "http://www.sat.gob.mx/cfd/4 http://www.sat.gob.mx/sitio_internet/cfd/4/cfdv40.xsd http://www.sat.gob.mx/Pagos20 http://www.sat.gob.mx/sitio_internet/cfd/Pagos/Pagos20.xsd";
pub const PAGOS_VERSION: &str = "2.0";

/// `UsoCFDI` of payment documents
pub const CFDI_USE_PAYMENTS: &str = "CP01";
/// `Moneda` of payment documents
pub const CURRENCY_NONE: &str = "XXX";
/// c_ClaveProdServ of the single payment concept
pub const PAYMENT_PRODUCT_CODE: &str = "84111506";
/// c_ClaveUnidad "Actividad"
pub const PAYMENT_UNIT_CODE: &str = "ACT";

/// Figures of one payment against its invoice.
///
/// `origin_total` is the total of the stamped origin invoice, which may
/// differ by a cent from the declared one. `all_payments` are the payments
/// registered on the invoice, with or without `payment`. Payments ordered
/// before it (by date, then id) count as prior partialities. The payment
/// amount is split into base and IVA at the domestic rate.
pub fn compute_figures(
    origin_total: Decimal,
    all_payments: &[Payment],
    payment: &Payment,
) -> ComplementFigures {
    let prior: Vec<&Payment> = all_payments
        .iter()
        .filter(|p| p.id != payment.id && p.invoice_id == payment.invoice_id)
        .filter(|p| (p.paid_at, p.id.as_str()) < (payment.paid_at, payment.id.as_str()))
        .collect();

    let paid_before: Decimal = prior.iter().map(|p| p.amount).sum();
    let prior_balance = origin_total - paid_before;
    let tax_base = round6(payment.amount / (Decimal::ONE + IVA_RATE));

    ComplementFigures {
        partiality: prior.len() as u32 + 1,
        prior_balance,
        amount: payment.amount,
        remaining_balance: prior_balance - payment.amount,
        tax_rate: IVA_RATE,
        tax_base,
        tax_amount: round6(tax_base * IVA_RATE),
    }
}

/// Data for one payment document
#[derive(Debug, Clone, Copy)]
pub struct ComplementInput<'a> {
    pub invoice: &'a InvoiceRecord,
    /// UUID of the stamped origin invoice
    pub origin_uuid: &'a str,
    pub payment: &'a Payment,
    pub figures: &'a ComplementFigures,
    pub emitter: &'a FiscalParty,
    pub receiver: &'a FiscalParty,
    pub issued_at: NaiveDateTime,
}

/// Build the unsigned payment CFDI
pub fn build_payment_document(input: &ComplementInput<'_>) -> XmlNode {
    let ComplementInput {
        invoice,
        origin_uuid,
        payment,
        figures,
        emitter,
        receiver,
        issued_at,
    } = *input;

    let domestic = invoice.currency == DOMESTIC_CURRENCY;
    let exchange_rate = if domestic {
        Decimal::ONE
    } else {
        invoice.exchange_rate.unwrap_or(Decimal::ONE)
    };

    let mut root = XmlNode::new("cfdi:Comprobante")
        .attr_with("xmlns:cfdi", CFDI_NAMESPACE)
        .attr_with("xmlns:xsi", XSI_NAMESPACE)
        .attr_with("xmlns:pago20", PAGOS_NAMESPACE)
        .attr_with("xsi:schemaLocation", PAGOS_SCHEMA_LOCATION)
        .attr_with("Version", CFDI_VERSION)
        .attr_with("Folio", payment.id.as_str())
        .attr_with("Fecha", issued_at.format(DATE_FORMAT).to_string())
        .attr_with("SubTotal", "0")
        .attr_with("Moneda", CURRENCY_NONE)
        .attr_with("Total", "0")
        .attr_with("TipoDeComprobante", "P")
        .attr_with("Exportacion", NOT_EXPORT)
        .attr_opt("LugarExpedicion", emitter.postal_code.as_deref());

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
            .attr_with("UsoCFDI", CFDI_USE_PAYMENTS),
    );
    root.push(
        XmlNode::new("cfdi:Conceptos").child_with(
            XmlNode::new("cfdi:Concepto")
                .attr_with("ClaveProdServ", PAYMENT_PRODUCT_CODE)
                .attr_with("Cantidad", "1")
                .attr_with("ClaveUnidad", PAYMENT_UNIT_CODE)
                .attr_with("Descripcion", "Pago")
                .attr_with("ValorUnitario", "0")
                .attr_with("Importe", "0")
                .attr_with("ObjetoImp", NOT_TAXABLE),
        ),
    );

    let totales = XmlNode::new("pago20:Totales")
        .attr_with("TotalTrasladosBaseIVA16", fmt2(figures.tax_base * exchange_rate))
        .attr_with("TotalTrasladosImpuestoIVA16", fmt2(figures.tax_amount * exchange_rate))
        .attr_with("MontoTotalPagos", fmt2(figures.amount * exchange_rate));

    let docto = XmlNode::new("pago20:DoctoRelacionado")
        .attr_with("IdDocumento", origin_uuid.to_uppercase())
        .attr_opt("Serie", invoice.series.as_deref().filter(|s| !s.is_empty()))
        .attr_with("Folio", invoice.folio.as_str())
        .attr_with("MonedaDR", invoice.currency.as_str())
        .attr_with("EquivalenciaDR", "1")
        .attr_with("NumParcialidad", figures.partiality.to_string())
        .attr_with("ImpSaldoAnt", fmt2(figures.prior_balance))
        .attr_with("ImpPagado", fmt2(figures.amount))
        .attr_with("ImpSaldoInsoluto", fmt2(figures.remaining_balance))
        .attr_with("ObjetoImpDR", TAXABLE)
        .child_with(
            XmlNode::new("pago20:ImpuestosDR").child_with(
                XmlNode::new("pago20:TrasladosDR").child_with(
                    XmlNode::new("pago20:TrasladoDR")
                        .attr_with("BaseDR", fmt6(figures.tax_base))
                        .attr_with("ImpuestoDR", TAX_IVA)
                        .attr_with("TipoFactorDR", FACTOR_RATE)
                        .attr_with("TasaOCuotaDR", fmt6(figures.tax_rate))
                        .attr_with("ImporteDR", fmt6(figures.tax_amount)),
                ),
            ),
        );

    let impuestos_p = XmlNode::new("pago20:ImpuestosP").child_with(
        XmlNode::new("pago20:TrasladosP").child_with(
            XmlNode::new("pago20:TrasladoP")
                .attr_with("BaseP", fmt6(figures.tax_base))
                .attr_with("ImpuestoP", TAX_IVA)
                .attr_with("TipoFactorP", FACTOR_RATE)
                .attr_with("TasaOCuotaP", fmt6(figures.tax_rate))
                .attr_with("ImporteP", fmt6(figures.tax_amount)),
        ),
    );

    let pago = XmlNode::new("pago20:Pago")
        .attr_with("FechaPago", payment.paid_at.format(DATE_FORMAT).to_string())
        .attr_with("FormaDePagoP", payment.payment_form.as_str())
        .attr_with("MonedaP", invoice.currency.as_str())
        .attr_with(
            "TipoCambioP",
            if domestic {
                "1".to_string()
            } else {
                exchange_rate.normalize().to_string()
            },
        )
        .attr_with("Monto", fmt2(figures.amount))
        .attr_opt("NumOperacion", payment.operation_number.as_deref())
        .child_with(docto)
        .child_with(impuestos_p);

    root.push(
        XmlNode::new("cfdi:Complemento").child_with(
            XmlNode::new("pago20:Pagos")
                .attr_with("Version", PAGOS_VERSION)
                .child_with(totales)
                .child_with(pago),
        ),
    );

    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfdi::cadena_original_of;
    use crate::fixtures::{emitter, invoice, receiver};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use shared::money::{round2, within_tolerance};

    fn payment(id: &str, day: u32, amount: Decimal) -> Payment {
        Payment {
            id: id.into(),
            invoice_id: "factura-1".into(),
            paid_at: NaiveDate::from_ymd_opt(2025, 4, day)
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .unwrap(),
            amount,
            payment_form: "03".into(),
            operation_number: None,
            complement: None,
            last_error: None,
        }
    }

    #[test]
    fn test_first_partiality() {
        let first = payment("pago-1", 1, dec!(400.00));
        let figures = compute_figures(dec!(1160.00), std::slice::from_ref(&first), &first);

        assert_eq!(figures.partiality, 1);
        assert_eq!(figures.prior_balance, dec!(1160.00));
        assert_eq!(figures.remaining_balance, dec!(760.00));
        assert_eq!(figures.tax_rate, dec!(0.16));
        assert_eq!(round2(figures.tax_base), dec!(344.83));
        assert_eq!(round2(figures.tax_amount), dec!(55.17));

        // (total / 1.16) x (amount / total) x 0.16
        let expected = dec!(1160.00) / dec!(1.16) * (dec!(400.00) / dec!(1160.00)) * dec!(0.16);
        assert!(within_tolerance(figures.tax_amount, expected));
    }

    #[test]
    fn test_later_partialities_count_prior_payments() {
        let payments = vec![
            payment("pago-3", 20, dec!(300.00)),
            payment("pago-1", 1, dec!(400.00)),
            payment("pago-2", 10, dec!(100.00)),
        ];

        let figures = compute_figures(dec!(1160.00), &payments, &payments[0]);
        assert_eq!(figures.partiality, 3);
        assert_eq!(figures.prior_balance, dec!(660.00));
        assert_eq!(figures.remaining_balance, dec!(360.00));
    }

    #[test]
    fn test_full_payment_settles_stamped_total() {
        let full = payment("pago-1", 1, dec!(1160.00));

        let figures = compute_figures(dec!(1160.00), &[], &full);
        assert_eq!(figures.prior_balance, dec!(1160.00));
        assert_eq!(figures.remaining_balance, Decimal::ZERO);
        assert_eq!(fmt6(figures.tax_rate), "0.160000");
        assert_eq!(figures.tax_base, dec!(1000.000000));
        assert_eq!(figures.tax_amount, dec!(160.000000));
    }

    #[test]
    fn test_payment_document() {
        let mut origin = invoice();
        origin.payment_method = "PPD".into();
        origin.payment_form = "99".into();
        let first = payment("pago-1", 1, dec!(400.00));
        let figures = compute_figures(origin.total, std::slice::from_ref(&first), &first);
        let issued_at = NaiveDate::from_ymd_opt(2025, 4, 2)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap();

        let document = build_payment_document(&ComplementInput {
            invoice: &origin,
            origin_uuid: "5fb2822e-396d-4725-8521-cdc4bdd20ccf",
            payment: &first,
            figures: &figures,
            emitter: &emitter(),
            receiver: &receiver(),
            issued_at,
        });

        assert_eq!(document.attr("TipoDeComprobante"), Some("P"));
        assert_eq!(document.attr("Moneda"), Some("XXX"));
        assert_eq!(document.find("Receptor").unwrap().attr("UsoCFDI"), Some("CP01"));

        let docto = document.find("DoctoRelacionado").unwrap();
        assert_eq!(docto.attr("IdDocumento"), Some("5FB2822E-396D-4725-8521-CDC4BDD20CCF"));
        assert_eq!(docto.attr("NumParcialidad"), Some("1"));
        assert_eq!(docto.attr("ImpSaldoAnt"), Some("1160.00"));
        assert_eq!(docto.attr("ImpSaldoInsoluto"), Some("760.00"));
        assert_eq!(docto.find("TrasladoDR").unwrap().attr("ImporteDR"), Some("55.172414"));

        let totales = document.find("Totales").unwrap();
        assert_eq!(totales.attr("TotalTrasladosBaseIVA16"), Some("344.83"));
        assert_eq!(totales.attr("TotalTrasladosImpuestoIVA16"), Some("55.17"));
        assert_eq!(totales.attr("MontoTotalPagos"), Some("400.00"));

        let cadena = cadena_original_of(&document);
        assert!(cadena.contains(
            "|2.0|344.83|55.17|400.00|2025-04-01T12:00:00|03|MXN|1|400.00\
             |5FB2822E-396D-4725-8521-CDC4BDD20CCF|A|1001|MXN|1|1|1160.00|400.00|760.00|02\
             |344.827586|002|Tasa|0.160000|55.172414\
             |344.827586|002|Tasa|0.160000|55.172414||"
        ));
    }
}
