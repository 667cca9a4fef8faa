use super::*;
use crate::fixtures::{draft, line};
use shared::models::RelatedCfdi;

fn validator() -> Validator {
    Validator::default()
}

#[test]
fn test_valid_invoice_has_no_messages() {
    let messages = validator().messages(&draft());
    assert!(messages.is_empty(), "{:?}", messages);

    let validated = validator().validate(draft()).expect("valid");
    assert_eq!(validated.totals().total, dec!(1160.00));
    assert_eq!(validated.totals().tax, dec!(160.00));
}

#[test]
fn test_totals_within_one_cent_are_accepted() {
    let mut draft = draft();
    draft.invoice.tax = dec!(160.01);
    draft.invoice.total = dec!(1160.01);
    assert!(validator().messages(&draft).is_empty());
}

#[test]
fn test_totals_off_by_more_than_one_cent() {
    let mut draft = draft();
    draft.invoice.total = dec!(1160.02);

    let messages = validator().messages(&draft);
    assert_eq!(messages.len(), 2, "{:?}", messages);
    assert!(messages[0].contains("total declarado"));
    assert!(messages[1].contains("subtotal - descuento + IVA"));
}

#[test]
fn test_missing_party_fields_come_first() {
    let mut draft = draft();
    draft.items.clear();
    draft.receiver.name = "  ".into();
    draft.receiver.cfdi_use = None;
    draft.invoice.payment_method = String::new();

    let messages = validator().messages(&draft);
    assert_eq!(
        messages[..4],
        [
            "El nombre o razón social del receptor es obligatorio".to_string(),
            "El uso CFDI del receptor es obligatorio".to_string(),
            "La factura debe tener al menos un concepto".to_string(),
            "El método de pago es obligatorio".to_string(),
        ]
    );
}

#[test]
fn test_line_quantity_and_price() {
    let mut draft = draft();
    draft.items = vec![line(dec!(0), dec!(1000)), line(dec!(1), dec!(-5))];

    let messages = validator().messages(&draft);
    assert_eq!(messages[0], "Concepto 1: la cantidad debe ser mayor a cero");
    assert_eq!(messages[1], "Concepto 2: el precio unitario no puede ser negativo");
}

#[test]
fn test_oversized_line_is_a_message() {
    let mut draft = draft();
    draft.items = vec![
        line(dec!(1), dec!(1000)),
        line(dec!(1000000000000000), dec!(1000000000000000)),
    ];

    let messages = validator().messages(&draft);
    assert_eq!(messages, vec!["Concepto 2: el importe excede el máximo permitido"]);
    assert!(validator().validate(draft).is_err());
}

#[test]
fn test_line_sum_out_of_range() {
    let big = dec!(50000000000000000000000000000);
    let mut draft = draft();
    draft.items = vec![line(dec!(1), big), line(dec!(1), big)];

    let messages = validator().validate(draft).unwrap_err();
    assert_eq!(
        messages,
        vec!["Los importes de la factura exceden el máximo permitido"]
    );
}

#[test]
fn test_catalog_and_format_checks() {
    let mut draft = draft();
    draft.emitter.rfc = "EKU9003173C".into();
    draft.receiver.cfdi_use = Some("Z99".into());
    draft.receiver.postal_code = Some("8699".into());
    draft.items[0].discount_percent = dec!(120);
    draft.items[0].sat_product_code = "0101".into();

    let messages = validator().messages(&draft);
    assert!(messages.iter().any(|m| m.contains("RFC del emisor inválido")));
    assert!(messages.iter().any(|m| m.contains("Uso CFDI desconocido: Z99")));
    assert!(messages.iter().any(|m| m.contains("Código postal del receptor inválido")));
    assert!(messages.iter().any(|m| m.contains("entre 0 y 100%")));
    assert!(messages.iter().any(|m| m.contains("clave de producto")));
}

#[test]
fn test_foreign_currency_needs_exchange_rate() {
    let mut draft = draft();
    draft.invoice.currency = "USD".into();
    let messages = validator().messages(&draft);
    assert_eq!(messages, vec!["El tipo de cambio es obligatorio para la moneda USD"]);

    draft.invoice.exchange_rate = Some(dec!(17.0512));
    assert!(validator().messages(&draft).is_empty());
}

#[test]
fn test_deferred_payment_requires_form_99() {
    let mut draft = draft();
    draft.invoice.payment_method = "PPD".into();
    let messages = validator().messages(&draft);
    assert_eq!(messages, vec!["Las facturas PPD deben usar la forma de pago 99"]);

    draft.invoice.payment_form = "99".into();
    assert!(validator().messages(&draft).is_empty());
}

#[test]
fn test_related_cfdi_checks() {
    let mut draft = draft();
    draft.invoice.related = Some(RelatedCfdi {
        relation_type: "09".into(),
        uuids: vec![],
    });

    let messages = validator().messages(&draft);
    assert_eq!(messages.len(), 2);
}

#[test]
fn test_validate_returns_messages() {
    let mut draft = draft();
    draft.receiver.rfc = String::new();
    let messages = validator().validate(draft).unwrap_err();
    assert_eq!(messages, vec!["El RFC del receptor es obligatorio"]);
}
