//! Sample invoice data for unit tests

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::models::{Environment, FiscalData, FiscalParty, InvoiceRecord, LineItem};

use crate::validation::InvoiceDraft;

pub fn emitter() -> FiscalParty {
    FiscalParty {
        id: "emisor-1".into(),
        rfc: "EKU9003173C9".into(),
        name: "ESCUELA KEMPER URGATE".into(),
        tax_regime: "601".into(),
        postal_code: Some("42501".into()),
        cfdi_use: None,
    }
}

pub fn receiver() -> FiscalParty {
    FiscalParty {
        id: "receptor-1".into(),
        rfc: "URE180429TM6".into(),
        name: "UNIVERSIDAD ROBOTICA ESPAÑOLA".into(),
        tax_regime: "601".into(),
        postal_code: Some("86991".into()),
        cfdi_use: Some("G03".into()),
    }
}

pub fn line(quantity: Decimal, unit_price: Decimal) -> LineItem {
    LineItem {
        id: "linea-1".into(),
        product_id: Some("SKU-001".into()),
        sat_product_code: "01010101".into(),
        sat_unit_code: "H87".into(),
        unit_name: Some("Pieza".into()),
        description: "Servicio de consultoría".into(),
        quantity,
        unit_price,
        discount_percent: Decimal::ZERO,
    }
}

pub fn invoice() -> InvoiceRecord {
    InvoiceRecord {
        id: "factura-1".into(),
        series: Some("A".into()),
        folio: "1001".into(),
        issued_at: NaiveDate::from_ymd_opt(2025, 3, 14)
            .and_then(|d| d.and_hms_opt(10, 30, 0))
            .unwrap(),
        currency: "MXN".into(),
        exchange_rate: None,
        payment_form: "03".into(),
        payment_method: "PUE".into(),
        payment_terms: None,
        subtotal: dec!(1000.00),
        discount: Decimal::ZERO,
        tax: dec!(160.00),
        total: dec!(1160.00),
        emitter_id: "emisor-1".into(),
        receiver_id: "receptor-1".into(),
        environment: Environment::Test,
        related: None,
        fiscal: FiscalData::default(),
    }
}

/// Subtotal 1000.00, no discount, IVA 160.00, total 1160.00
pub fn draft() -> InvoiceDraft {
    InvoiceDraft {
        invoice: invoice(),
        items: vec![line(dec!(1), dec!(1000))],
        emitter: emitter(),
        receiver: receiver(),
    }
}
