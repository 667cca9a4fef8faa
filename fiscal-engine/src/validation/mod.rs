//! Invoice validation
//!
//! The [`Validator`] is the only way to obtain a [`ValidatedInvoice`]; the
//! XML builders and the orchestrator take that type and never re-check shape.
//!
//! Messages come out in a fixed order: required party fields, line presence,
//! line quantities and prices, totals reconciliation, payment codes. Catalog
//! and format checks follow those.

mod rfc;
mod totals;

pub use rfc::{RFC_GENERIC_FOREIGN, RFC_GENERIC_PUBLIC, is_generic_public, is_valid_rfc};
pub use totals::{Totals, line_tax};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use shared::Catalog;
use shared::models::{FiscalParty, InvoiceRecord, LineItem, Payment};
use shared::money::{IVA_RATE, round2, within_tolerance};

/// Currency that needs no exchange rate
pub const DOMESTIC_CURRENCY: &str = "MXN";
/// Payment form required by deferred-payment (PPD) invoices
pub const PAYMENT_FORM_TO_BE_DEFINED: &str = "99";

const AMOUNTS_OUT_OF_RANGE: &str = "Los importes de la factura exceden el máximo permitido";

/// Everything needed to build one invoice, as loaded from storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub invoice: InvoiceRecord,
    pub items: Vec<LineItem>,
    pub emitter: FiscalParty,
    pub receiver: FiscalParty,
}

/// An invoice that passed validation, with its recomputed totals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInvoice {
    draft: InvoiceDraft,
    totals: Totals,
}

impl ValidatedInvoice {
    pub fn invoice(&self) -> &InvoiceRecord {
        &self.draft.invoice
    }

    pub fn items(&self) -> &[LineItem] {
        &self.draft.items
    }

    pub fn emitter(&self) -> &FiscalParty {
        &self.draft.emitter
    }

    pub fn receiver(&self) -> &FiscalParty {
        &self.draft.receiver
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn into_draft(self) -> InvoiceDraft {
        self.draft
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Validator {
    catalog: &'static Catalog,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Catalog::sat())
    }
}

impl Validator {
    pub fn new(catalog: &'static Catalog) -> Self {
        Self { catalog }
    }

    /// Validate and, when no message is produced, promote the draft
    pub fn validate(&self, draft: InvoiceDraft) -> Result<ValidatedInvoice, Vec<String>> {
        let messages = self.messages(&draft);
        if !messages.is_empty() {
            return Err(messages);
        }
        let Some(totals) = Totals::from_items(&draft.items) else {
            return Err(vec![AMOUNTS_OUT_OF_RANGE.to_string()]);
        };
        Ok(ValidatedInvoice { draft, totals })
    }

    /// Ordered human-readable messages; empty means ready to stamp
    pub fn messages(&self, draft: &InvoiceDraft) -> Vec<String> {
        let mut messages = Vec::new();
        let InvoiceDraft {
            invoice,
            items,
            emitter,
            receiver,
        } = draft;

        // 1. Required party fields
        if is_blank(&emitter.rfc) {
            messages.push("El RFC del emisor es obligatorio".to_string());
        }
        if is_blank(&emitter.tax_regime) {
            messages.push("El régimen fiscal del emisor es obligatorio".to_string());
        }
        if is_blank(&receiver.rfc) {
            messages.push("El RFC del receptor es obligatorio".to_string());
        }
        if is_blank(&receiver.name) {
            messages.push("El nombre o razón social del receptor es obligatorio".to_string());
        }
        if is_blank_opt(&receiver.postal_code) {
            messages.push("El código postal del receptor es obligatorio".to_string());
        }
        if is_blank_opt(&receiver.cfdi_use) {
            messages.push("El uso CFDI del receptor es obligatorio".to_string());
        }

        // 2. At least one line
        if items.is_empty() {
            messages.push("La factura debe tener al menos un concepto".to_string());
        }

        // 3. Quantities and prices
        for (index, item) in items.iter().enumerate() {
            if item.quantity <= Decimal::ZERO {
                messages.push(format!("Concepto {}: la cantidad debe ser mayor a cero", index + 1));
            }
            if item.unit_price < Decimal::ZERO {
                messages.push(format!(
                    "Concepto {}: el precio unitario no puede ser negativo",
                    index + 1
                ));
            }
            if item.checked_subtotal().is_none() {
                messages.push(format!(
                    "Concepto {}: el importe excede el máximo permitido",
                    index + 1
                ));
            }
        }

        // 4. Declared totals against line-level recomputation
        if !items.is_empty() {
            match Totals::from_items(items) {
                Some(totals) => self.check_totals(invoice, &totals, &mut messages),
                None if items.iter().all(|i| i.checked_subtotal().is_some()) => {
                    messages.push(AMOUNTS_OUT_OF_RANGE.to_string());
                }
                None => {}
            }
        }

        // 5. Payment codes
        if is_blank(&invoice.payment_form) {
            messages.push("La forma de pago es obligatoria".to_string());
        }
        if is_blank(&invoice.payment_method) {
            messages.push("El método de pago es obligatorio".to_string());
        }

        // Catalog and format checks
        self.check_parties(emitter, receiver, &mut messages);
        self.check_invoice_codes(invoice, &mut messages);
        for (index, item) in items.iter().enumerate() {
            check_item_fields(index + 1, item, &mut messages);
        }

        messages
    }

    /// Checks for a payment before its complement is built
    pub fn payment_messages(
        &self,
        payment: &Payment,
        emitter: &FiscalParty,
        receiver: &FiscalParty,
    ) -> Vec<String> {
        let mut messages = Vec::new();

        if is_blank(&emitter.rfc) {
            messages.push("El RFC del emisor es obligatorio".to_string());
        }
        if is_blank(&emitter.tax_regime) {
            messages.push("El régimen fiscal del emisor es obligatorio".to_string());
        }
        if is_blank(&receiver.rfc) {
            messages.push("El RFC del receptor es obligatorio".to_string());
        }
        if is_blank(&receiver.name) {
            messages.push("El nombre o razón social del receptor es obligatorio".to_string());
        }
        if is_blank_opt(&receiver.postal_code) {
            messages.push("El código postal del receptor es obligatorio".to_string());
        }
        if payment.amount <= Decimal::ZERO {
            messages.push("El monto del pago debe ser mayor a cero".to_string());
        }
        if !self.catalog.is_payment_form(&payment.payment_form) {
            messages.push(format!("Forma de pago desconocida: {}", payment.payment_form));
        } else if payment.payment_form == PAYMENT_FORM_TO_BE_DEFINED {
            messages.push("Un pago no puede registrarse con forma de pago 99".to_string());
        }

        self.check_parties(emitter, receiver, &mut messages);
        messages
    }

    fn check_totals(&self, invoice: &InvoiceRecord, computed: &Totals, messages: &mut Vec<String>) {
        let pairs = [
            ("subtotal", invoice.subtotal, computed.subtotal),
            ("descuento", invoice.discount, computed.discount),
            ("IVA", invoice.tax, computed.tax),
            ("total", invoice.total, computed.total),
        ];
        for (field, declared, expected) in pairs {
            if !within_tolerance(declared, expected) {
                messages.push(format!(
                    "El {} declarado ({}) no coincide con el calculado ({})",
                    field,
                    round2(declared),
                    expected
                ));
            }
        }

        let declared_base = invoice.subtotal.checked_sub(invoice.discount);
        let Some(declared_total) = declared_base.and_then(|b| b.checked_add(invoice.tax)) else {
            messages.push(AMOUNTS_OUT_OF_RANGE.to_string());
            return;
        };
        if !within_tolerance(invoice.total, declared_total) {
            messages.push(format!(
                "El total ({}) debe ser subtotal - descuento + IVA ({})",
                round2(invoice.total),
                round2(declared_total)
            ));
        }

        let Some(expected_tax) = declared_base.and_then(|b| b.checked_mul(IVA_RATE)).map(round2)
        else {
            messages.push(AMOUNTS_OUT_OF_RANGE.to_string());
            return;
        };
        if !within_tolerance(invoice.tax, expected_tax) {
            messages.push(format!(
                "El IVA ({}) debe ser el 16% del subtotal con descuento ({})",
                round2(invoice.tax),
                expected_tax
            ));
        }
    }

    fn check_parties(
        &self,
        emitter: &FiscalParty,
        receiver: &FiscalParty,
        messages: &mut Vec<String>,
    ) {
        if !is_blank(&emitter.rfc) && !is_valid_rfc(&emitter.rfc) {
            messages.push(format!("RFC del emisor inválido: {}", emitter.rfc));
        }
        if !is_blank(&emitter.tax_regime) && !self.catalog.is_tax_regime(&emitter.tax_regime) {
            messages.push(format!("Régimen fiscal del emisor desconocido: {}", emitter.tax_regime));
        }
        match emitter.postal_code.as_deref() {
            None | Some("") => {
                messages.push("El código postal de expedición es obligatorio".to_string())
            }
            Some(cp) if !is_postal_code(cp) => {
                messages.push(format!("Código postal de expedición inválido: {}", cp))
            }
            _ => {}
        }

        if !is_blank(&receiver.rfc) && !is_valid_rfc(&receiver.rfc) {
            messages.push(format!("RFC del receptor inválido: {}", receiver.rfc));
        }
        if is_blank(&receiver.tax_regime) {
            messages.push("El régimen fiscal del receptor es obligatorio".to_string());
        } else if !self.catalog.is_tax_regime(&receiver.tax_regime) {
            messages.push(format!(
                "Régimen fiscal del receptor desconocido: {}",
                receiver.tax_regime
            ));
        }
        if let Some(cp) = receiver.postal_code.as_deref()
            && !cp.is_empty()
            && !is_postal_code(cp)
        {
            messages.push(format!("Código postal del receptor inválido: {}", cp));
        }
        if let Some(usage) = receiver.cfdi_use.as_deref()
            && !usage.is_empty()
            && !self.catalog.is_cfdi_use(usage)
        {
            messages.push(format!("Uso CFDI desconocido: {}", usage));
        }
    }

    fn check_invoice_codes(&self, invoice: &InvoiceRecord, messages: &mut Vec<String>) {
        if is_blank(&invoice.folio) {
            messages.push("El folio es obligatorio".to_string());
        }
        if !is_blank(&invoice.payment_form) && !self.catalog.is_payment_form(&invoice.payment_form)
        {
            messages.push(format!("Forma de pago desconocida: {}", invoice.payment_form));
        }
        if !is_blank(&invoice.payment_method)
            && !self.catalog.is_payment_method(&invoice.payment_method)
        {
            messages.push(format!("Método de pago desconocido: {}", invoice.payment_method));
        }
        if invoice.is_deferred_payment() && invoice.payment_form != PAYMENT_FORM_TO_BE_DEFINED {
            messages.push("Las facturas PPD deben usar la forma de pago 99".to_string());
        }

        if !self.catalog.is_invoice_currency(&invoice.currency) {
            messages.push(format!("Moneda desconocida: {}", invoice.currency));
        } else if invoice.currency != DOMESTIC_CURRENCY {
            match invoice.exchange_rate {
                Some(rate) if rate > Decimal::ZERO => {}
                _ => messages.push(format!(
                    "El tipo de cambio es obligatorio para la moneda {}",
                    invoice.currency
                )),
            }
        }

        if let Some(related) = &invoice.related {
            if !self.catalog.is_relation_type(&related.relation_type) {
                messages.push(format!("Tipo de relación desconocido: {}", related.relation_type));
            }
            if related.uuids.is_empty() || related.uuids.iter().any(|u| is_blank(u)) {
                messages.push("Los CFDI relacionados requieren al menos un UUID".to_string());
            }
        }
    }
}

fn check_item_fields(position: usize, item: &LineItem, messages: &mut Vec<String>) {
    if item.sat_product_code.len() != 8 || !item.sat_product_code.chars().all(|c| c.is_ascii_digit())
    {
        messages.push(format!(
            "Concepto {}: clave de producto o servicio inválida: {}",
            position, item.sat_product_code
        ));
    }
    if is_blank(&item.sat_unit_code) {
        messages.push(format!("Concepto {}: la clave de unidad es obligatoria", position));
    }
    if is_blank(&item.description) {
        messages.push(format!("Concepto {}: la descripción es obligatoria", position));
    }
    if item.discount_percent < Decimal::ZERO || item.discount_percent > dec!(100) {
        messages.push(format!(
            "Concepto {}: el descuento debe estar entre 0 y 100%",
            position
        ));
    }
}

fn is_postal_code(value: &str) -> bool {
    value.len() == 5 && value.chars().all(|c| c.is_ascii_digit())
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn is_blank_opt(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(is_blank)
}

#[cfg(test)]
mod tests;
