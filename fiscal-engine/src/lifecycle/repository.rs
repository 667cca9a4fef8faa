//! Storage collaborator
//!
//! The engine reads invoices, lines, parties and payments and writes fiscal
//! results through [`FiscalRepository`]; where the data lives is up to the
//! host. [`InMemoryRepository`] backs the CLI and the tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::{
    CancellationRecord, FiscalParty, FiscalState, InvoiceRecord, LastError, LineItem, Payment,
    PaymentComplement, StampingResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::error::RepositoryError;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait FiscalRepository: Send + Sync {
    async fn get_invoice(&self, invoice_id: &str) -> RepositoryResult<InvoiceRecord>;

    async fn get_line_items(&self, invoice_id: &str) -> RepositoryResult<Vec<LineItem>>;

    async fn get_party(&self, party_id: &str) -> RepositoryResult<FiscalParty>;

    async fn get_payment(&self, payment_id: &str) -> RepositoryResult<Payment>;

    async fn get_payments_for_invoice(&self, invoice_id: &str) -> RepositoryResult<Vec<Payment>>;

    /// Store the stamping result, move to `stamped` and clear the last error
    async fn persist_stamping_result(
        &self,
        invoice_id: &str,
        result: &StampingResult,
    ) -> RepositoryResult<()>;

    /// Store the cancellation and move to `cancelled`
    async fn persist_cancellation(
        &self,
        invoice_id: &str,
        record: &CancellationRecord,
    ) -> RepositoryResult<()>;

    /// Store the error and move to `error`; stamping fields are left alone
    async fn persist_error(&self, invoice_id: &str, error: &LastError) -> RepositoryResult<()>;

    /// Store the stamped complement and clear the payment's last error
    async fn persist_payment_complement(
        &self,
        payment_id: &str,
        complement: &PaymentComplement,
    ) -> RepositoryResult<()>;

    async fn persist_payment_error(&self, payment_id: &str, error: &LastError)
    -> RepositoryResult<()>;
}

/// In-memory storage
///
/// `fail_writes` makes every `persist_*` call fail, to exercise the
/// post-stamp persistence path.
#[derive(Default)]
pub struct InMemoryRepository {
    invoices: RwLock<HashMap<String, InvoiceRecord>>,
    line_items: RwLock<HashMap<String, Vec<LineItem>>>,
    parties: RwLock<HashMap<String, FiscalParty>>,
    payments: RwLock<HashMap<String, Payment>>,
    fail_writes: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_invoice(&self, invoice: InvoiceRecord, items: Vec<LineItem>) {
        self.line_items.write().insert(invoice.id.clone(), items);
        self.invoices.write().insert(invoice.id.clone(), invoice);
    }

    pub fn insert_party(&self, party: FiscalParty) {
        self.parties.write().insert(party.id.clone(), party);
    }

    pub fn insert_payment(&self, payment: Payment) {
        self.payments.write().insert(payment.id.clone(), payment);
    }

    /// Edit a stored invoice and its lines (host-side data corrections)
    pub fn update_invoice<F>(&self, invoice_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut InvoiceRecord),
    {
        match self.invoices.write().get_mut(invoice_id) {
            Some(invoice) => {
                f(invoice);
                true
            }
            None => false,
        }
    }

    pub fn update_party<F>(&self, party_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut FiscalParty),
    {
        match self.parties.write().get_mut(party_id) {
            Some(party) => {
                f(party);
                true
            }
            None => false,
        }
    }

    pub fn invoice(&self, invoice_id: &str) -> Option<InvoiceRecord> {
        self.invoices.read().get(invoice_id).cloned()
    }

    pub fn payment(&self, payment_id: &str) -> Option<Payment> {
        self.payments.read().get(payment_id).cloned()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> RepositoryResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Storage("storage is read-only".into()));
        }
        Ok(())
    }

    fn with_invoice<F>(&self, invoice_id: &str, f: F) -> RepositoryResult<()>
    where
        F: FnOnce(&mut InvoiceRecord),
    {
        self.check_writable()?;
        let mut invoices = self.invoices.write();
        let invoice = invoices
            .get_mut(invoice_id)
            .ok_or_else(|| RepositoryError::not_found("invoice", invoice_id))?;
        f(invoice);
        Ok(())
    }

    fn with_payment<F>(&self, payment_id: &str, f: F) -> RepositoryResult<()>
    where
        F: FnOnce(&mut Payment),
    {
        self.check_writable()?;
        let mut payments = self.payments.write();
        let payment = payments
            .get_mut(payment_id)
            .ok_or_else(|| RepositoryError::not_found("payment", payment_id))?;
        f(payment);
        Ok(())
    }
}

#[async_trait]
impl FiscalRepository for InMemoryRepository {
    async fn get_invoice(&self, invoice_id: &str) -> RepositoryResult<InvoiceRecord> {
        self.invoice(invoice_id)
            .ok_or_else(|| RepositoryError::not_found("invoice", invoice_id))
    }

    async fn get_line_items(&self, invoice_id: &str) -> RepositoryResult<Vec<LineItem>> {
        Ok(self
            .line_items
            .read()
            .get(invoice_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_party(&self, party_id: &str) -> RepositoryResult<FiscalParty> {
        self.parties
            .read()
            .get(party_id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("party", party_id))
    }

    async fn get_payment(&self, payment_id: &str) -> RepositoryResult<Payment> {
        self.payment(payment_id)
            .ok_or_else(|| RepositoryError::not_found("payment", payment_id))
    }

    async fn get_payments_for_invoice(&self, invoice_id: &str) -> RepositoryResult<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .payments
            .read()
            .values()
            .filter(|p| p.invoice_id == invoice_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| (a.paid_at, &a.id).cmp(&(b.paid_at, &b.id)));
        Ok(payments)
    }

    async fn persist_stamping_result(
        &self,
        invoice_id: &str,
        result: &StampingResult,
    ) -> RepositoryResult<()> {
        self.with_invoice(invoice_id, |invoice| {
            invoice.fiscal.state = FiscalState::Stamped;
            invoice.fiscal.stamping = Some(result.clone());
            invoice.fiscal.last_error = None;
        })
    }

    async fn persist_cancellation(
        &self,
        invoice_id: &str,
        record: &CancellationRecord,
    ) -> RepositoryResult<()> {
        self.with_invoice(invoice_id, |invoice| {
            invoice.fiscal.state = FiscalState::Cancelled;
            invoice.fiscal.cancellation = Some(record.clone());
        })
    }

    async fn persist_error(&self, invoice_id: &str, error: &LastError) -> RepositoryResult<()> {
        self.with_invoice(invoice_id, |invoice| {
            invoice.fiscal.state = FiscalState::Error;
            invoice.fiscal.last_error = Some(error.clone());
        })
    }

    async fn persist_payment_complement(
        &self,
        payment_id: &str,
        complement: &PaymentComplement,
    ) -> RepositoryResult<()> {
        self.with_payment(payment_id, |payment| {
            payment.complement = Some(complement.clone());
            payment.last_error = None;
        })
    }

    async fn persist_payment_error(
        &self,
        payment_id: &str,
        error: &LastError,
    ) -> RepositoryResult<()> {
        self.with_payment(payment_id, |payment| {
            payment.last_error = Some(error.clone());
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{draft, line};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use shared::{ClassifiedError, ErrorCode};

    fn repository() -> InMemoryRepository {
        let draft = draft();
        let repo = InMemoryRepository::new();
        repo.insert_invoice(draft.invoice, vec![line(dec!(1), dec!(1000))]);
        repo.insert_party(draft.emitter);
        repo.insert_party(draft.receiver);
        repo
    }

    #[tokio::test]
    async fn test_persist_error_keeps_stamping_fields() {
        let repo = repository();
        let err = ClassifiedError::new(ErrorCode::PacUnreachable, "timeout");

        repo.persist_error("factura-1", &LastError::from_classified(&err, Utc::now()))
            .await
            .unwrap();

        let invoice = repo.get_invoice("factura-1").await.unwrap();
        assert_eq!(invoice.state(), FiscalState::Error);
        assert!(invoice.fiscal.stamping.is_none());
        assert_eq!(invoice.fiscal.last_error.unwrap().code, ErrorCode::PacUnreachable);
    }

    #[tokio::test]
    async fn test_not_found_and_failed_writes() {
        let repo = repository();
        assert!(matches!(
            repo.get_party("nadie").await,
            Err(RepositoryError::NotFound { kind: "party", .. })
        ));

        repo.set_fail_writes(true);
        let err = ClassifiedError::new(ErrorCode::PacUnreachable, "timeout");
        let result = repo
            .persist_error("factura-1", &LastError::from_classified(&err, Utc::now()))
            .await;
        assert!(matches!(result, Err(RepositoryError::Storage(_))));
        assert_eq!(repo.invoice("factura-1").unwrap().state(), FiscalState::Draft);
    }
}
