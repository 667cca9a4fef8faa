//! Fiscal lifecycle orchestrator
//!
//! ```text
//! draft ──stamp ok──▶ stamped ──cancel ok──▶ cancelled
//!   │                   │ ▲
//!   │ stamp failed      │ └── cancel failed (unchanged)
//!   ▼                   │
//! error ──retry──▶ (draft) ──stamp──▶ stamped | error
//! ```
//!
//! Every state guard runs before any credential, signing or PAC work. The
//! engine holds no mutable state; concurrent calls for the same invoice are
//! kept apart by the guards and by the PAC's own duplicate detection.

use chrono::{NaiveDateTime, Utc};
use csd_cert::CsdSigner;
use pac_client::{CancelRequest, PacClient, StampReceipt, StatusQuery};
use rust_decimal::Decimal;
use shared::models::{
    CancellationReason, CancellationRecord, ComplementFigures, Environment, FiscalParty,
    FiscalState, InvoiceRecord, LastError, Payment, PaymentComplement, StampingResult,
};
use shared::xml::XmlNode;
use shared::Catalog;
use tracing::{error, info, instrument, warn};

use super::classifier::classify_pac;
use super::credentials::CredentialsProvider;
use super::error::{EngineError, EngineResult};
use super::outcome::{CancelOutcome, LiveStatus, PreviewReport, StampOutcome, StatusReport};
use super::repository::FiscalRepository;
use crate::cfdi::{
    ComplementInput, SealedDocument, build_invoice, build_payment_document, compute_figures,
    seal_document,
};
use crate::validation::{InvoiceDraft, Totals, Validator};

pub struct FiscalEngine<R, C, P> {
    repository: R,
    credentials: C,
    pac: P,
    validator: Validator,
}

impl<R, C, P> FiscalEngine<R, C, P>
where
    R: FiscalRepository,
    C: CredentialsProvider,
    P: PacClient,
{
    pub fn new(repository: R, credentials: C, pac: P) -> Self {
        Self::with_catalog(repository, credentials, pac, Catalog::sat())
    }

    pub fn with_catalog(repository: R, credentials: C, pac: P, catalog: &'static Catalog) -> Self {
        Self {
            repository,
            credentials,
            pac,
            validator: Validator::new(catalog),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn pac(&self) -> &P {
        &self.pac
    }

    // ========== Preview ==========

    /// Validate and build the unsigned XML without touching credentials or the PAC
    pub async fn preview(&self, invoice_id: &str) -> EngineResult<PreviewReport> {
        let invoice = self.repository.get_invoice(invoice_id).await?;
        let draft = self.load_draft(invoice).await?;
        let totals = Totals::from_items(&draft.items);

        let report = match self.validator.validate(draft) {
            Ok(validated) => PreviewReport {
                messages: Vec::new(),
                totals,
                xml: Some(build_invoice(&validated).render()?),
            },
            Err(messages) => PreviewReport {
                messages,
                totals,
                xml: None,
            },
        };
        Ok(report)
    }

    // ========== Stamp / Retry ==========

    /// Stamp a `draft` invoice
    #[instrument(skip(self), fields(operation = "stamp"))]
    pub async fn stamp(&self, invoice_id: &str) -> EngineResult<StampOutcome> {
        let invoice = self.repository.get_invoice(invoice_id).await?;
        if invoice.state() != FiscalState::Draft {
            return Err(EngineError::state_conflict(invoice_id, invoice.state(), "stamp"));
        }
        self.stamp_invoice(invoice).await
    }

    /// Re-run the full pipeline for an `error` (or untouched `draft`) invoice
    /// against its current data
    #[instrument(skip(self), fields(operation = "retry"))]
    pub async fn retry(&self, invoice_id: &str) -> EngineResult<StampOutcome> {
        let invoice = self.repository.get_invoice(invoice_id).await?;
        match invoice.state() {
            FiscalState::Error | FiscalState::Draft => self.stamp_invoice(invoice).await,
            state => Err(EngineError::state_conflict(invoice_id, state, "retry")),
        }
    }

    async fn stamp_invoice(&self, invoice: InvoiceRecord) -> EngineResult<StampOutcome> {
        let invoice_id = invoice.id.clone();
        info!(invoice_id = %invoice_id, folio = %invoice.display_folio(), "Stamping invoice");

        let sealed = match self.seal_invoice(invoice).await {
            Ok(sealed) => sealed,
            Err(e) => return Err(self.record_invoice_error(&invoice_id, e).await),
        };

        let receipt = match self.pac.stamp(&sealed.signed_xml).await {
            Ok(receipt) => receipt,
            Err(e) => return Err(self.record_invoice_error(&invoice_id, e.into()).await),
        };

        let result = stamping_result(sealed, receipt);
        info!(invoice_id = %invoice_id, uuid = %result.uuid, "Invoice stamped");

        let warning = match self
            .repository
            .persist_stamping_result(&invoice_id, &result)
            .await
        {
            Ok(()) => None,
            Err(e) => {
                error!(
                    invoice_id = %invoice_id,
                    uuid = %result.uuid,
                    error = %e,
                    "Stamped at the PAC but the result could not be saved; reconcile required"
                );
                Some(EngineError::from(e).classify())
            }
        };

        Ok(StampOutcome {
            uuid: result.uuid.clone(),
            stamped_at: result.stamped_at,
            result,
            figures: None,
            warning,
        })
    }

    /// Validate, build and seal
    async fn seal_invoice(&self, invoice: InvoiceRecord) -> EngineResult<SealedDocument> {
        let environment = invoice.environment;
        let issued_at = invoice.issued_at;
        let draft = self.load_draft(invoice).await?;
        let validated = self
            .validator
            .validate(draft)
            .map_err(EngineError::Validation)?;

        let signer = self
            .unlock_signer(validated.emitter(), environment, issued_at)
            .await?;
        Ok(seal_document(build_invoice(&validated), &signer)?)
    }

    /// Persist a pipeline failure and hand it back to the caller
    async fn record_invoice_error(&self, invoice_id: &str, err: EngineError) -> EngineError {
        if matches!(err, EngineError::NotFound { .. }) {
            return err;
        }
        let classified = err.classify();
        warn!(
            invoice_id = %invoice_id,
            code = %classified.code,
            raw_code = ?classified.raw_code,
            error = %err,
            "Stamping failed"
        );

        let last_error = LastError::from_classified(&classified, Utc::now());
        if let Err(e) = self.repository.persist_error(invoice_id, &last_error).await {
            error!(invoice_id = %invoice_id, error = %e, "Failed to persist stamping error");
        }
        err
    }

    // ========== Cancel ==========

    /// Cancel a `stamped` invoice. A failure leaves the invoice `stamped`.
    #[instrument(skip(self, reason, substitute_uuid), fields(operation = "cancel", reason = %reason))]
    pub async fn cancel(
        &self,
        invoice_id: &str,
        reason: CancellationReason,
        substitute_uuid: Option<String>,
    ) -> EngineResult<CancelOutcome> {
        let invoice = self.repository.get_invoice(invoice_id).await?;
        let uuid = match (invoice.state(), invoice.fiscal.uuid()) {
            (FiscalState::Stamped, Some(uuid)) => uuid.to_string(),
            (state, _) => return Err(EngineError::state_conflict(invoice_id, state, "cancel")),
        };

        let emitter = self.repository.get_party(&invoice.emitter_id).await?;
        let request = CancelRequest::new(uuid, emitter.normalized_rfc(), reason, substitute_uuid)?;

        let receipt = self.pac.cancel(&request).await.inspect_err(|e| {
            warn!(invoice_id = %invoice_id, uuid = %request.uuid, error = %e, "Cancellation failed");
        })?;

        let record = CancellationRecord {
            reason,
            substitute_uuid: request.substitute_uuid.clone(),
            acknowledgement: receipt.acknowledgement.clone(),
            status: receipt.status.clone(),
            cancelled_at: receipt.cancelled_at,
        };
        info!(invoice_id = %invoice_id, uuid = %request.uuid, "Invoice cancelled");

        let warning = match self.repository.persist_cancellation(invoice_id, &record).await {
            Ok(()) => None,
            Err(e) => {
                error!(
                    invoice_id = %invoice_id,
                    uuid = %request.uuid,
                    error = %e,
                    "Cancelled at the PAC but the record could not be saved"
                );
                Some(EngineError::from(e).classify())
            }
        };

        Ok(CancelOutcome {
            acknowledgement: receipt.acknowledgement,
            cancelled_at: receipt.cancelled_at,
            warning,
        })
    }

    // ========== Status ==========

    /// Local state plus the live SAT status when the invoice has a UUID.
    /// Never writes.
    pub async fn query_status(&self, invoice_id: &str) -> EngineResult<StatusReport> {
        let invoice = self.repository.get_invoice(invoice_id).await?;
        let Some(uuid) = invoice.fiscal.uuid().map(str::to_string) else {
            return Ok(StatusReport {
                invoice_id: invoice.id,
                local_state: invoice.fiscal.state,
                uuid: None,
                live: None,
            });
        };

        let emitter = self.repository.get_party(&invoice.emitter_id).await?;
        let receiver = self.repository.get_party(&invoice.receiver_id).await?;
        let total = invoice
            .fiscal
            .stamping
            .as_ref()
            .and_then(|s| stamped_total(&s.stamped_xml))
            .unwrap_or(invoice.total);

        let query = StatusQuery {
            uuid: uuid.clone(),
            emitter_rfc: emitter.normalized_rfc(),
            receiver_rfc: receiver.normalized_rfc(),
            total,
        };
        let live = match self.pac.query_status(&query).await {
            Ok(status) => LiveStatus::Reported(status),
            Err(e) if e.is_retriable() => {
                warn!(invoice_id = %invoice_id, uuid = %uuid, error = %e, "SAT status unavailable");
                LiveStatus::Unavailable(classify_pac(&e))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(StatusReport {
            invoice_id: invoice.id,
            local_state: invoice.fiscal.state,
            uuid: Some(uuid),
            live: Some(live),
        })
    }

    // ========== Payment complement ==========

    /// Stamp the Pagos 2.0 complement for one payment
    #[instrument(skip(self), fields(operation = "payment_complement"))]
    pub async fn issue_payment_complement(&self, payment_id: &str) -> EngineResult<StampOutcome> {
        let payment = self.repository.get_payment(payment_id).await?;
        if let Some(uuid) = payment.complement_uuid() {
            return Err(EngineError::ComplementAlreadyIssued {
                payment_id: payment.id.clone(),
                uuid: uuid.to_string(),
            });
        }

        let invoice = self.repository.get_invoice(&payment.invoice_id).await?;
        let origin_uuid = match (invoice.state(), invoice.fiscal.uuid()) {
            (FiscalState::Stamped, Some(uuid)) => uuid.to_string(),
            (state, _) => {
                return Err(EngineError::OriginNotStamped {
                    invoice_id: invoice.id,
                    state,
                });
            }
        };
        if !invoice.is_deferred_payment() {
            return Err(EngineError::NotDeferredPayment(invoice.id));
        }

        let payments = self.repository.get_payments_for_invoice(&invoice.id).await?;
        let origin_total = self.origin_total(&invoice).await?;
        let figures = compute_figures(origin_total, &payments, &payment);
        if figures.remaining_balance < Decimal::ZERO {
            return Err(EngineError::PaymentExceedsBalance {
                amount: figures.amount,
                balance: figures.prior_balance,
            });
        }

        info!(
            payment_id = %payment_id,
            invoice_id = %invoice.id,
            partiality = figures.partiality,
            "Issuing payment complement"
        );

        let sealed = match self
            .seal_payment(&invoice, &origin_uuid, &payment, &figures)
            .await
        {
            Ok(sealed) => sealed,
            Err(e) => return Err(self.record_payment_error(payment_id, e).await),
        };
        let receipt = match self.pac.stamp(&sealed.signed_xml).await {
            Ok(receipt) => receipt,
            Err(e) => return Err(self.record_payment_error(payment_id, e.into()).await),
        };

        let complement = PaymentComplement {
            figures: figures.clone(),
            stamping: stamping_result(sealed, receipt),
        };
        info!(payment_id = %payment_id, uuid = %complement.stamping.uuid, "Payment complement stamped");

        let warning = match self
            .repository
            .persist_payment_complement(payment_id, &complement)
            .await
        {
            Ok(()) => None,
            Err(e) => {
                error!(
                    payment_id = %payment_id,
                    uuid = %complement.stamping.uuid,
                    error = %e,
                    "Complement stamped but could not be saved"
                );
                Some(EngineError::from(e).classify())
            }
        };

        Ok(StampOutcome {
            uuid: complement.stamping.uuid.clone(),
            stamped_at: complement.stamping.stamped_at,
            result: complement.stamping,
            figures: Some(figures),
            warning,
        })
    }

    async fn seal_payment(
        &self,
        invoice: &InvoiceRecord,
        origin_uuid: &str,
        payment: &Payment,
        figures: &ComplementFigures,
    ) -> EngineResult<SealedDocument> {
        let emitter = self.repository.get_party(&invoice.emitter_id).await?;
        let receiver = self.repository.get_party(&invoice.receiver_id).await?;

        let messages = self.validator.payment_messages(payment, &emitter, &receiver);
        if !messages.is_empty() {
            return Err(EngineError::Validation(messages));
        }

        let issued_at = Utc::now().naive_utc();
        let signer = self
            .unlock_signer(&emitter, invoice.environment, issued_at)
            .await?;
        let document = build_payment_document(&ComplementInput {
            invoice,
            origin_uuid,
            payment,
            figures,
            emitter: &emitter,
            receiver: &receiver,
            issued_at,
        });
        Ok(seal_document(document, &signer)?)
    }

    async fn record_payment_error(&self, payment_id: &str, err: EngineError) -> EngineError {
        let classified = err.classify();
        warn!(
            payment_id = %payment_id,
            code = %classified.code,
            raw_code = ?classified.raw_code,
            error = %err,
            "Payment complement failed"
        );

        let last_error = LastError::from_classified(&classified, Utc::now());
        if let Err(e) = self
            .repository
            .persist_payment_error(payment_id, &last_error)
            .await
        {
            error!(payment_id = %payment_id, error = %e, "Failed to persist complement error");
        }
        err
    }

    // ========== Reconcile ==========

    /// Persist a stamping result returned with a warning. Idempotent for the
    /// same UUID; refuses to overwrite a different one.
    #[instrument(skip(self, result), fields(operation = "reconcile", uuid = %result.uuid))]
    pub async fn reconcile(&self, invoice_id: &str, result: StampingResult) -> EngineResult<()> {
        let invoice = self.repository.get_invoice(invoice_id).await?;
        match (invoice.state(), invoice.fiscal.uuid()) {
            (FiscalState::Stamped, Some(uuid)) if uuid.eq_ignore_ascii_case(&result.uuid) => {
                return Ok(());
            }
            (FiscalState::Draft | FiscalState::Error, _) => {}
            (state, _) => return Err(EngineError::state_conflict(invoice_id, state, "reconcile")),
        }

        self.repository
            .persist_stamping_result(invoice_id, &result)
            .await?;
        info!(invoice_id = %invoice_id, uuid = %result.uuid, "Stamping result reconciled");
        Ok(())
    }

    // ========== Helpers ==========

    /// Total as stamped; recomputed from the lines when the stamped XML
    /// carries none
    async fn origin_total(&self, invoice: &InvoiceRecord) -> EngineResult<Decimal> {
        let stamped = invoice
            .fiscal
            .stamping
            .as_ref()
            .and_then(|s| stamped_total(&s.stamped_xml));
        if let Some(total) = stamped {
            return Ok(total);
        }
        let items = self.repository.get_line_items(&invoice.id).await?;
        Ok(Totals::from_items(&items).map_or(invoice.total, |t| t.total))
    }

    async fn load_draft(&self, invoice: InvoiceRecord) -> EngineResult<InvoiceDraft> {
        let items = self.repository.get_line_items(&invoice.id).await?;
        let emitter = self.repository.get_party(&invoice.emitter_id).await?;
        let receiver = self.repository.get_party(&invoice.receiver_id).await?;
        Ok(InvoiceDraft {
            invoice,
            items,
            emitter,
            receiver,
        })
    }

    /// Fetch, unlock and check the emitter's CSD for a document dated `issued_at`
    async fn unlock_signer(
        &self,
        emitter: &FiscalParty,
        environment: Environment,
        issued_at: NaiveDateTime,
    ) -> EngineResult<CsdSigner> {
        let rfc = emitter.normalized_rfc();
        let credential = self
            .credentials
            .active_certificate(&rfc, environment)
            .await?;
        let signer = credential.unlock()?;

        if !signer.metadata().belongs_to(&rfc) {
            return Err(EngineError::CertificateRfcMismatch {
                certificate_number: signer.certificate_number().to_string(),
                expected: rfc,
            });
        }
        signer.metadata().ensure_valid_at(issued_at)?;
        Ok(signer)
    }
}

fn stamping_result(sealed: SealedDocument, receipt: StampReceipt) -> StampingResult {
    StampingResult {
        uuid: receipt.uuid,
        stamped_xml: receipt.stamped_xml,
        unsigned_xml: sealed.unsigned_xml,
        cadena_original: sealed.cadena_original,
        seal: sealed.seal,
        certificate_number: sealed.certificate_number,
        pac_seal: receipt.pac_seal,
        pac_certificate_number: receipt.pac_certificate_number,
        stamped_at: receipt.stamped_at,
    }
}

/// `Total` as written in the stamped document
fn stamped_total(xml: &str) -> Option<Decimal> {
    XmlNode::parse(xml).ok()?.attr("Total")?.parse().ok()
}
