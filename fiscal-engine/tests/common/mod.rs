//! Shared fixtures for the lifecycle tests: sample data and a scripted PAC

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use csd_cert::testing::{RFC, valid_csd};
use fiscal_engine::{FiscalEngine, InMemoryRepository, StaticCredentials};
use pac_client::{
    CancelReceipt, CancelRequest, PacClient, PacError, PacResult, SatDocumentState, SatStatus,
    StampReceipt, StatusQuery,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::models::{Environment, FiscalData, FiscalParty, InvoiceRecord, LineItem, Payment};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const INVOICE_ID: &str = "factura-1";
pub const EMITTER_ID: &str = "emisor-1";
pub const RECEIVER_ID: &str = "receptor-1";

pub type TestEngine = FiscalEngine<InMemoryRepository, StaticCredentials, Arc<ScriptedPac>>;

pub fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, 0, 0))
        .unwrap()
}

pub fn emitter() -> FiscalParty {
    FiscalParty {
        id: EMITTER_ID.into(),
        rfc: RFC.into(),
        name: "ESCUELA KEMPER URGATE".into(),
        tax_regime: "601".into(),
        postal_code: Some("42501".into()),
        cfdi_use: None,
    }
}

pub fn receiver() -> FiscalParty {
    FiscalParty {
        id: RECEIVER_ID.into(),
        rfc: "URE180429TM6".into(),
        name: "UNIVERSIDAD ROBOTICA ESPAÑOLA".into(),
        tax_regime: "601".into(),
        postal_code: Some("86991".into()),
        cfdi_use: Some("G03".into()),
    }
}

pub fn line() -> LineItem {
    LineItem {
        id: "linea-1".into(),
        product_id: Some("SKU-001".into()),
        sat_product_code: "01010101".into(),
        sat_unit_code: "H87".into(),
        unit_name: Some("Pieza".into()),
        description: "Servicio de consultoría".into(),
        quantity: dec!(1),
        unit_price: dec!(1000),
        discount_percent: Decimal::ZERO,
    }
}

/// Subtotal 1000.00, IVA 160.00, total 1160.00, paid in one exhibition
pub fn invoice() -> InvoiceRecord {
    InvoiceRecord {
        id: INVOICE_ID.into(),
        series: Some("A".into()),
        folio: "1001".into(),
        issued_at: at(2025, 3, 14, 10),
        currency: "MXN".into(),
        exchange_rate: None,
        payment_form: "03".into(),
        payment_method: "PUE".into(),
        payment_terms: None,
        subtotal: dec!(1000.00),
        discount: Decimal::ZERO,
        tax: dec!(160.00),
        total: dec!(1160.00),
        emitter_id: EMITTER_ID.into(),
        receiver_id: RECEIVER_ID.into(),
        environment: Environment::Test,
        related: None,
        fiscal: FiscalData::default(),
    }
}

/// Same figures, paid in installments
pub fn deferred_invoice() -> InvoiceRecord {
    InvoiceRecord {
        payment_form: "99".into(),
        payment_method: "PPD".into(),
        ..invoice()
    }
}

pub fn payment(id: &str, amount: Decimal, paid_at: NaiveDateTime) -> Payment {
    Payment {
        id: id.into(),
        invoice_id: INVOICE_ID.into(),
        paid_at,
        amount,
        payment_form: "03".into(),
        operation_number: None,
        complement: None,
        last_error: None,
    }
}

pub fn repository_with(invoice: InvoiceRecord) -> InMemoryRepository {
    let repository = InMemoryRepository::new();
    repository.insert_invoice(invoice, vec![line()]);
    repository.insert_party(emitter());
    repository.insert_party(receiver());
    repository
}

pub fn credentials() -> StaticCredentials {
    StaticCredentials::new().with(RFC, Environment::Test, valid_csd().credential())
}

pub fn engine_with(invoice: InvoiceRecord) -> (TestEngine, Arc<ScriptedPac>) {
    let pac = Arc::new(ScriptedPac::default());
    let engine = FiscalEngine::new(repository_with(invoice), credentials(), pac.clone());
    (engine, pac)
}

/// PAC double that counts calls and replays queued results.
///
/// With nothing queued, stamps succeed with sequential UUIDs, cancels are
/// acknowledged and status lookups report the document as active.
#[derive(Default)]
pub struct ScriptedPac {
    stamp_results: Mutex<VecDeque<PacResult<StampReceipt>>>,
    uuids: Mutex<VecDeque<String>>,
    cancel_results: Mutex<VecDeque<PacResult<CancelReceipt>>>,
    status_results: Mutex<VecDeque<PacResult<SatStatus>>>,
    stamped: Mutex<Vec<String>>,
    cancel_requests: Mutex<Vec<CancelRequest>>,
    stamp_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl ScriptedPac {
    /// UUID for the next successful stamp
    pub fn next_uuid(&self, uuid: &str) {
        self.uuids.lock().push_back(uuid.to_string());
    }

    pub fn fail_stamp(&self, err: PacError) {
        self.stamp_results.lock().push_back(Err(err));
    }

    pub fn reject_stamp(&self, code: &str, message: &str) {
        self.fail_stamp(PacError::Rejected {
            code: code.into(),
            message: message.into(),
        });
    }

    pub fn fail_cancel(&self, err: PacError) {
        self.cancel_results.lock().push_back(Err(err));
    }

    pub fn fail_status(&self, err: PacError) {
        self.status_results.lock().push_back(Err(err));
    }

    pub fn stamp_calls(&self) -> usize {
        self.stamp_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Signed XML of every stamp request, in order
    pub fn stamped_documents(&self) -> Vec<String> {
        self.stamped.lock().clone()
    }

    pub fn cancel_requests(&self) -> Vec<CancelRequest> {
        self.cancel_requests.lock().clone()
    }

    fn receipt(&self, signed_xml: &str) -> StampReceipt {
        let n = self.stamp_calls();
        let uuid = self
            .uuids
            .lock()
            .pop_front()
            .unwrap_or_else(|| format!("{:08X}-0000-4000-8000-000000000000", n));
        StampReceipt {
            uuid,
            stamped_xml: signed_xml.to_string(),
            pac_seal: "c2VsbG9TQVQ=".into(),
            pac_certificate_number: "30001000000500003456".into(),
            stamped_at: Utc::now().naive_utc(),
        }
    }
}

#[async_trait]
impl PacClient for ScriptedPac {
    async fn stamp(&self, signed_xml: &str) -> PacResult<StampReceipt> {
        self.stamp_calls.fetch_add(1, Ordering::SeqCst);
        self.stamped.lock().push(signed_xml.to_string());
        let scripted = self.stamp_results.lock().pop_front();
        match scripted {
            Some(result) => result,
            None => Ok(self.receipt(signed_xml)),
        }
    }

    async fn cancel(&self, request: &CancelRequest) -> PacResult<CancelReceipt> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        self.cancel_requests.lock().push(request.clone());
        let scripted = self.cancel_results.lock().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(CancelReceipt {
                acknowledgement: format!("<Acuse UUID=\"{}\"/>", request.uuid),
                status: "Cancelado".into(),
                cancelled_at: Utc::now(),
            })
        })
    }

    async fn query_status(&self, _query: &StatusQuery) -> PacResult<SatStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.status_results.lock().pop_front();
        scripted.unwrap_or(Ok(SatStatus {
            state: SatDocumentState::Active,
            cancellable: Some("Cancelable sin aceptación".into()),
            cancellation_state: None,
        }))
    }
}
