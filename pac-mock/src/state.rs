use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Failure the next request of an operation should return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedFailure {
    /// Structured PAC rejection
    Reject {
        status: u16,
        code: String,
        message: String,
    },
    /// 503 without a body
    Unavailable,
}

impl ScriptedFailure {
    pub fn reject(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Reject {
            status: 422,
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Document stamped by the mock
#[derive(Debug, Clone)]
pub struct StampedDocument {
    pub uuid: String,
    pub emitter_rfc: String,
    pub receiver_rfc: String,
    pub total: String,
    pub cancelled: bool,
}

/// In-memory PAC state
pub struct MockState {
    /// Expected bearer token; `None` accepts any request
    pub token: Option<String>,
    documents: Mutex<HashMap<String, StampedDocument>>,
    /// emitter seal -> UUID, for duplicate detection
    seals: Mutex<HashMap<String, String>>,
    next_stamp_failure: Mutex<Option<ScriptedFailure>>,
    next_cancel_failure: Mutex<Option<ScriptedFailure>>,
    delay: Mutex<Option<Duration>>,
    minimal_responses: Mutex<bool>,
    stamp_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
}

impl MockState {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            documents: Mutex::new(HashMap::new()),
            seals: Mutex::new(HashMap::new()),
            next_stamp_failure: Mutex::new(None),
            next_cancel_failure: Mutex::new(None),
            delay: Mutex::new(None),
            minimal_responses: Mutex::new(false),
            stamp_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_next_stamp(&self, failure: ScriptedFailure) {
        *self.next_stamp_failure.lock() = Some(failure);
    }

    pub fn fail_next_cancel(&self, failure: ScriptedFailure) {
        *self.next_cancel_failure.lock() = Some(failure);
    }

    /// Delay every response (timeout simulation)
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Answer stamps with the XML only, leaving the TFD fields to the client
    pub fn set_minimal_responses(&self, minimal: bool) {
        *self.minimal_responses.lock() = minimal;
    }

    pub fn stamp_calls(&self) -> usize {
        self.stamp_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    pub fn document(&self, uuid: &str) -> Option<StampedDocument> {
        self.documents.lock().get(&uuid.to_uppercase()).cloned()
    }

    pub(crate) fn record_stamp_call(&self) {
        self.stamp_calls.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_cancel_call(&self) {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn take_stamp_failure(&self) -> Option<ScriptedFailure> {
        self.next_stamp_failure.lock().take()
    }

    pub(crate) fn take_cancel_failure(&self) -> Option<ScriptedFailure> {
        self.next_cancel_failure.lock().take()
    }

    pub(crate) fn delay(&self) -> Option<Duration> {
        *self.delay.lock()
    }

    pub(crate) fn minimal_responses(&self) -> bool {
        *self.minimal_responses.lock()
    }

    pub(crate) fn uuid_for_seal(&self, seal: &str) -> Option<String> {
        self.seals.lock().get(seal).cloned()
    }

    pub(crate) fn insert(&self, seal: String, document: StampedDocument) {
        let uuid = document.uuid.to_uppercase();
        self.seals.lock().insert(seal, uuid.clone());
        self.documents.lock().insert(uuid, document);
    }

    /// Mark as cancelled; returns the previous document
    pub(crate) fn cancel(&self, uuid: &str) -> Option<StampedDocument> {
        let mut documents = self.documents.lock();
        let document = documents.get_mut(&uuid.to_uppercase())?;
        let previous = document.clone();
        document.cancelled = true;
        Some(previous)
    }
}

impl Default for MockState {
    fn default() -> Self {
        Self::new(None)
    }
}
