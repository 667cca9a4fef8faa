//! Payment complements (Pagos 2.0) for deferred-payment invoices

mod common;

use common::*;
use fiscal_engine::EngineError;
use pac_client::PacError;
use rust_decimal_macros::dec;
use shared::models::FiscalState;
use shared::{ErrorCategory, ErrorCode};

async fn stamped_deferred() -> (TestEngine, std::sync::Arc<ScriptedPac>, String) {
    let (engine, pac) = engine_with(deferred_invoice());
    let outcome = engine.stamp(INVOICE_ID).await.unwrap();
    (engine, pac, outcome.uuid)
}

#[tokio::test]
async fn test_first_partiality() {
    let (engine, pac, origin_uuid) = stamped_deferred().await;
    engine
        .repository()
        .insert_payment(payment("pago-1", dec!(400.00), at(2025, 4, 1, 12)));

    let outcome = engine.issue_payment_complement("pago-1").await.unwrap();

    let figures = outcome.figures.clone().unwrap();
    assert_eq!(figures.partiality, 1);
    assert_eq!(figures.prior_balance, dec!(1160.00));
    assert_eq!(figures.remaining_balance, dec!(760.00));
    assert_eq!(figures.tax_amount.round_dp(2), dec!(55.17));
    assert_eq!(figures.tax_base, dec!(344.827586));

    let stored = engine.repository().payment("pago-1").unwrap();
    assert_eq!(stored.complement_uuid(), Some(outcome.uuid.as_str()));
    assert!(stored.last_error.is_none());
    // the origin invoice is untouched
    assert_eq!(
        engine.repository().invoice(INVOICE_ID).unwrap().state(),
        FiscalState::Stamped
    );

    let sent = pac.stamped_documents();
    let complement = &sent[1];
    assert!(complement.contains("TipoDeComprobante=\"P\""));
    assert!(complement.contains(&format!("IdDocumento=\"{}\"", origin_uuid)));
    assert!(complement.contains("NumParcialidad=\"1\""));
    assert!(complement.contains("ImpSaldoAnt=\"1160.00\""));
    assert!(complement.contains("ImpSaldoInsoluto=\"760.00\""));
    assert!(outcome.result.cadena_original.contains("|2.0|"));
}

#[tokio::test]
async fn test_later_partialities_use_prior_payments() {
    let (engine, _pac, _) = stamped_deferred().await;
    engine
        .repository()
        .insert_payment(payment("pago-1", dec!(400.00), at(2025, 4, 1, 12)));
    engine
        .repository()
        .insert_payment(payment("pago-2", dec!(760.00), at(2025, 5, 1, 12)));

    engine.issue_payment_complement("pago-1").await.unwrap();
    let second = engine.issue_payment_complement("pago-2").await.unwrap();

    let figures = second.figures.unwrap();
    assert_eq!(figures.partiality, 2);
    assert_eq!(figures.prior_balance, dec!(760.00));
    assert_eq!(figures.remaining_balance, dec!(0.00));
}

#[tokio::test]
async fn test_balance_follows_stamped_total() {
    let mut origin = deferred_invoice();
    origin.tax = dec!(160.01);
    origin.total = dec!(1160.01);
    let (engine, pac) = engine_with(origin);
    engine.stamp(INVOICE_ID).await.unwrap();
    engine
        .repository()
        .insert_payment(payment("pago-1", dec!(1160.00), at(2025, 4, 1, 12)));

    let outcome = engine.issue_payment_complement("pago-1").await.unwrap();

    let figures = outcome.figures.unwrap();
    assert_eq!(figures.prior_balance, dec!(1160.00));
    assert_eq!(figures.remaining_balance, dec!(0.00));
    assert_eq!(figures.tax_rate, dec!(0.16));

    let sent = pac.stamped_documents();
    assert!(sent[0].contains("Total=\"1160.00\""));
    let complement = &sent[1];
    assert!(complement.contains("ImpSaldoAnt=\"1160.00\""));
    assert!(complement.contains("ImpSaldoInsoluto=\"0.00\""));
    assert!(complement.contains("TasaOCuotaDR=\"0.160000\""));
    assert!(complement.contains("TasaOCuotaP=\"0.160000\""));
}

#[tokio::test]
async fn test_complement_is_issued_once() {
    let (engine, pac, _) = stamped_deferred().await;
    engine
        .repository()
        .insert_payment(payment("pago-1", dec!(400.00), at(2025, 4, 1, 12)));
    let first = engine.issue_payment_complement("pago-1").await.unwrap();

    let err = engine.issue_payment_complement("pago-1").await.unwrap_err();

    let EngineError::ComplementAlreadyIssued { uuid, .. } = &err else {
        panic!("expected ComplementAlreadyIssued, got {err:?}");
    };
    assert_eq!(uuid, &first.uuid);
    assert_eq!(err.classify().category, ErrorCategory::StateConflict);
    assert_eq!(pac.stamp_calls(), 2);
}

#[tokio::test]
async fn test_origin_must_be_stamped() {
    let (engine, pac) = engine_with(deferred_invoice());
    engine
        .repository()
        .insert_payment(payment("pago-1", dec!(400.00), at(2025, 4, 1, 12)));

    let err = engine.issue_payment_complement("pago-1").await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::OriginNotStamped { state: FiscalState::Draft, .. }
    ));
    assert_eq!(pac.stamp_calls(), 0);
    assert!(engine.repository().payment("pago-1").unwrap().last_error.is_none());
}

#[tokio::test]
async fn test_single_payment_invoice_has_no_complement() {
    let (engine, pac) = engine_with(invoice());
    engine.stamp(INVOICE_ID).await.unwrap();
    engine
        .repository()
        .insert_payment(payment("pago-1", dec!(400.00), at(2025, 4, 1, 12)));

    let err = engine.issue_payment_complement("pago-1").await.unwrap_err();

    assert!(matches!(err, EngineError::NotDeferredPayment(_)));
    assert_eq!(pac.stamp_calls(), 1);
}

#[tokio::test]
async fn test_payment_over_balance() {
    let (engine, pac, _) = stamped_deferred().await;
    engine
        .repository()
        .insert_payment(payment("pago-1", dec!(1200.00), at(2025, 4, 1, 12)));

    let err = engine.issue_payment_complement("pago-1").await.unwrap_err();

    assert!(matches!(err, EngineError::PaymentExceedsBalance { .. }));
    assert_eq!(err.classify().category, ErrorCategory::Validation);
    assert_eq!(pac.stamp_calls(), 1);
}

#[tokio::test]
async fn test_complement_failure_is_recorded_on_payment() {
    let (engine, pac, _) = stamped_deferred().await;
    engine
        .repository()
        .insert_payment(payment("pago-1", dec!(400.00), at(2025, 4, 1, 12)));
    pac.fail_stamp(PacError::Unreachable("timeout".into()));

    let err = engine.issue_payment_complement("pago-1").await.unwrap_err();

    assert_eq!(err.classify().code, ErrorCode::PacUnreachable);
    let stored = engine.repository().payment("pago-1").unwrap();
    assert!(stored.complement.is_none());
    assert_eq!(
        stored.last_error.map(|e| e.code),
        Some(ErrorCode::PacUnreachable)
    );
    // the complement can be issued once the PAC is back
    assert!(engine.issue_payment_complement("pago-1").await.is_ok());
}

#[tokio::test]
async fn test_payment_with_undefined_form_is_rejected() {
    let (engine, pac, _) = stamped_deferred().await;
    let mut undefined = payment("pago-1", dec!(400.00), at(2025, 4, 1, 12));
    undefined.payment_form = "99".into();
    engine.repository().insert_payment(undefined);

    let err = engine.issue_payment_complement("pago-1").await.unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(pac.stamp_calls(), 1);
}
