use csd_cert::{CertError, CsdCredential, CsdMetadata, testing, verify_seal};

#[test]
fn test_pem_credential_seals_like_der() {
    let csd = testing::valid_csd();

    // 1. Same CSD loaded from DER and from PEM
    let der_signer = csd.credential().unlock().expect("unlock DER");
    let pem_signer = CsdCredential::new(
        csd.certificate_pem.clone(),
        csd.key_pem.clone(),
        testing::PASSPHRASE,
    )
    .unlock()
    .expect("unlock PEM");

    // 2. Both produce the same seal
    let cadena = "||4.0|A|1001|2026-01-15T10:00:00|99|30001000000500003416|1000.00|MXN|1160.00|I|01|PUE|06000||";
    let der_seal = der_signer.seal(cadena).expect("seal DER");
    let pem_seal = pem_signer.seal(cadena).expect("seal PEM");
    assert_eq!(der_seal, pem_seal);

    // 3. Seal verifies against the exported certificate
    verify_seal(&csd.certificate_der, cadena, &der_seal.seal).expect("verify seal");
}

#[test]
fn test_expired_csd_is_reported_with_its_number() {
    let csd = testing::expired_csd();
    let meta = CsdMetadata::from_bytes(&csd.certificate_der).expect("metadata");
    let issued_at = chrono::NaiveDate::from_ymd_opt(2026, 1, 15)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .expect("date");

    match meta.ensure_valid_at(issued_at) {
        Err(CertError::NotValidAt {
            certificate_number, ..
        }) => assert_eq!(certificate_number, "30001000000400002434"),
        other => panic!("expected NotValidAt, got {:?}", other),
    }
}

#[test]
fn test_certificate_for_other_rfc() {
    let csd = testing::csd_for("XAXX010101000", "30001000000500009999");
    let meta = CsdMetadata::from_bytes(&csd.certificate_der).expect("metadata");
    assert!(meta.belongs_to("XAXX010101000"));
    assert!(!meta.belongs_to(testing::RFC));
}
