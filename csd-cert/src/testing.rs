//! Generated CSDs for tests
//!
//! Self-signed RSA-2048 certificates shaped like SAT CSDs: the serial holds
//! the ASCII digits of the certificate number and the subject carries the
//! RFC in x500UniqueIdentifier. Keys are encrypted PKCS#8 (PBES2).
//!
//! Key generation is slow, so keys and the common CSDs are built once per
//! process.

use crate::credential::CsdCredential;
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SerialNumber};
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use std::sync::OnceLock;

pub const PASSPHRASE: &str = "12345678a";
pub const RFC: &str = "EKU9003173C9";
pub const HOLDER_NAME: &str = "ESCUELA KEMPER URGATE";
pub const CERTIFICATE_NUMBER: &str = "30001000000500003416";

static PRIMARY_KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
static OTHER_KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
static VALID: OnceLock<TestCsd> = OnceLock::new();
static MISMATCHED: OnceLock<TestCsd> = OnceLock::new();
static EXPIRED: OnceLock<TestCsd> = OnceLock::new();

/// Certificate and encrypted key, in both encodings
#[derive(Debug, Clone)]
pub struct TestCsd {
    pub certificate_der: Vec<u8>,
    pub certificate_pem: String,
    pub key_der: Vec<u8>,
    pub key_pem: String,
}

impl TestCsd {
    pub fn credential(&self) -> CsdCredential {
        CsdCredential::new(
            self.certificate_der.clone(),
            self.key_der.clone(),
            PASSPHRASE,
        )
    }
}

/// Valid 2023-2031, RFC [`RFC`], serial [`CERTIFICATE_NUMBER`]
pub fn valid_csd() -> &'static TestCsd {
    VALID.get_or_init(|| {
        build(
            primary_key(),
            primary_key(),
            RFC,
            CERTIFICATE_NUMBER,
            (2023, 1, 1),
            (2031, 1, 1),
        )
    })
}

/// Certificate from one key pair, encrypted key from another
pub fn mismatched_csd() -> &'static TestCsd {
    MISMATCHED.get_or_init(|| {
        build(
            primary_key(),
            other_key(),
            RFC,
            CERTIFICATE_NUMBER,
            (2023, 1, 1),
            (2031, 1, 1),
        )
    })
}

/// Valid 2018-2020
pub fn expired_csd() -> &'static TestCsd {
    EXPIRED.get_or_init(|| {
        build(
            primary_key(),
            primary_key(),
            RFC,
            "30001000000400002434",
            (2018, 1, 1),
            (2020, 1, 1),
        )
    })
}

/// A valid CSD for another RFC
pub fn csd_for(rfc: &str, certificate_number: &str) -> TestCsd {
    build(
        primary_key(),
        primary_key(),
        rfc,
        certificate_number,
        (2023, 1, 1),
        (2031, 1, 1),
    )
}

fn primary_key() -> &'static RsaPrivateKey {
    PRIMARY_KEY.get_or_init(generate_key)
}

fn other_key() -> &'static RsaPrivateKey {
    OTHER_KEY.get_or_init(generate_key)
}

fn generate_key() -> RsaPrivateKey {
    let mut rng = rand::thread_rng();
    RsaPrivateKey::new(&mut rng, 2048).expect("generate RSA key")
}

fn build(
    certificate_key: &RsaPrivateKey,
    file_key: &RsaPrivateKey,
    rfc: &str,
    certificate_number: &str,
    not_before: (i32, u8, u8),
    not_after: (i32, u8, u8),
) -> TestCsd {
    let pem = certificate_key
        .to_pkcs8_pem(LineEnding::LF)
        .expect("encode RSA key");
    let key_pair = KeyPair::from_pem(&pem).expect("load key into rcgen");

    let mut params = CertificateParams::new(Vec::<String>::new()).expect("certificate params");
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, HOLDER_NAME);
    dn.push(DnType::OrganizationName, HOLDER_NAME);
    dn.push(
        DnType::CustomDnType(vec![2, 5, 4, 45]),
        format!("{} / XIQB891116QE4", rfc),
    );
    params.distinguished_name = dn;
    params.serial_number = Some(SerialNumber::from_slice(certificate_number.as_bytes()));
    params.not_before = rcgen::date_time_ymd(not_before.0, not_before.1, not_before.2);
    params.not_after = rcgen::date_time_ymd(not_after.0, not_after.1, not_after.2);

    let cert = params.self_signed(&key_pair).expect("self-sign CSD");
    let key_der = encrypt_key(file_key);
    let key_pem = ::pem::encode(&::pem::Pem::new("ENCRYPTED PRIVATE KEY", key_der.clone()));

    TestCsd {
        certificate_der: cert.der().to_vec(),
        certificate_pem: cert.pem(),
        key_der,
        key_pem,
    }
}

fn encrypt_key(key: &RsaPrivateKey) -> Vec<u8> {
    let plain = key.to_pkcs8_der().expect("encode RSA key");
    let info = pkcs8::PrivateKeyInfo::try_from(plain.as_bytes()).expect("parse PKCS#8");
    let salt: [u8; 16] = rand::random();
    let iv: [u8; 16] = rand::random();
    let params = pkcs8::pkcs5::pbes2::Parameters::pbkdf2_sha256_aes256cbc(2048, &salt, &iv)
        .expect("PBES2 parameters");
    info.encrypt_with_params(params, PASSPHRASE)
        .expect("encrypt PKCS#8")
        .as_bytes()
        .to_vec()
}
