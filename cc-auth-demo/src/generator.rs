//! Random certificate records for the demo.

use cc_auth::models::CertificateRecord;
use chrono::{Duration, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;
use uuid::Uuid;

const ADJECTIVES: &[&str] = &[
    "Staging", "Production", "Internal", "Partner", "Legacy", "Backup", "Test", "Signing",
];

const NOUNS: &[&str] = &[
    "gateway", "api", "proxy", "client", "service", "portal", "device", "tenant",
];

/// Generate a single certificate record created within the last year.
pub fn generate_certificate() -> CertificateRecord {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Demo");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("certificate");
    let age = Duration::minutes(rng.random_range(0..365 * 24 * 60));

    CertificateRecord::new(
        Uuid::new_v4().to_string(),
        format!("{} {} certificate", adjective, noun),
        Utc::now() - age,
    )
}

/// Generate `size` certificate records.
pub fn generate_certificates(size: usize) -> Vec<CertificateRecord> {
    (0..size).map(|_| generate_certificate()).collect()
}
