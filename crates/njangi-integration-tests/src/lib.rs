//! Shared fixtures for the end-to-end scenarios.

use chrono::NaiveDate;
use njangi_backend::MockBackend;
use njangi_model::{Member, Period, Tontine, TontineKind};
use njangi_store::AppStores;
use std::sync::Arc;
use std::sync::Once;

static TRACING: Once = Once::new();

/// Route store-layer logs through the test output (set RUST_LOG to see
/// them).
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// An empty backend plus a fresh store registry.
pub fn fresh_stores() -> (Arc<MockBackend>, AppStores) {
    init_tracing();
    let backend = Arc::new(MockBackend::new());
    let stores = AppStores::new(backend.clone());
    (backend, stores)
}

pub fn jean() -> Member {
    Member::new(
        "Jean",
        "Dupont",
        "jean.dupont@example.com",
        "+237 6 77 88 99 00",
        date(2024, 1, 10),
    )
}

pub fn marie() -> Member {
    Member::new(
        "Marie",
        "Kamga",
        "marie.kamga@example.com",
        "+237 6 55 44 33 22",
        date(2024, 1, 12),
    )
}

pub fn presence_tontine() -> Tontine {
    Tontine::new(
        "Tontine des Enseignants",
        TontineKind::Presence,
        50_000,
        Period::Monthly,
        date(2024, 1, 1),
    )
}
