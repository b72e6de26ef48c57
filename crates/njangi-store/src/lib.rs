//! Njangi Store - the optimistic-mutation store layer.
//!
//! Holds the authoritative client-side copy of each entity collection and
//! mediates every mutation through the backend client. The consistency
//! discipline - optimistic insert with placeholder replacement, snapshot
//! rollback on failed update/remove, preserve-on-failed-refresh - is
//! implemented once in [`Collection`] and configured per entity.
//!
//! # Architecture
//!
//! - **Collection**: the generic optimistic-mutation utility
//! - **Entity stores**: one per table, thin wrappers plus domain rules
//!   (sequential numbering, repayment arithmetic, payment bounds)
//! - **Ledger**: append-only transaction store; mirror writes from the
//!   contribution and tour stores land here, best-effort with a visible
//!   retry queue
//! - **Dashboard**: procedure-first financial summary with a client-side
//!   aggregation fallback
//! - **Drafts**: file-per-key persistence for in-progress form data
//! - **Registry**: [`AppStores`], the dependency-injected container built
//!   once at startup
//!
//! # Example
//!
//! ```no_run
//! use njangi_backend::{BackendConfig, HttpBackend};
//! use njangi_store::AppStores;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = Arc::new(HttpBackend::new(BackendConfig::from_env())?);
//!     let stores = AppStores::new(backend);
//!     let report = stores.fetch_initial().await;
//!     if !report.fully_loaded() {
//!         eprintln!("some collections failed to load: {:?}", report.failed);
//!     }
//!     Ok(())
//! }
//! ```

pub mod collection;
pub mod contributions;
pub mod credits;
pub mod dashboard;
pub mod drafts;
pub mod ledger;
pub mod members;
pub mod penalties;
pub mod projects;
pub mod registry;
pub mod sessions;
pub mod tontines;
pub mod tours;

pub use collection::Collection;
pub use contributions::ContributionStore;
pub use credits::CreditStore;
pub use dashboard::{DashboardStats, DashboardStore, SessionDigest};
pub use drafts::DraftStore;
pub use ledger::LedgerStore;
pub use members::{MemberPatch, MemberStore};
pub use penalties::PenaltyStore;
pub use projects::{ProjectPatch, ProjectStore};
pub use registry::{AppStores, StartupReport};
pub use sessions::{Attendance, SessionClose, SessionPatch, SessionStore};
pub use tontines::{TontinePatch, TontineStore};
pub use tours::{EligibleBeneficiary, TourStore};
