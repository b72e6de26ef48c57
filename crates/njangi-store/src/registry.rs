//! The application's store registry.
//!
//! One [`AppStores`] is constructed at startup from a backend handle and
//! passed by reference to whoever renders or mutates state - there are no
//! global singletons. The contribution and tour stores share the ledger
//! store so their mirror writes land in one place.

use crate::contributions::ContributionStore;
use crate::credits::CreditStore;
use crate::dashboard::DashboardStore;
use crate::ledger::LedgerStore;
use crate::members::MemberStore;
use crate::penalties::PenaltyStore;
use crate::projects::ProjectStore;
use crate::sessions::SessionStore;
use crate::tontines::TontineStore;
use crate::tours::TourStore;
use njangi_backend::Backend;
use std::sync::Arc;

pub struct AppStores {
    pub members: MemberStore,
    pub tontines: TontineStore,
    pub sessions: SessionStore,
    pub contributions: ContributionStore,
    pub credits: CreditStore,
    pub penalties: PenaltyStore,
    pub tours: TourStore,
    pub projects: ProjectStore,
    pub ledger: Arc<LedgerStore>,
    pub dashboard: DashboardStore,
}

/// What failed during the initial concurrent load.
#[derive(Debug, Default)]
pub struct StartupReport {
    pub failed: Vec<&'static str>,
}

impl StartupReport {
    pub fn fully_loaded(&self) -> bool {
        self.failed.is_empty()
    }
}

impl AppStores {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let ledger = Arc::new(LedgerStore::new(backend.clone()));
        Self {
            members: MemberStore::new(backend.clone()),
            tontines: TontineStore::new(backend.clone()),
            sessions: SessionStore::new(backend.clone()),
            contributions: ContributionStore::new(backend.clone(), ledger.clone()),
            credits: CreditStore::new(backend.clone()),
            penalties: PenaltyStore::new(backend.clone()),
            tours: TourStore::new(backend.clone(), ledger.clone()),
            projects: ProjectStore::new(backend.clone()),
            dashboard: DashboardStore::new(backend),
            ledger,
        }
    }

    /// Load every collection concurrently. Completion order is
    /// unspecified; each store keeps its own error flag, so a partial
    /// failure leaves the other collections usable and the view must
    /// tolerate partially-loaded state.
    pub async fn fetch_initial(&self) -> StartupReport {
        let (members, tontines, participations, sessions, contributions, credits, penalties, tours, projects, ledger) = tokio::join!(
            self.members.fetch_all(),
            self.tontines.fetch_all(),
            self.tontines.fetch_participations(),
            self.sessions.fetch_all(),
            self.contributions.fetch_all(),
            self.credits.fetch_all(),
            self.penalties.fetch_all(),
            self.tours.fetch_all(),
            self.projects.fetch_all(),
            self.ledger.fetch_all(),
        );

        let outcomes = [
            ("membre", members.is_ok()),
            ("tontine", tontines.is_ok()),
            ("participe", participations.is_ok()),
            ("seance", sessions.is_ok()),
            ("cotisation", contributions.is_ok()),
            ("credit", credits.is_ok()),
            ("penalite", penalties.is_ok()),
            ("tour", tours.is_ok()),
            ("projet", projects.is_ok()),
            ("transaction", ledger.is_ok()),
        ];

        let mut report = StartupReport::default();
        for (table, ok) in outcomes {
            if !ok {
                report.failed.push(table);
            }
        }
        report
    }
}
